pub mod bootstrap;
pub use bootstrap::{BootstrapDefaults, BootstrapError, BootstrapResult, ensure_bootstrapped};

pub mod capabilities;
pub use capabilities::{
    Argon2PasswordHasher, Clock, FixedClock, IdentityGenerator, PasswordHasher,
    RandomSaltGenerator, SaltGenerator, Sha256PasswordHasher, SystemClock, UuidIdentityGenerator,
};

pub mod diagnostics;
pub use diagnostics::{BrandSettings, StoreReport};
