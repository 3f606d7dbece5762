pub mod account;
pub mod settings;

pub use account::{AccountRecord, AccountRepository};
pub use settings::SettingsRepository;
