//! Injected capabilities used while seeding: identifiers, salts, password
//! digests and the clock.
//!
//! Each one is a small trait so tests can pin outputs or force failures.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
};
use sha2::{Digest, Sha256};

use crate::config::{PasswordScheme, SecurityConfig};

/// Produces a fresh globally unique identifier for a new record.
pub trait IdentityGenerator: Send + Sync {
    fn generate(&self) -> Result<String>;
}

/// Produces fresh per-account salt material.
pub trait SaltGenerator: Send + Sync {
    fn generate(&self) -> Result<String>;
}

/// Maps `(salt, credential)` to the string stored in `pass_hash`.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, salt: &str, credential: &str) -> Result<String>;

    fn verify(&self, salt: &str, credential: &str, stored_hash: &str) -> Result<bool> {
        Ok(self.hash(salt, credential)? == stored_hash)
    }
}

/// Current Unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> Result<i64>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdentityGenerator;

impl IdentityGenerator for UuidIdentityGenerator {
    fn generate(&self) -> Result<String> {
        Ok(uuid::Uuid::new_v4().to_string())
    }
}

/// 16 random bytes, hex encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSaltGenerator;

impl SaltGenerator for RandomSaltGenerator {
    fn generate(&self) -> Result<String> {
        use rand::Rng;

        let mut rng = rand::rng();
        let bytes: [u8; 16] = rng.random();
        Ok(hex(&bytes))
    }
}

/// Hex SHA-256 of `salt:credential`, the scheme the application's login
/// screen checks against.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256PasswordHasher;

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, salt: &str, credential: &str) -> Result<String> {
        let digest = Sha256::digest(format!("{salt}:{credential}").as_bytes());
        Ok(hex(&digest))
    }
}

/// Argon2id PHC string. The stored salt is folded into the PHC salt so the
/// `pass_salt` column stays meaningful.
#[derive(Debug, Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow!("Invalid Argon2 params: {e}"))?;

        Ok(Self { params })
    }

    fn phc_salt(salt: &str) -> Result<SaltString> {
        let digest = Sha256::digest(salt.as_bytes());
        SaltString::encode_b64(&digest[..16]).map_err(|e| anyhow!("Invalid salt: {e}"))
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, salt: &str, credential: &str) -> Result<String> {
        let salt = Self::phc_salt(salt)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(credential.as_bytes(), &salt)
            .map_err(|e| anyhow!("Failed to hash password: {e}"))?;

        Ok(hash.to_string())
    }

    fn verify(&self, _salt: &str, credential: &str, stored_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| anyhow!("Invalid password hash format: {e}"))?;

        Ok(Argon2::default()
            .verify_password(credential.as_bytes(), &parsed)
            .is_ok())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<i64> {
        Ok(chrono::Utc::now().timestamp())
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> Result<i64> {
        Ok(self.0)
    }
}

pub fn password_hasher_for(config: &SecurityConfig) -> Result<Arc<dyn PasswordHasher>> {
    Ok(match config.password_scheme {
        PasswordScheme::Sha256 => Arc::new(Sha256PasswordHasher),
        PasswordScheme::Argon2 => Arc::new(Argon2PasswordHasher::new(config)?),
    })
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
