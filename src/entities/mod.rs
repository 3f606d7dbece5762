pub mod prelude;

pub mod auth_accounts;
pub mod kv;
