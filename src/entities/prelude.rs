pub use super::auth_accounts::Entity as AuthAccounts;
pub use super::kv::Entity as Kv;
