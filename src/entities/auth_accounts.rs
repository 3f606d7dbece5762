use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::constants::roles;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "auth_accounts")]
pub struct Model {
    /// UUID, assigned once at creation
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Login handle. Uniqueness comes from `ux_auth_accounts_pick_name`.
    pub pick_name: String,

    #[serde(skip_serializing)]
    pub pass_salt: String,

    /// Digest of `salt:password` under the configured scheme
    #[serde(skip_serializing)]
    pub pass_hash: String,

    pub role: String,

    pub identity: String,

    pub display_name: String,

    pub equity: f64,

    pub is_active: bool,

    pub created_at: i64,

    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Account roles known to the bootstrap core. Stores may hold others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    Admin,
    Staff,
}

impl AccountRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => roles::ADMIN,
            Self::Staff => roles::STAFF,
        }
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
