use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::auth_accounts::{self, AccountRole};
use crate::entities::prelude::*;

/// Everything needed to create one account row.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub id: String,
    pub pick_name: String,
    pub pass_salt: String,
    pub pass_hash: String,
    pub role: AccountRole,
    pub identity: String,
    pub display_name: String,
    pub equity: f64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<AccountRecord> for auth_accounts::ActiveModel {
    fn from(record: AccountRecord) -> Self {
        Self {
            id: Set(record.id),
            pick_name: Set(record.pick_name),
            pass_salt: Set(record.pass_salt),
            pass_hash: Set(record.pass_hash),
            role: Set(record.role.as_str().to_string()),
            identity: Set(record.identity),
            display_name: Set(record.display_name),
            equity: Set(record.equity),
            is_active: Set(record.is_active),
            created_at: Set(record.created_at),
            updated_at: Set(record.updated_at),
        }
    }
}

/// Works on the pool or inside an open transaction.
pub struct AccountRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> AccountRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Counts rows with `role = 'admin'`, active or not.
    pub async fn count_admins(&self) -> Result<u64, DbErr> {
        AuthAccounts::find()
            .filter(auth_accounts::Column::Role.eq(AccountRole::Admin.as_str()))
            .count(self.conn)
            .await
    }

    pub async fn insert_account(&self, record: AccountRecord) -> Result<(), DbErr> {
        let active_model: auth_accounts::ActiveModel = record.into();

        AuthAccounts::insert(active_model)
            .exec_without_returning(self.conn)
            .await?;

        Ok(())
    }

    pub async fn find_by_pick_name(
        &self,
        pick_name: &str,
    ) -> Result<Option<auth_accounts::Model>, DbErr> {
        AuthAccounts::find()
            .filter(auth_accounts::Column::PickName.eq(pick_name))
            .one(self.conn)
            .await
    }

    /// Active admins with the given login handle. Older stores did not
    /// enforce unique handles, so there may be more than one.
    pub async fn find_active_admins(
        &self,
        pick_name: &str,
    ) -> Result<Vec<auth_accounts::Model>, DbErr> {
        AuthAccounts::find()
            .filter(auth_accounts::Column::PickName.eq(pick_name))
            .filter(auth_accounts::Column::Role.eq(AccountRole::Admin.as_str()))
            .filter(auth_accounts::Column::IsActive.eq(true))
            .order_by_asc(auth_accounts::Column::CreatedAt)
            .all(self.conn)
            .await
    }
}
