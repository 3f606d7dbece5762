use std::collections::BTreeMap;

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, QueryOrder, Set};

use crate::entities::{kv, prelude::*};

pub struct SettingsRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SettingsRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Inserts the key, or overwrites value and timestamp when it already exists.
    pub async fn upsert_setting(&self, key: &str, value: &str, updated_at: i64) -> Result<(), DbErr> {
        let active_model = kv::ActiveModel {
            k: Set(key.to_string()),
            v: Set(value.to_string()),
            updated_at: Set(updated_at),
        };

        Kv::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(kv::Column::K)
                    .update_columns([kv::Column::V, kv::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;

        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<kv::Model>, DbErr> {
        Kv::find_by_id(key.to_string()).one(self.conn).await
    }

    pub async fn get_value(&self, key: &str) -> Result<Option<String>, DbErr> {
        Ok(self.get(key).await?.map(|row| row.v))
    }

    pub async fn list(&self) -> Result<Vec<kv::Model>, DbErr> {
        Kv::find().order_by_asc(kv::Column::K).all(self.conn).await
    }

    pub async fn list_values(&self) -> Result<BTreeMap<String, String>, DbErr> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .map(|row| (row.k, row.v))
            .collect())
    }
}
