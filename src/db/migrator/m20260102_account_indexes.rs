use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        // Older stores only carried a plain lookup index on pick_name.
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_auth_accounts_pick")
            .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS ux_auth_accounts_pick_name ON auth_accounts(pick_name)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_auth_accounts_role ON auth_accounts(role, is_active)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared("DROP INDEX IF EXISTS idx_auth_accounts_role")
            .await?;

        conn.execute_unprepared("DROP INDEX IF EXISTS ux_auth_accounts_pick_name")
            .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_auth_accounts_pick ON auth_accounts(pick_name)",
        )
        .await?;

        Ok(())
    }
}
