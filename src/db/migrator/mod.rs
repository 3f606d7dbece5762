use sea_orm_migration::prelude::*;

mod m20260101_initial;
mod m20260102_account_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_initial::Migration),
            Box::new(m20260102_account_indexes::Migration),
        ]
    }
}
