pub use sea_orm_migration::prelude::*;

mod m20251020_000001_create_users_table;
mod m20251020_000002_create_banks_table;
mod m20251020_000003_create_connected_banks_table;
mod m20251020_000004_create_accounts_table;
mod m20251020_000005_create_payment_consents_table;
mod m20251020_000006_create_payments_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251020_000001_create_users_table::Migration),
            Box::new(m20251020_000002_create_banks_table::Migration),
            Box::new(m20251020_000003_create_connected_banks_table::Migration),
            Box::new(m20251020_000004_create_accounts_table::Migration),
            Box::new(m20251020_000005_create_payment_consents_table::Migration),
            Box::new(m20251020_000006_create_payments_table::Migration),
        ]
    }
}
