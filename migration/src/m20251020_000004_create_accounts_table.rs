use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::ConnectionId).integer().not_null())
                    .col(ColumnDef::new(Accounts::ApiAccountId).string_len(128).not_null())
                    .col(ColumnDef::new(Accounts::Status).string_len(40))
                    .col(ColumnDef::new(Accounts::Currency).string_len(3))
                    .col(ColumnDef::new(Accounts::AccountType).string_len(40))
                    .col(ColumnDef::new(Accounts::AccountSubtype).string_len(40))
                    .col(ColumnDef::new(Accounts::Nickname).string_len(255))
                    .col(ColumnDef::new(Accounts::OpeningDate).string_len(40))
                    .col(ColumnDef::new(Accounts::OwnerData).text())
                    .col(ColumnDef::new(Accounts::BalanceData).text())
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Accounts::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_accounts_connection_id")
                            .from(Accounts::Table, Accounts::ConnectionId)
                            .to(ConnectedBanks::Table, ConnectedBanks::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_connection_api_account")
                    .table(Accounts::Table)
                    .col(Accounts::ConnectionId)
                    .col(Accounts::ApiAccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    ConnectionId,
    ApiAccountId,
    Status,
    Currency,
    AccountType,
    AccountSubtype,
    Nickname,
    OpeningDate,
    OwnerData,
    BalanceData,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ConnectedBanks {
    Table,
    Id,
}
