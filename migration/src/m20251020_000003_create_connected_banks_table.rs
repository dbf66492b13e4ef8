use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConnectedBanks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConnectedBanks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ConnectedBanks::UserId).integer().not_null())
                    .col(ColumnDef::new(ConnectedBanks::BankName).string_len(50).not_null())
                    .col(
                        ColumnDef::new(ConnectedBanks::BankClientId)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConnectedBanks::RequestId)
                            .string_len(128)
                            .null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ConnectedBanks::ConsentId)
                            .string_len(128)
                            .null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ConnectedBanks::Status)
                            .string_len(40)
                            .not_null()
                            .default("awaitingauthorization"),
                    )
                    .col(ColumnDef::new(ConnectedBanks::FullName).string_len(255))
                    .col(
                        ColumnDef::new(ConnectedBanks::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ConnectedBanks::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_connected_banks_user_id")
                            .from(ConnectedBanks::Table, ConnectedBanks::UserId)
                            .to(Users::Table, Users::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_connected_banks_bank_name")
                            .from(ConnectedBanks::Table, ConnectedBanks::BankName)
                            .to(Banks::Table, Banks::Name)
                            .on_update(ForeignKeyAction::Restrict)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一用户在同一银行下的 client 只能有一条记录
        manager
            .create_index(
                Index::create()
                    .name("idx_connected_banks_user_bank_client")
                    .table(ConnectedBanks::Table)
                    .col(ConnectedBanks::UserId)
                    .col(ConnectedBanks::BankName)
                    .col(ConnectedBanks::BankClientId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_connected_banks_status")
                    .table(ConnectedBanks::Table)
                    .col(ConnectedBanks::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConnectedBanks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ConnectedBanks {
    Table,
    Id,
    UserId,
    BankName,
    BankClientId,
    RequestId,
    ConsentId,
    Status,
    FullName,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Banks {
    Table,
    Name,
}
