use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentConsents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentConsents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentConsents::UserId).integer().not_null())
                    .col(ColumnDef::new(PaymentConsents::BankName).string_len(50).not_null())
                    .col(
                        ColumnDef::new(PaymentConsents::BankClientId)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentConsents::RequestId)
                            .string_len(128)
                            .null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(PaymentConsents::ConsentId)
                            .string_len(128)
                            .null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(PaymentConsents::Status)
                            .string_len(40)
                            .not_null()
                            .default("awaitingauthorization"),
                    )
                    .col(ColumnDef::new(PaymentConsents::Details).text())
                    .col(
                        ColumnDef::new(PaymentConsents::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PaymentConsents::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_consents_user_id")
                            .from(PaymentConsents::Table, PaymentConsents::UserId)
                            .to(Users::Table, Users::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_consents_bank_name")
                            .from(PaymentConsents::Table, PaymentConsents::BankName)
                            .to(Banks::Table, Banks::Name)
                            .on_update(ForeignKeyAction::Restrict)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_consents_user_bank_client")
                    .table(PaymentConsents::Table)
                    .col(PaymentConsents::UserId)
                    .col(PaymentConsents::BankName)
                    .col(PaymentConsents::BankClientId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentConsents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PaymentConsents {
    Table,
    Id,
    UserId,
    BankName,
    BankClientId,
    RequestId,
    ConsentId,
    Status,
    Details,
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
