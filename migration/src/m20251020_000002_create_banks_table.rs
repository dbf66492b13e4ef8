use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 banks 表 - 提供方注册表的持久化来源
        manager
            .create_table(
                Table::create()
                    .table(Banks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Banks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Banks::Name)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Banks::BaseUrl).string_len(255).not_null())
                    .col(ColumnDef::new(Banks::ClientId).string_len(100).not_null())
                    .col(ColumnDef::new(Banks::ClientSecret).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Banks::AutoApprove)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Banks::IconFilename).string_len(255))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Banks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Banks {
    Table,
    Id,
    Name,
    BaseUrl,
    ClientId,
    ClientSecret,
    AutoApprove,
    IconFilename,
}
