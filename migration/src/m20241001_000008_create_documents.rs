use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20241001_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(DocumentKind::Enum)
                    .values([DocumentKind::DrivingLicense, DocumentKind::NidCard])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(DocumentStatus::Enum)
                    .values([
                        DocumentStatus::Pending,
                        DocumentStatus::Approved,
                        DocumentStatus::Rejected,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Document::Table)
                    .if_not_exists()
                    .col(uuid(Document::Id).primary_key())
                    .col(uuid(Document::UserId).not_null())
                    .col(
                        ColumnDef::new(Document::Kind)
                            .custom(DocumentKind::Enum)
                            .not_null(),
                    )
                    .col(string_len(Document::FilePath, 512).not_null())
                    .col(string_len(Document::FileUrl, 512).not_null())
                    .col(
                        ColumnDef::new(Document::Status)
                            .custom(DocumentStatus::Enum)
                            .not_null(),
                    )
                    .col(uuid_null(Document::ReviewedBy))
                    .col(timestamp_with_time_zone_null(Document::ReviewedAt))
                    .col(
                        timestamp_with_time_zone(Document::UploadedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_user")
                            .from(Document::Table, Document::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_reviewer")
                            .from(Document::Table, Document::ReviewedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Document::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(DocumentStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(DocumentKind::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Document {
    Table,
    Id,
    UserId,
    Kind,
    FilePath,
    FileUrl,
    Status,
    ReviewedBy,
    ReviewedAt,
    UploadedAt,
}

#[derive(DeriveIden)]
pub enum DocumentKind {
    #[sea_orm(iden = "document_kind")]
    Enum,
    #[sea_orm(iden = "driving_license")]
    DrivingLicense,
    #[sea_orm(iden = "nid_card")]
    NidCard,
}

#[derive(DeriveIden)]
pub enum DocumentStatus {
    #[sea_orm(iden = "document_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "approved")]
    Approved,
    #[sea_orm(iden = "rejected")]
    Rejected,
}
