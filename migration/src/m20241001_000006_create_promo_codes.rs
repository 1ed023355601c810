use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(DiscountType::Enum)
                    .values([DiscountType::Percentage, DiscountType::Fixed])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PromoCode::Table)
                    .if_not_exists()
                    .col(uuid(PromoCode::Id).primary_key())
                    .col(string_len(PromoCode::Code, 50).not_null().unique_key())
                    .col(string_len_null(PromoCode::Description, 255))
                    .col(
                        ColumnDef::new(PromoCode::DiscountType)
                            .custom(DiscountType::Enum)
                            .not_null(),
                    )
                    .col(double(PromoCode::DiscountValue).not_null())
                    .col(big_integer_null(PromoCode::MaxDiscount))
                    .col(big_integer(PromoCode::MinSubtotal).not_null().default(0))
                    .col(integer_null(PromoCode::UsageLimit))
                    .col(integer(PromoCode::UsedCount).not_null().default(0))
                    .col(timestamp_with_time_zone(PromoCode::ValidFrom).not_null())
                    .col(timestamp_with_time_zone(PromoCode::ValidUntil).not_null())
                    .col(
                        timestamp_with_time_zone(PromoCode::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Seed a welcome code
        let insert = Query::insert()
            .into_table(PromoCode::Table)
            .columns([
                PromoCode::Id,
                PromoCode::Code,
                PromoCode::Description,
                PromoCode::DiscountType,
                PromoCode::DiscountValue,
                PromoCode::MinSubtotal,
                PromoCode::ValidFrom,
                PromoCode::ValidUntil,
            ])
            .values_panic([
                Expr::cust("gen_random_uuid()"),
                "WELCOME10".into(),
                "10% off your first booking".into(),
                Expr::cust("'percentage'::discount_type"),
                (10.0).into(),
                1000i64.into(),
                Expr::current_timestamp().into(),
                Expr::cust("CURRENT_TIMESTAMP + INTERVAL '365 days'"),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PromoCode::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(DiscountType::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PromoCode {
    Table,
    Id,
    Code,
    Description,
    DiscountType,
    DiscountValue,
    MaxDiscount,
    MinSubtotal,
    UsageLimit,
    UsedCount,
    ValidFrom,
    ValidUntil,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum DiscountType {
    #[sea_orm(iden = "discount_type")]
    Enum,
    #[sea_orm(iden = "percentage")]
    Percentage,
    #[sea_orm(iden = "fixed")]
    Fixed,
}
