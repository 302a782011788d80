use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

use super::m20260101_000000_create_catalog_versions::CatalogVersions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(TermTypeEnum::Enum)
                    .values([TermTypeEnum::OnDemand, TermTypeEnum::Reserved, TermTypeEnum::Spot])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PricingDimensions::Table)
                    .if_not_exists()
                    .col(pk_uuid(PricingDimensions::Id))
                    .col(uuid(PricingDimensions::CatalogVersionId).not_null())
                    .col(string_len(PricingDimensions::Service, 255).not_null())
                    .col(string_len(PricingDimensions::RegionCode, 64).not_null())
                    .col(string_len(PricingDimensions::UsageType, 255).not_null())
                    .col(string_len_null(PricingDimensions::Operation, 255))
                    .col(string_len(PricingDimensions::Unit, 64).not_null())
                    .col(
                        ColumnDef::new(PricingDimensions::PricePerUnit)
                            .decimal_len(24, 12)
                            .not_null(),
                    )
                    .col(string_len(PricingDimensions::Currency, 3).not_null().default("USD"))
                    .col(double(PricingDimensions::BeginRange).not_null().default(0.0))
                    .col(double_null(PricingDimensions::EndRange))
                    .col(
                        ColumnDef::new(PricingDimensions::TermType)
                            .enumeration(
                                TermTypeEnum::Enum,
                                [TermTypeEnum::OnDemand, TermTypeEnum::Reserved, TermTypeEnum::Spot],
                            )
                            .not_null()
                            .default("OnDemand"),
                    )
                    .col(string_len(PricingDimensions::Sku, 255).not_null())
                    .col(string_len(PricingDimensions::RateCode, 255).not_null())
                    .col(text_null(PricingDimensions::Description))
                    .col(string_len_null(PricingDimensions::ProductFamily, 255))
                    .col(json_binary(PricingDimensions::Attributes).not_null().default("{}"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pricing_dimensions_catalog_version")
                            .from(PricingDimensions::Table, PricingDimensions::CatalogVersionId)
                            .to(CatalogVersions::Table, CatalogVersions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pricing_dimensions_catalog_version")
                    .table(PricingDimensions::Table)
                    .col(PricingDimensions::CatalogVersionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pricing_dimensions_match")
                    .table(PricingDimensions::Table)
                    .col(PricingDimensions::Service)
                    .col(PricingDimensions::RegionCode)
                    .col(PricingDimensions::UsageType)
                    .col(PricingDimensions::TermType)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pricing_dimensions_sku")
                    .table(PricingDimensions::Table)
                    .col(PricingDimensions::Sku)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX idx_pricing_dimensions_attributes ON pricing_dimensions USING GIN (attributes)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PricingDimensions::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(TermTypeEnum::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum PricingDimensions {
    Table,
    Id,
    CatalogVersionId,
    Service,
    RegionCode,
    UsageType,
    Operation,
    Unit,
    PricePerUnit,
    Currency,
    BeginRange,
    EndRange,
    TermType,
    Sku,
    RateCode,
    Description,
    ProductFamily,
    Attributes,
}

#[derive(DeriveIden)]
enum TermTypeEnum {
    #[sea_orm(iden = "term_type")]
    Enum,
    #[sea_orm(iden = "OnDemand")]
    OnDemand,
    #[sea_orm(iden = "Reserved")]
    Reserved,
    #[sea_orm(iden = "Spot")]
    Spot,
}
