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
                    .as_enum(MappingTypeEnum::Enum)
                    .values([
                        MappingTypeEnum::RegionToLocation,
                        MappingTypeEnum::LocationToRegion,
                        MappingTypeEnum::InstanceFamily,
                        MappingTypeEnum::OperatingSystem,
                        MappingTypeEnum::Tenancy,
                        MappingTypeEnum::LicenseModel,
                        MappingTypeEnum::PurchaseOption,
                        MappingTypeEnum::ProductFamily,
                        MappingTypeEnum::UsageTypePrefix,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AttributeMappings::Table)
                    .if_not_exists()
                    .col(pk_uuid(AttributeMappings::Id))
                    .col(uuid(AttributeMappings::CatalogVersionId).not_null())
                    .col(
                        ColumnDef::new(AttributeMappings::MappingType)
                            .enumeration(
                                MappingTypeEnum::Enum,
                                [
                                    MappingTypeEnum::RegionToLocation,
                                    MappingTypeEnum::LocationToRegion,
                                    MappingTypeEnum::InstanceFamily,
                                    MappingTypeEnum::OperatingSystem,
                                    MappingTypeEnum::Tenancy,
                                    MappingTypeEnum::LicenseModel,
                                    MappingTypeEnum::PurchaseOption,
                                    MappingTypeEnum::ProductFamily,
                                    MappingTypeEnum::UsageTypePrefix,
                                ],
                            )
                            .not_null(),
                    )
                    .col(string_len(AttributeMappings::SourceValue, 255).not_null())
                    .col(string_len(AttributeMappings::TargetValue, 255).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attribute_mappings_catalog_version")
                            .from(AttributeMappings::Table, AttributeMappings::CatalogVersionId)
                            .to(CatalogVersions::Table, CatalogVersions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_attribute_mappings_type_source")
                    .table(AttributeMappings::Table)
                    .col(AttributeMappings::MappingType)
                    .col(AttributeMappings::SourceValue)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AttributeMappings::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(MappingTypeEnum::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum AttributeMappings {
    Table,
    Id,
    CatalogVersionId,
    MappingType,
    SourceValue,
    TargetValue,
}

#[derive(DeriveIden)]
enum MappingTypeEnum {
    #[sea_orm(iden = "mapping_type")]
    Enum,
    #[sea_orm(iden = "region_to_location")]
    RegionToLocation,
    #[sea_orm(iden = "location_to_region")]
    LocationToRegion,
    #[sea_orm(iden = "instance_family")]
    InstanceFamily,
    #[sea_orm(iden = "operating_system")]
    OperatingSystem,
    #[sea_orm(iden = "tenancy")]
    Tenancy,
    #[sea_orm(iden = "license_model")]
    LicenseModel,
    #[sea_orm(iden = "purchase_option")]
    PurchaseOption,
    #[sea_orm(iden = "product_family")]
    ProductFamily,
    #[sea_orm(iden = "usage_type_prefix")]
    UsageTypePrefix,
}
