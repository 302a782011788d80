use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PricingOverrides::Table)
                    .if_not_exists()
                    .col(pk_uuid(PricingOverrides::Id))
                    .col(string_len(PricingOverrides::Service, 255).not_null())
                    .col(string_len_null(PricingOverrides::RegionCode, 64))
                    .col(string_len_null(PricingOverrides::UsageTypePattern, 255))
                    .col(
                        ColumnDef::new(PricingOverrides::OverridePrice)
                            .decimal_len(24, 12)
                            .null(),
                    )
                    .col(double_null(PricingOverrides::OverridePercentage))
                    .col(text(PricingOverrides::Reason).not_null())
                    .col(timestamp_with_time_zone_null(PricingOverrides::ExpiresAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pricing_overrides_service")
                    .table(PricingOverrides::Table)
                    .col(PricingOverrides::Service)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PricingOverrides::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum PricingOverrides {
    Table,
    Id,
    Service,
    RegionCode,
    UsageTypePattern,
    OverridePrice,
    OverridePercentage,
    Reason,
    ExpiresAt,
}
