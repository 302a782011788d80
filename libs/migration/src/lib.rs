pub use sea_orm_migration::prelude::*;

mod m20241128_000000_bootstrap;
mod m20260101_000000_create_catalog_versions;
mod m20260101_000001_create_pricing_dimensions;
mod m20260101_000002_create_attribute_mappings;
mod m20260101_000003_create_pricing_overrides;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241128_000000_bootstrap::Migration),
            Box::new(m20260101_000000_create_catalog_versions::Migration),
            Box::new(m20260101_000001_create_pricing_dimensions::Migration),
            Box::new(m20260101_000002_create_attribute_mappings::Migration),
            Box::new(m20260101_000003_create_pricing_overrides::Migration),
        ]
    }
}
