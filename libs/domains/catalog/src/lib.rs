pub mod entity;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod postgres;
pub mod repository;
pub mod rosetta;

pub use error::{CatalogError, CatalogResult};
pub use models::{
    AttributeMapping, CatalogStatus, CatalogVersion, MappingType, MatchCriteria,
    NewAttributeMapping, NewCatalogVersion, NewPricingDimension, PricingDimension,
    PricingOverride, TermType,
};
pub use postgres::PgWarehouseStore;
pub use repository::WarehouseStore;

#[cfg(any(test, feature = "test-util"))]
pub use repository::MockWarehouseStore;
