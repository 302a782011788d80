use crate::models::{CatalogStatus, CatalogVersion, NewCatalogVersion};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize, serde::Deserialize)]
#[sea_orm(table_name = "catalog_versions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub service: String,
    #[sea_orm(column_type = "String(StringLen::N(128))")]
    pub version_hash: String,
    #[sea_orm(column_type = "Text")]
    pub source_url: String,
    #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
    pub etag: Option<String>,
    pub publication_date: DateTimeWithTimeZone,
    pub ingested_at: DateTimeWithTimeZone,
    pub record_count: i64,
    pub status: CatalogStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pricing_dimension::Entity")]
    PricingDimension,
    #[sea_orm(has_many = "super::attribute_mapping::Entity")]
    AttributeMapping,
}

impl Related<super::pricing_dimension::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PricingDimension.def()
    }
}

impl Related<super::attribute_mapping::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttributeMapping.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CatalogVersion {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            service: m.service,
            version_hash: m.version_hash,
            source_url: m.source_url,
            etag: m.etag,
            publication_date: m.publication_date.into(),
            ingested_at: m.ingested_at.into(),
            record_count: m.record_count,
            status: m.status,
            error_message: m.error_message,
        }
    }
}

impl From<NewCatalogVersion> for ActiveModel {
    fn from(input: NewCatalogVersion) -> Self {
        let now = chrono::Utc::now();
        ActiveModel {
            id: Set(Uuid::now_v7()),
            service: Set(input.service),
            version_hash: Set(input.version_hash),
            source_url: Set(input.source_url),
            etag: Set(input.etag),
            publication_date: Set(input.publication_date.into()),
            ingested_at: Set(now.into()),
            record_count: Set(0),
            status: Set(CatalogStatus::Pending),
            error_message: Set(None),
        }
    }
}
