use crate::models::{NewPricingDimension, PricingDimension, TermType};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize, serde::Deserialize)]
#[sea_orm(table_name = "pricing_dimensions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub catalog_version_id: Uuid,
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub service: String,
    #[sea_orm(column_type = "String(StringLen::N(64))")]
    pub region_code: String,
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub usage_type: String,
    #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
    pub operation: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(64))")]
    pub unit: String,
    #[sea_orm(column_type = "Decimal(Some((24, 12)))")]
    pub price_per_unit: Decimal,
    #[sea_orm(column_type = "String(StringLen::N(3))")]
    pub currency: String,
    pub begin_range: f64,
    pub end_range: Option<f64>,
    pub term_type: TermType,
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub sku: String,
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub rate_code: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
    pub product_family: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub attributes: serde_json::Value,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::catalog_version::Entity",
        from = "Column::CatalogVersionId",
        to = "super::catalog_version::Column::Id",
        on_delete = "Cascade"
    )]
    CatalogVersion,
}

impl Related<super::catalog_version::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CatalogVersion.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PricingDimension {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            catalog_version_id: m.catalog_version_id,
            service: m.service,
            region_code: m.region_code,
            usage_type: m.usage_type,
            operation: m.operation,
            unit: m.unit,
            price_per_unit: m.price_per_unit,
            currency: m.currency,
            begin_range: m.begin_range,
            end_range: m.end_range,
            term_type: m.term_type,
            sku: m.sku,
            rate_code: m.rate_code,
            description: m.description,
            product_family: m.product_family,
            attributes: serde_json::from_value(m.attributes).unwrap_or_default(),
        }
    }
}

impl From<NewPricingDimension> for ActiveModel {
    fn from(input: NewPricingDimension) -> Self {
        ActiveModel {
            id: Set(Uuid::now_v7()),
            catalog_version_id: Set(input.catalog_version_id),
            service: Set(input.service),
            region_code: Set(input.region_code),
            usage_type: Set(input.usage_type),
            operation: Set(input.operation),
            unit: Set(input.unit),
            price_per_unit: Set(input.price_per_unit),
            currency: Set(input.currency),
            begin_range: Set(input.begin_range),
            end_range: Set(input.end_range),
            term_type: Set(input.term_type),
            sku: Set(input.sku),
            rate_code: Set(input.rate_code),
            description: Set(input.description),
            product_family: Set(input.product_family),
            attributes: Set(serde_json::to_value(input.attributes).unwrap_or_default()),
        }
    }
}
