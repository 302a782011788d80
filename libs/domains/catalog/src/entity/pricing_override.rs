use crate::models::PricingOverride;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize, serde::Deserialize)]
#[sea_orm(table_name = "pricing_overrides")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub service: String,
    #[sea_orm(column_type = "String(StringLen::N(64))", nullable)]
    pub region_code: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
    pub usage_type_pattern: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((24, 12)))", nullable)]
    pub override_price: Option<Decimal>,
    pub override_percentage: Option<f64>,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    pub expires_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PricingOverride {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            service: m.service,
            region_code: m.region_code,
            usage_type_pattern: m.usage_type_pattern,
            override_price: m.override_price,
            override_percentage: m.override_percentage,
            reason: m.reason,
            expires_at: m.expires_at.map(Into::into),
        }
    }
}
