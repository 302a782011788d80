use crate::models::{AttributeMapping, MappingType, NewAttributeMapping};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize, serde::Deserialize)]
#[sea_orm(table_name = "attribute_mappings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub catalog_version_id: Uuid,
    pub mapping_type: MappingType,
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub source_value: String,
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub target_value: String,
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

impl From<Model> for AttributeMapping {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            catalog_version_id: m.catalog_version_id,
            mapping_type: m.mapping_type,
            source_value: m.source_value,
            target_value: m.target_value,
        }
    }
}

impl From<NewAttributeMapping> for ActiveModel {
    fn from(input: NewAttributeMapping) -> Self {
        ActiveModel {
            id: Set(Uuid::now_v7()),
            catalog_version_id: Set(input.catalog_version_id),
            mapping_type: Set(input.mapping_type),
            source_value: Set(input.source_value),
            target_value: Set(input.target_value),
        }
    }
}
