use crate::entity::{attribute_mapping, catalog_version, pricing_dimension, pricing_override};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    AttributeMapping, CatalogStatus, CatalogVersion, MatchCriteria, MappingType,
    NewAttributeMapping, NewCatalogVersion, NewPricingDimension, PricingDimension, PricingOverride,
    TermType,
};
use crate::repository::WarehouseStore;
use async_trait::async_trait;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbBackend, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Statement,
};
use tracing::{info, warn};
use uuid::Uuid;

pub struct PgWarehouseStore {
    db: DatabaseConnection,
}

impl PgWarehouseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WarehouseStore for PgWarehouseStore {
    async fn upsert_catalog_version(&self, input: NewCatalogVersion) -> CatalogResult<CatalogVersion> {
        let active: catalog_version::ActiveModel = input.into();
        let model = active
            .insert(&self.db)
            .await
            .map_err(CatalogError::from)?;
        Ok(model.into())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: CatalogStatus,
        record_count: Option<i64>,
        error_message: Option<String>,
    ) -> CatalogResult<()> {
        let mut active = catalog_version::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(CatalogError::from)?
            .ok_or_else(|| CatalogError::NotFound(format!("catalog version {id}")))?
            .into_active_model();

        active.status = sea_orm::ActiveValue::Set(status);
        if let Some(count) = record_count {
            active.record_count = sea_orm::ActiveValue::Set(count);
        }
        active.error_message = sea_orm::ActiveValue::Set(error_message);
        active.update(&self.db).await.map_err(CatalogError::from)?;
        Ok(())
    }

    async fn catalog_version_exists(&self, service: &str, version_hash: &str) -> CatalogResult<bool> {
        let count = catalog_version::Entity::find()
            .filter(catalog_version::Column::Service.eq(service))
            .filter(catalog_version::Column::VersionHash.eq(version_hash))
            .filter(catalog_version::Column::Status.eq(CatalogStatus::Completed))
            .count(&self.db)
            .await
            .map_err(CatalogError::from)?;
        Ok(count > 0)
    }

    async fn latest_completed_version(&self, service: &str) -> CatalogResult<Option<CatalogVersion>> {
        let model = catalog_version::Entity::find()
            .filter(catalog_version::Column::Service.eq(service))
            .filter(catalog_version::Column::Status.eq(CatalogStatus::Completed))
            .order_by_desc(catalog_version::Column::IngestedAt)
            .one(&self.db)
            .await
            .map_err(CatalogError::from)?;
        Ok(model.map(Into::into))
    }

    /// Loads a full batch of pricing rows in a single round trip using
    /// `INSERT ... SELECT * FROM UNNEST(...)` rather than one statement
    /// per row. Catalog ingests run to hundreds of thousands of rows;
    /// a row-at-a-time insert would dominate ingest wall time.
    async fn bulk_insert_dimensions(&self, batch: Vec<NewPricingDimension>) -> CatalogResult<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let n = batch.len();
        let mut ids = Vec::with_capacity(n);
        let mut catalog_version_ids = Vec::with_capacity(n);
        let mut services = Vec::with_capacity(n);
        let mut region_codes = Vec::with_capacity(n);
        let mut usage_types = Vec::with_capacity(n);
        let mut operations: Vec<Option<String>> = Vec::with_capacity(n);
        let mut units = Vec::with_capacity(n);
        let mut prices = Vec::with_capacity(n);
        let mut currencies = Vec::with_capacity(n);
        let mut begin_ranges = Vec::with_capacity(n);
        let mut end_ranges: Vec<Option<f64>> = Vec::with_capacity(n);
        let mut term_types = Vec::with_capacity(n);
        let mut skus = Vec::with_capacity(n);
        let mut rate_codes = Vec::with_capacity(n);
        let mut descriptions: Vec<Option<String>> = Vec::with_capacity(n);
        let mut product_families: Vec<Option<String>> = Vec::with_capacity(n);
        let mut attributes = Vec::with_capacity(n);

        for row in batch {
            ids.push(Uuid::now_v7().to_string());
            catalog_version_ids.push(row.catalog_version_id.to_string());
            services.push(row.service);
            region_codes.push(row.region_code);
            usage_types.push(row.usage_type);
            operations.push(row.operation);
            units.push(row.unit);
            prices.push(row.price_per_unit.to_string());
            currencies.push(row.currency);
            begin_ranges.push(row.begin_range);
            end_ranges.push(row.end_range);
            term_types.push(row.term_type.to_string());
            skus.push(row.sku);
            rate_codes.push(row.rate_code);
            descriptions.push(row.description);
            product_families.push(row.product_family);
            attributes.push(
                serde_json::to_string(&row.attributes).unwrap_or_else(|_| "{}".to_string()),
            );
        }

        let sql = r#"
            INSERT INTO pricing_dimensions (
                id, catalog_version_id, service, region_code, usage_type, operation,
                unit, price_per_unit, currency, begin_range, end_range, term_type,
                sku, rate_code, description, product_family, attributes
            )
            SELECT * FROM UNNEST(
                $1::uuid[], $2::uuid[], $3::text[], $4::text[], $5::text[], $6::text[],
                $7::text[], $8::numeric[], $9::text[], $10::double precision[],
                $11::double precision[], $12::term_type[], $13::text[], $14::text[],
                $15::text[], $16::text[], $17::jsonb[]
            )
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                ids.into(),
                catalog_version_ids.into(),
                services.into(),
                region_codes.into(),
                usage_types.into(),
                operations.into(),
                units.into(),
                prices.into(),
                currencies.into(),
                begin_ranges.into(),
                end_ranges.into(),
                term_types.into(),
                skus.into(),
                rate_codes.into(),
                descriptions.into(),
                product_families.into(),
                attributes.into(),
            ],
        );

        let result = self.db.execute(stmt).await.map_err(CatalogError::from)?;
        Ok(result.rows_affected())
    }

    async fn bulk_insert_mappings(&self, batch: Vec<NewAttributeMapping>) -> CatalogResult<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let n = batch.len();
        let mut ids = Vec::with_capacity(n);
        let mut catalog_version_ids = Vec::with_capacity(n);
        let mut mapping_types = Vec::with_capacity(n);
        let mut source_values = Vec::with_capacity(n);
        let mut target_values = Vec::with_capacity(n);

        for row in batch {
            ids.push(Uuid::now_v7().to_string());
            catalog_version_ids.push(row.catalog_version_id.to_string());
            mapping_types.push(row.mapping_type.to_string());
            source_values.push(row.source_value);
            target_values.push(row.target_value);
        }

        let sql = r#"
            INSERT INTO attribute_mappings (
                id, catalog_version_id, mapping_type, source_value, target_value
            )
            SELECT * FROM UNNEST(
                $1::uuid[], $2::uuid[], $3::mapping_type[], $4::text[], $5::text[]
            )
            ON CONFLICT (mapping_type, source_value) DO NOTHING
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                ids.into(),
                catalog_version_ids.into(),
                mapping_types.into(),
                source_values.into(),
                target_values.into(),
            ],
        );

        let result = self.db.execute(stmt).await.map_err(CatalogError::from)?;
        Ok(result.rows_affected())
    }

    /// Step-down match: exact region/usage-type/term, falling back to
    /// a `LIKE` scan over `usage_type_pattern` when the caller flags
    /// that its `usage_type` is itself a pattern the store should try
    /// loosely. Always restricted to the latest completed catalog
    /// version for the service and ordered so the lowest price wins
    /// ties.
    async fn query_best_match(&self, criteria: &MatchCriteria) -> CatalogResult<Vec<PricingDimension>> {
        let Some(version) = self.latest_completed_version(&criteria.service).await? else {
            return Ok(Vec::new());
        };

        let mut query = pricing_dimension::Entity::find()
            .filter(pricing_dimension::Column::CatalogVersionId.eq(version.id))
            .filter(pricing_dimension::Column::RegionCode.eq(criteria.region_code.clone()))
            .filter(pricing_dimension::Column::TermType.eq(term_type_value(criteria.term_type)));

        query = if criteria.usage_type_pattern {
            // Case-insensitive: catalog usage-type casing varies by source feed,
            // the pattern should not have to match it.
            query.filter(
                Expr::col(pricing_dimension::Column::UsageType)
                    .ilike(format!("%{}%", criteria.usage_type)),
            )
        } else {
            query.filter(pricing_dimension::Column::UsageType.eq(criteria.usage_type.clone()))
        };

        if !criteria.attributes.is_empty() {
            let needle = serde_json::to_string(&criteria.attributes).unwrap_or_else(|_| "{}".to_string());
            query = query.filter(Expr::cust_with_values(
                "attributes @> ?::jsonb",
                [needle],
            ));
        }

        let rows = query
            .order_by_asc(pricing_dimension::Column::PricePerUnit)
            .all(&self.db)
            .await
            .map_err(CatalogError::from)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn lookup_mapping(
        &self,
        mapping_type: MappingType,
        source_value: &str,
    ) -> CatalogResult<Option<AttributeMapping>> {
        let model = attribute_mapping::Entity::find()
            .filter(attribute_mapping::Column::MappingType.eq(mapping_type))
            .filter(attribute_mapping::Column::SourceValue.eq(source_value))
            .one(&self.db)
            .await
            .map_err(CatalogError::from)?;
        Ok(model.map(Into::into))
    }

    async fn prune_old_versions(&self, service: &str, keep_n: u64) -> CatalogResult<u64> {
        let keep_ids: Vec<Uuid> = catalog_version::Entity::find()
            .filter(catalog_version::Column::Service.eq(service))
            .filter(catalog_version::Column::Status.eq(CatalogStatus::Completed))
            .order_by_desc(catalog_version::Column::IngestedAt)
            .limit(keep_n)
            .all(&self.db)
            .await
            .map_err(CatalogError::from)?
            .into_iter()
            .map(|m| m.id)
            .collect();

        let result = catalog_version::Entity::delete_many()
            .filter(catalog_version::Column::Service.eq(service))
            .filter(catalog_version::Column::Status.eq(CatalogStatus::Completed))
            .filter(catalog_version::Column::Id.is_not_in(keep_ids))
            .exec(&self.db)
            .await
            .map_err(CatalogError::from)?;

        if result.rows_affected > 0 {
            info!(service, pruned = result.rows_affected, "pruned old catalog versions");
        } else {
            warn!(service, "prune_old_versions found nothing to prune");
        }

        Ok(result.rows_affected)
    }

    /// A hand-authored row applies when its `region_code`/`usage_type_pattern`
    /// are unset (wildcard) or match, and it hasn't expired.
    async fn find_applicable_overrides(
        &self,
        service: &str,
        region_code: &str,
        usage_type: &str,
    ) -> CatalogResult<Vec<PricingOverride>> {
        let now = chrono::Utc::now();

        let rows = pricing_override::Entity::find()
            .filter(pricing_override::Column::Service.eq(service))
            .filter(
                Condition::any()
                    .add(pricing_override::Column::RegionCode.is_null())
                    .add(pricing_override::Column::RegionCode.eq(region_code)),
            )
            .filter(
                Condition::any()
                    .add(pricing_override::Column::UsageTypePattern.is_null())
                    .add(
                        Expr::col(pricing_override::Column::UsageTypePattern)
                            .ilike(format!("%{usage_type}%")),
                    ),
            )
            .filter(
                Condition::any()
                    .add(pricing_override::Column::ExpiresAt.is_null())
                    .add(pricing_override::Column::ExpiresAt.gt(now)),
            )
            .all(&self.db)
            .await
            .map_err(CatalogError::from)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

fn term_type_value(term: TermType) -> String {
    term.to_string()
}
