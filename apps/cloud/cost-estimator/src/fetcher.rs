//! Catalog Fetcher (component B): fetches one offer's price list and loads
//! it into the warehouse store. Dispatches on body size between three
//! strategies so memory use stays bounded regardless of catalog size.

use crate::config::{Config, SPILL_THRESHOLD};
use crate::error::{IngestError, IngestResult};
use crate::offer_index::OfferEntry;
use crate::product_lookup::SledProductLookup;
use crate::stream_parse::{extract_publication_date, parse_products_pass, parse_terms_pass};
use chrono::Utc;
use database::common::retry::{retry_with_backoff, RetryConfig};
use domain_catalog::models::{CatalogStatus, NewCatalogVersion, NewPricingDimension, TermType};
use domain_catalog::normalizer::{normalize_term, NormalizeOutcome, ProductLookup, RawProduct, RawTerm};
use domain_catalog::rosetta::RosettaLearner;
use domain_catalog::WarehouseStore;
use observability::PricingMetrics;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::time::Instant;
use tracing::{info, warn};

/// Outcome of ingesting a single offer, reported up to the orchestrator.
#[derive(Debug)]
pub struct IngestOutcome {
    pub service: String,
    pub record_count: u64,
    pub skipped_unknown_sku: u64,
}

pub async fn ingest_offer(
    store: &dyn WarehouseStore,
    client: &reqwest::Client,
    config: &Config,
    offer: &OfferEntry,
) -> IngestResult<IngestOutcome> {
    PricingMetrics::record_collection_started("aws", &offer.offer_code);
    let started_at = Instant::now();

    let head = retry_with_backoff(
        || async { head_offer(client, &offer.current_version_url).await },
        RetryConfig::new().with_max_retries(config.fetcher.max_retries),
    )
    .await?;

    let version_hash = compute_version_hash(head.etag.as_deref(), &offer.current_version_url);

    if store
        .catalog_version_exists(&offer.offer_code, &version_hash)
        .await?
    {
        info!(service = %offer.offer_code, %version_hash, "catalog version already ingested, skipping");
        return Ok(IngestOutcome {
            service: offer.offer_code.clone(),
            record_count: 0,
            skipped_unknown_sku: 0,
        });
    }

    let version = store
        .upsert_catalog_version(NewCatalogVersion {
            service: offer.offer_code.clone(),
            version_hash,
            source_url: offer.current_version_url.clone(),
            etag: head.etag.clone(),
            publication_date: Utc::now(),
        })
        .await?;

    store
        .update_status(version.id, CatalogStatus::Ingesting, None, None)
        .await?;

    let result = load_offer_body(store, client, config, offer, version.id, head.content_length).await;

    match &result {
        Ok(outcome) => {
            store
                .update_status(
                    version.id,
                    CatalogStatus::Completed,
                    Some(outcome.record_count as i64),
                    None,
                )
                .await?;
            PricingMetrics::record_collection_completed(
                "aws",
                &offer.offer_code,
                outcome.record_count as usize,
                started_at.elapsed().as_secs_f64(),
            );
        }
        Err(e) => {
            store
                .update_status(version.id, CatalogStatus::Failed, None, Some(e.to_string()))
                .await?;
            PricingMetrics::record_collection_failed("aws", &offer.offer_code, &e.to_string());
        }
    }

    result
}

struct HeadInfo {
    etag: Option<String>,
    content_length: Option<u64>,
}

async fn head_offer(client: &reqwest::Client, url: &str) -> IngestResult<HeadInfo> {
    let response = client
        .head(url)
        .send()
        .await
        .map_err(|e| IngestError::FetchTransient(e.to_string()))?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(IngestError::FetchPermanent(format!("{url} returned 404")));
    }
    if !response.status().is_success() {
        return Err(IngestError::FetchTransient(format!(
            "{url} returned {}",
            response.status()
        )));
    }

    let etag = response
        .headers()
        .get(reqwest::header::ETAG)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim_matches('"').to_string());
    let content_length = response.content_length();

    Ok(HeadInfo { etag, content_length })
}

fn compute_version_hash(etag: Option<&str>, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(etag.unwrap_or("").as_bytes());
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

async fn load_offer_body(
    store: &dyn WarehouseStore,
    client: &reqwest::Client,
    config: &Config,
    offer: &OfferEntry,
    catalog_version_id: uuid::Uuid,
    content_length: Option<u64>,
) -> IngestResult<IngestOutcome> {
    let size = content_length.unwrap_or(0);

    if size < config.ingestion.stream_high_water_mark {
        load_in_memory(store, client, config, offer, catalog_version_id).await
    } else if size < SPILL_THRESHOLD {
        load_streamed_in_memory_products(store, client, config, offer, catalog_version_id).await
    } else {
        load_streamed_spilled_products(store, client, config, offer, catalog_version_id).await
    }
}

/// Small catalogs: GET the whole body, parse once, keep everything in
/// memory. Simplest and fastest path, used for the large majority of
/// offers.
async fn load_in_memory(
    store: &dyn WarehouseStore,
    client: &reqwest::Client,
    config: &Config,
    offer: &OfferEntry,
    catalog_version_id: uuid::Uuid,
) -> IngestResult<IngestOutcome> {
    let body = retry_with_backoff(
        || async { fetch_body(client, &offer.current_version_url).await },
        RetryConfig::new().with_max_retries(config.fetcher.max_retries),
    )
    .await?;

    let document: serde_json::Value =
        serde_json::from_str(&body).map_err(|e| IngestError::MalformedDocument(e.to_string()))?;

    let _publication_date = extract_publication_date(&document);

    let products_value = document
        .get("products")
        .ok_or_else(|| IngestError::MalformedDocument("missing products map".to_string()))?;
    let raw_products: HashMap<String, RawProductShape> =
        serde_json::from_value(products_value.clone()).map_err(|e| IngestError::MalformedDocument(e.to_string()))?;

    let mut products: HashMap<String, RawProduct> = HashMap::with_capacity(raw_products.len());
    let mut learner = RosettaLearner::new();
    let mut location_to_region: HashMap<String, String> = HashMap::new();

    for (sku, raw) in raw_products {
        learner.observe_product(&raw.attributes);
        if let (Some(region), Some(location)) = (raw.attributes.get("regionCode"), raw.attributes.get("location")) {
            location_to_region.entry(location.clone()).or_insert_with(|| region.clone());
        }
        products.insert(
            sku.clone(),
            RawProduct {
                sku,
                product_family: raw.product_family,
                attributes: raw.attributes,
            },
        );
    }

    let mut counters = IngestCounters::default();

    for (term_type, path) in [(TermType::OnDemand, "OnDemand"), (TermType::Reserved, "Reserved")] {
        if let Some(terms_value) = document.get("terms").and_then(|t| t.get(path)) {
            let raw_terms: HashMap<String, HashMap<String, RawTermShape>> =
                serde_json::from_value(terms_value.clone()).map_err(|e| IngestError::MalformedDocument(e.to_string()))?;

            let mut batch = Vec::with_capacity(config.ingestion.batch_size);
            for sku_terms in raw_terms.into_values() {
                for (rate_code, raw) in sku_terms {
                    let term = RawTerm {
                        sku: raw.sku,
                        rate_code,
                        price_dimensions: raw.price_dimensions.into_values().map(Into::into).collect(),
                    };
                    apply_term(
                        &offer.offer_code,
                        catalog_version_id,
                        &term,
                        term_type,
                        &products,
                        &location_to_region,
                        &mut batch,
                        &mut counters,
                    );
                    flush_if_full(store, &mut batch, config.ingestion.batch_size, &mut counters).await?;
                }
            }
            flush_batch(store, &mut batch, &mut counters).await?;
        }
    }

    export_learned_mappings(store, &learner, catalog_version_id).await?;

    Ok(IngestOutcome {
        service: offer.offer_code.clone(),
        record_count: counters.record_count,
        skipped_unknown_sku: counters.skipped_unknown_sku,
    })
}

/// Mid-size catalogs: stream the body to a temp file, then run the three
/// logical passes over it with the in-memory product map. The body itself
/// never lives in memory whole, only the product map does.
async fn load_streamed_in_memory_products(
    store: &dyn WarehouseStore,
    client: &reqwest::Client,
    config: &Config,
    offer: &OfferEntry,
    catalog_version_id: uuid::Uuid,
) -> IngestResult<IngestOutcome> {
    let temp_file = stream_to_temp_file(client, config, &offer.current_version_url).await?;
    let mut products: HashMap<String, RawProduct> = HashMap::new();
    let mut learner = RosettaLearner::new();
    let mut location_to_region: HashMap<String, String> = HashMap::new();

    let reader = std::fs::File::open(temp_file.as_ref())?;
    parse_products_pass(reader, |product| {
        learner.observe_product(&product.attributes);
        if let (Some(region), Some(location)) =
            (product.attributes.get("regionCode"), product.attributes.get("location"))
        {
            location_to_region
                .entry(location.clone())
                .or_insert_with(|| region.clone());
        }
        products.insert(product.sku.clone(), product);
    })?;

    let counters = run_term_passes(
        store,
        config,
        &offer.offer_code,
        catalog_version_id,
        temp_file.as_ref(),
        &products,
        &location_to_region,
    )
    .await?;

    export_learned_mappings(store, &learner, catalog_version_id).await?;

    Ok(IngestOutcome {
        service: offer.offer_code.clone(),
        record_count: counters.record_count,
        skipped_unknown_sku: counters.skipped_unknown_sku,
    })
}

/// Largest catalogs: the product map itself spills to `sled` so peak
/// memory stays bounded by one record at a time, not by catalog size.
async fn load_streamed_spilled_products(
    store: &dyn WarehouseStore,
    client: &reqwest::Client,
    config: &Config,
    offer: &OfferEntry,
    catalog_version_id: uuid::Uuid,
) -> IngestResult<IngestOutcome> {
    let temp_file = stream_to_temp_file(client, config, &offer.current_version_url).await?;
    let products = SledProductLookup::new()?;
    let mut learner = RosettaLearner::new();
    let mut location_to_region: HashMap<String, String> = HashMap::new();

    let reader = std::fs::File::open(temp_file.as_ref())?;
    parse_products_pass(reader, |product| {
        learner.observe_product(&product.attributes);
        if let (Some(region), Some(location)) =
            (product.attributes.get("regionCode"), product.attributes.get("location"))
        {
            location_to_region
                .entry(location.clone())
                .or_insert_with(|| region.clone());
        }
        if let Err(e) = products.insert(&product) {
            warn!(sku = %product.sku, error = %e, "failed to spill product to disk, sku will be treated as unknown");
        }
    })?;
    products.flush()?;

    let counters = run_term_passes(
        store,
        config,
        &offer.offer_code,
        catalog_version_id,
        temp_file.as_ref(),
        &products,
        &location_to_region,
    )
    .await?;

    export_learned_mappings(store, &learner, catalog_version_id).await?;

    Ok(IngestOutcome {
        service: offer.offer_code.clone(),
        record_count: counters.record_count,
        skipped_unknown_sku: counters.skipped_unknown_sku,
    })
}

async fn run_term_passes(
    store: &dyn WarehouseStore,
    config: &Config,
    service: &str,
    catalog_version_id: uuid::Uuid,
    temp_path: &std::path::Path,
    products: &dyn ProductLookup,
    location_to_region: &HashMap<String, String>,
) -> IngestResult<IngestCounters> {
    let mut counters = IngestCounters::default();

    for (term_type, sub_key) in [(TermType::OnDemand, "OnDemand"), (TermType::Reserved, "Reserved")] {
        let reader = std::fs::File::open(temp_path)?;
        let mut batch: Vec<NewPricingDimension> = Vec::with_capacity(config.ingestion.batch_size);

        parse_terms_pass(reader, sub_key, |term| {
            apply_term(
                service,
                catalog_version_id,
                &term,
                term_type,
                products,
                location_to_region,
                &mut batch,
                &mut counters,
            );
        })?;

        flush_batch(store, &mut batch, &mut counters).await?;
    }

    Ok(counters)
}

#[derive(Default)]
struct IngestCounters {
    record_count: u64,
    skipped_unknown_sku: u64,
}

fn apply_term(
    service: &str,
    catalog_version_id: uuid::Uuid,
    term: &RawTerm,
    term_type: TermType,
    products: &dyn ProductLookup,
    location_to_region: &HashMap<String, String>,
    batch: &mut Vec<NewPricingDimension>,
    counters: &mut IngestCounters,
) {
    let lookup = |loc: &str| location_to_region.get(loc).cloned();
    match normalize_term(catalog_version_id, service, term, term_type, products, &lookup) {
        NormalizeOutcome::Rows(rows) => batch.extend(rows),
        NormalizeOutcome::UnknownSku => counters.skipped_unknown_sku += 1,
    }
}

async fn flush_if_full(
    store: &dyn WarehouseStore,
    batch: &mut Vec<NewPricingDimension>,
    batch_size: usize,
    counters: &mut IngestCounters,
) -> IngestResult<()> {
    if batch.len() >= batch_size {
        flush_batch(store, batch, counters).await?;
    }
    Ok(())
}

async fn flush_batch(
    store: &dyn WarehouseStore,
    batch: &mut Vec<NewPricingDimension>,
    counters: &mut IngestCounters,
) -> IngestResult<()> {
    if batch.is_empty() {
        return Ok(());
    }
    let taken = std::mem::take(batch);
    let inserted = store.bulk_insert_dimensions(taken).await?;
    counters.record_count += inserted;
    Ok(())
}

async fn export_learned_mappings(
    store: &dyn WarehouseStore,
    learner: &RosettaLearner,
    catalog_version_id: uuid::Uuid,
) -> IngestResult<()> {
    let mappings = learner.export(catalog_version_id);
    if !mappings.is_empty() {
        store.bulk_insert_mappings(mappings).await?;
    }
    Ok(())
}

async fn fetch_body(client: &reqwest::Client, url: &str) -> IngestResult<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| IngestError::FetchTransient(e.to_string()))?;
    if !response.status().is_success() {
        return Err(IngestError::FetchTransient(format!("{url} returned {}", response.status())));
    }
    response
        .text()
        .await
        .map_err(|e| IngestError::FetchTransient(e.to_string()))
}

/// Streams the response body to a temp file, deleted once the returned
/// handle drops (on every exit path, success or failure).
async fn stream_to_temp_file(
    client: &reqwest::Client,
    config: &Config,
    url: &str,
) -> IngestResult<tempfile::TempPath> {
    use futures::StreamExt;

    let response = retry_with_backoff(
        || async {
            let resp = client
                .get(url)
                .timeout(std::time::Duration::from_secs(config.fetcher.request_timeout_secs))
                .send()
                .await
                .map_err(|e| IngestError::FetchTransient(e.to_string()))?;
            if !resp.status().is_success() {
                return Err(IngestError::FetchTransient(format!("{url} returned {}", resp.status())));
            }
            Ok(resp)
        },
        RetryConfig::new().with_max_retries(config.fetcher.max_retries),
    )
    .await?;

    let mut file = tempfile::NamedTempFile::new()?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| IngestError::FetchTransient(e.to_string()))?;
        file.write_all(&chunk)?;
    }
    file.flush()?;

    let (_file, path) = file.into_parts();
    Ok(path)
}

#[derive(serde::Deserialize)]
struct RawProductShape {
    #[serde(rename = "productFamily")]
    product_family: Option<String>,
    #[serde(default)]
    attributes: HashMap<String, String>,
}

#[derive(serde::Deserialize)]
struct RawTermShape {
    sku: String,
    #[serde(rename = "priceDimensions")]
    price_dimensions: HashMap<String, RawPriceDimensionShape>,
}

#[derive(serde::Deserialize)]
struct RawPriceDimensionShape {
    unit: String,
    description: Option<String>,
    #[serde(rename = "beginRange")]
    begin_range: Option<serde_json::Value>,
    #[serde(rename = "endRange")]
    end_range: Option<serde_json::Value>,
    #[serde(rename = "pricePerUnit")]
    price_per_unit: HashMap<String, String>,
}

impl From<RawPriceDimensionShape> for domain_catalog::normalizer::RawPriceDimension {
    fn from(d: RawPriceDimensionShape) -> Self {
        Self {
            unit: d.unit,
            description: d.description,
            begin_range: d.begin_range,
            end_range: d.end_range,
            price_per_unit: d.price_per_unit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_hash_is_stable_for_same_inputs() {
        let a = compute_version_hash(Some("abc123"), "https://example.com/x.json");
        let b = compute_version_hash(Some("abc123"), "https://example.com/x.json");
        assert_eq!(a, b);
    }

    #[test]
    fn version_hash_changes_with_etag() {
        let a = compute_version_hash(Some("abc123"), "https://example.com/x.json");
        let b = compute_version_hash(Some("xyz789"), "https://example.com/x.json");
        assert_ne!(a, b);
    }

    #[test]
    fn version_hash_handles_missing_etag() {
        let a = compute_version_hash(None, "https://example.com/x.json");
        assert_eq!(a.len(), 64);
    }
}
