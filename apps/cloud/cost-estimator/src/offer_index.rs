//! Fetches the AWS price list offer index: the top-level document listing
//! every service ("offer") and the URL of its current price list.

use crate::error::{IngestError, IngestResult};
use serde::Deserialize;
use std::collections::HashMap;

/// One service's current price-list location, as listed in the offer index.
#[derive(Debug, Clone)]
pub struct OfferEntry {
    pub offer_code: String,
    pub current_version_url: String,
}

/// Priority order for `ingest-all`: high-traffic services run first so a
/// concurrency-limited worker pool gets to the services most estimates
/// depend on before anything else.
const PRIORITY_SERVICES: &[&str] = &[
    "AmazonEC2",
    "AmazonRDS",
    "AmazonS3",
    "AmazonElastiCache",
    "AmazonVPC",
    "AWSLambda",
    "AmazonEKS",
    "AmazonDynamoDB",
];

#[derive(Debug, Deserialize)]
struct RawOfferIndex {
    offers: HashMap<String, RawOfferEntry>,
}

#[derive(Debug, Deserialize)]
struct RawOfferEntry {
    #[serde(rename = "currentVersionUrl")]
    current_version_url: String,
}

/// Fetches and parses the offer index, then orders entries by
/// [`PRIORITY_SERVICES`] (stable sort, unlisted services keep their
/// relative order after the priority group).
pub async fn fetch_offer_index(client: &reqwest::Client, base_url: &str) -> IngestResult<Vec<OfferEntry>> {
    let url = format!("{base_url}/offers/v1.0/aws/index.json");
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| IngestError::FetchTransient(e.to_string()))?;

    if !response.status().is_success() {
        return Err(IngestError::FetchPermanent(format!(
            "offer index returned {}",
            response.status()
        )));
    }

    let raw: RawOfferIndex = response
        .json()
        .await
        .map_err(|e| IngestError::MalformedDocument(e.to_string()))?;

    let mut entries: Vec<OfferEntry> = raw
        .offers
        .into_iter()
        .map(|(offer_code, entry)| OfferEntry {
            offer_code,
            current_version_url: format!("{base_url}{}", entry.current_version_url),
        })
        .collect();

    entries.sort_by_key(|e| priority_rank(&e.offer_code));
    Ok(entries)
}

fn priority_rank(offer_code: &str) -> usize {
    PRIORITY_SERVICES
        .iter()
        .position(|s| *s == offer_code)
        .unwrap_or(PRIORITY_SERVICES.len())
}

/// Filters by service code, case-insensitively, preserving priority order.
pub fn filter_services(entries: Vec<OfferEntry>, services: &[String]) -> Vec<OfferEntry> {
    if services.is_empty() {
        return entries;
    }
    let wanted: Vec<String> = services.iter().map(|s| s.to_lowercase()).collect();
    entries
        .into_iter()
        .filter(|e| wanted.contains(&e.offer_code.to_lowercase()))
        .collect()
}
