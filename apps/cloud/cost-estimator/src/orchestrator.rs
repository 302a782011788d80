//! Ingestion Orchestrator (component E): runs a bounded worker pool over a
//! batch of offers, isolating each offer's failure from its peers and
//! keeping the simultaneous DB connection count within budget.

use crate::config::Config;
use crate::fetcher::{ingest_offer, IngestOutcome};
use crate::offer_index::{fetch_offer_index, filter_services, OfferEntry};
use domain_catalog::WarehouseStore;
use futures::stream::{self, StreamExt};
use tracing::{error, info};

/// Per-offer result, always produced even on failure so the caller can
/// report a full table without an offer silently vanishing.
pub struct OfferResult {
    pub offer_code: String,
    pub outcome: Result<IngestOutcome, String>,
}

/// Aggregate stats across one `ingest-all` run.
#[derive(Debug, Default)]
pub struct IngestionStats {
    pub succeeded: u64,
    pub failed: u64,
    pub total_records: u64,
}

impl IngestionStats {
    pub fn from_results(results: &[OfferResult]) -> Self {
        let mut stats = Self::default();
        for result in results {
            match &result.outcome {
                Ok(outcome) => {
                    stats.succeeded += 1;
                    stats.total_records += outcome.record_count;
                }
                Err(_) => stats.failed += 1,
            }
        }
        stats
    }
}

/// Ingests every offer in `entries` with at most `concurrency` in flight at
/// once. Each worker owns one offer end-to-end; a failure there never
/// cancels or delays the others.
pub async fn run_batch(
    store: &dyn WarehouseStore,
    client: &reqwest::Client,
    config: &Config,
    entries: Vec<OfferEntry>,
) -> Vec<OfferResult> {
    let concurrency = config.ingestion.concurrency.max(1);

    stream::iter(entries)
        .map(|offer| async move {
            info!(service = %offer.offer_code, "starting ingest");
            let outcome = ingest_offer(store, client, config, &offer)
                .await
                .map_err(|e| e.to_string());
            if let Err(e) = &outcome {
                error!(service = %offer.offer_code, error = %e, "ingest failed");
            }
            OfferResult {
                offer_code: offer.offer_code,
                outcome,
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await
}

/// Fetches the offer index, applies an optional service filter, and runs
/// the batch. Used by both `ingest-all` and a single-service `ingest`.
pub async fn run_ingest_all(
    store: &dyn WarehouseStore,
    client: &reqwest::Client,
    config: &Config,
    services: &[String],
) -> Result<Vec<OfferResult>, crate::error::IngestError> {
    let entries = fetch_offer_index(client, &config.fetcher.aws_pricing_base_url).await?;
    let entries = filter_services(entries, services);
    Ok(run_batch(store, client, config, entries).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::IngestOutcome;

    fn ok_result(offer_code: &str, record_count: u64) -> OfferResult {
        OfferResult {
            offer_code: offer_code.to_string(),
            outcome: Ok(IngestOutcome {
                service: offer_code.to_string(),
                record_count,
                skipped_unknown_sku: 0,
            }),
        }
    }

    fn err_result(offer_code: &str) -> OfferResult {
        OfferResult { offer_code: offer_code.to_string(), outcome: Err("boom".to_string()) }
    }

    #[test]
    fn stats_count_successes_and_failures_independently() {
        let results = vec![ok_result("AmazonEC2", 100), err_result("AmazonRDS"), ok_result("AmazonS3", 50)];

        let stats = IngestionStats::from_results(&results);

        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total_records, 150);
    }

    #[test]
    fn stats_on_empty_results_are_all_zero() {
        let stats = IngestionStats::from_results(&[]);
        assert_eq!(stats.succeeded, 0);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.total_records, 0);
    }

    #[test]
    fn one_offer_failing_does_not_suppress_others_records() {
        // A single offer's failure must never mask the record counts of the
        // offers that succeeded alongside it in the same batch.
        let results = vec![err_result("AmazonEC2"), ok_result("AmazonRDS"), err_result("AmazonS3")];
        let stats = IngestionStats::from_results(&results);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.total_records, 100);
    }
}
