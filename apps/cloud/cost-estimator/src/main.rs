//! Cost Estimator
//!
//! Ingests cloud provider price lists into a normalized catalog and prices
//! Terraform configurations against it, as a CLI tool or an HTTP service.

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::Environment;
use domain_catalog::PgWarehouseStore;
use eyre::Result;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod error;
mod fetcher;
mod hcl_loader;
mod offer_index;
mod openapi;
mod orchestrator;
mod product_lookup;
mod state;
mod stream_parse;

use config::Config;
use state::AppState;

#[derive(Parser)]
#[command(name = "cost-estimator")]
#[command(about = "Ingest cloud pricing catalogs and estimate Terraform spend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a single service's price list for one region-agnostic catalog
    Ingest {
        /// Provider offer code, e.g. AmazonEC2
        service: String,
        /// Unused today (AWS price lists cover all regions in one document);
        /// kept so the CLI surface matches per-region providers later.
        region: String,
    },

    /// Ingest every service in the provider's offer index
    IngestAll {
        region: String,
        /// Only ingest the services most estimates depend on
        #[arg(long)]
        essential_only: bool,
        /// Exit 0 if at least one service succeeds, instead of requiring all
        #[arg(long)]
        continue_on_error: bool,
    },

    /// Print the latest completed catalog version per service
    Status,

    /// Run pending database migrations
    InitDb,

    /// Run the HTTP API
    Serve,
}

const ESSENTIAL_SERVICES: &[&str] = &[
    "AmazonEC2",
    "AmazonRDS",
    "AmazonS3",
    "AmazonElastiCache",
    "AWSLambda",
    "AmazonDynamoDB",
];

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre()?;

    let config = Config::from_env()?;
    let environment = Environment::from_env();
    init_tracing(&environment);

    observability::init_metrics();
    info!("Prometheus metrics initialized");

    let cli = Cli::parse();

    if matches!(cli.command, Commands::InitDb) {
        info!("Connecting to database for migration...");
        let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
            .await
            .map_err(|e| eyre::eyre!("Database connection failed: {}", e))?;
        database::postgres::run_migrations::<migration::Migrator>(&db).await?;
        info!("Migrations complete");
        return Ok(());
    }

    info!("Connecting to database...");
    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("Database connection failed: {}", e))?;

    let exit_code = match cli.command {
        Commands::InitDb => unreachable!(),

        Commands::Ingest { service, region: _ } => {
            let store = PgWarehouseStore::new(db.clone());
            let client = build_http_client(&config)?;
            let entries = offer_index::fetch_offer_index(&client, &config.fetcher.aws_pricing_base_url).await?;
            let entries = offer_index::filter_services(entries, std::slice::from_ref(&service));
            if entries.is_empty() {
                eyre::bail!("unknown service: {service}");
            }
            let results = orchestrator::run_batch(&store, &client, &config, entries).await;
            print_results(&results);
            if results.iter().all(|r| r.outcome.is_ok()) { 0 } else { 1 }
        }

        Commands::IngestAll {
            region: _,
            essential_only,
            continue_on_error,
        } => {
            let store = PgWarehouseStore::new(db.clone());
            let client = build_http_client(&config)?;
            let services: Vec<String> = if essential_only {
                ESSENTIAL_SERVICES.iter().map(|s| s.to_string()).collect()
            } else {
                Vec::new()
            };
            let results = orchestrator::run_ingest_all(&store, &client, &config, &services).await?;
            print_results(&results);

            let stats = orchestrator::IngestionStats::from_results(&results);
            println!(
                "---\n{} succeeded, {} failed, {} records ingested",
                stats.succeeded, stats.failed, stats.total_records
            );
            info!(
                succeeded = stats.succeeded,
                failed = stats.failed,
                total_records = stats.total_records,
                "ingest-all complete"
            );

            if continue_on_error {
                if stats.succeeded > 0 { 0 } else { 1 }
            } else if stats.failed == 0 {
                0
            } else {
                1
            }
        }

        Commands::Status => {
            let store = PgWarehouseStore::new(db.clone());
            print_status(&store).await?;
            0
        }

        Commands::Serve => {
            let state = AppState { config: config.clone(), db: db.clone() };
            let app = api::routes(state);

            info!("Starting cost-estimator API with production-ready shutdown (30s timeout)");
            axum_helpers::server::create_production_app(
                app,
                &config.server,
                Duration::from_secs(30),
                async move {
                    match db.close().await {
                        Ok(_) => info!("PostgreSQL connection closed successfully"),
                        Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
                    }
                },
            )
            .await
            .map_err(|e| eyre::eyre!("Server error: {}", e))?;

            info!("cost-estimator shutdown complete");
            0
        }
    };

    std::process::exit(exit_code);
}

fn build_http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetcher.request_timeout_secs))
        .build()
        .map_err(|e| eyre::eyre!("failed to build HTTP client: {}", e))
}

fn print_results(results: &[orchestrator::OfferResult]) {
    for result in results {
        match &result.outcome {
            Ok(outcome) => println!(
                "{:<24} OK      {} records ({} unknown sku)",
                result.offer_code, outcome.record_count, outcome.skipped_unknown_sku
            ),
            Err(e) => println!("{:<24} FAILED  {}", result.offer_code, e),
        }
    }
}

async fn print_status(store: &PgWarehouseStore) -> Result<()> {
    use domain_catalog::WarehouseStore;

    for service in ESSENTIAL_SERVICES {
        match store.latest_completed_version(service).await {
            Ok(Some(version)) => println!(
                "{:<24} {:<10} {} records  ingested {}",
                service, version.status, version.record_count, version.ingested_at
            ),
            Ok(None) => println!("{:<24} never ingested", service),
            Err(e) => println!("{:<24} error: {}", service, e),
        }
    }
    Ok(())
}
