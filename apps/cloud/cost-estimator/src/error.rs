use thiserror::Error;

/// Error taxonomy for the catalog fetcher and orchestrator (components B
/// and E). `FetchTransient` is retried internally by the fetcher with
/// `database::common::retry`; only `FetchPermanent` and the two structural
/// variants ever reach an orchestrator result or a catalog version's
/// `error_message`.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("transient fetch failure: {0}")]
    FetchTransient(String),

    #[error("permanent fetch failure: {0}")]
    FetchPermanent(String),

    #[error("catalog error: {0}")]
    Catalog(#[from] domain_catalog::CatalogError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed catalog document: {0}")]
    MalformedDocument(String),
}

pub type IngestResult<T> = Result<T, IngestError>;
