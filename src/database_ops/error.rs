use thiserror::Error;

/// Failures the query engine can surface to its caller.
///
/// Empty results are never errors: an unknown SKU in compare and a filter
/// set matching nothing both come back as normally-shaped empty
/// collections. `NotFound` covers unknown entity ids only.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The store is unreachable or a query failed. Never retried; the whole
    /// request fails (no partial results).
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
