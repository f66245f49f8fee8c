//! catalog-compare: read-only search and price-comparison engine over a
//! multi-provider product catalog.
//!
//! The query engine lives in [`database_ops`]; the actix-web surface in
//! [`api`]. The process never writes to the catalog — ingestion and schema
//! migrations belong to a separate job.

pub mod api;
pub mod database_ops;
pub mod tracing;

pub mod util {
    pub mod env;
}
