//! Read-only query engine over the provider catalog.

pub mod compare;
pub mod db;
pub mod error;
pub mod facets;
pub mod filters;
pub mod models;
pub mod predicates;
pub mod products;
pub mod providers;
pub mod search;
pub mod sort;
