// Quick terminal search against the live catalog.

use anyhow::{anyhow, Result};
use catalog_compare::database_ops::{
    db::Db, filters::SearchFilters, search::search_products, sort::SortMode,
};
use catalog_compare::util::env as env_util;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    catalog_compare::tracing::init_tracing("warn")?;
    let database_url = env_util::db_url()?;

    let q = env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: search <query> [limit] [filters]"))?;
    let limit: i64 = env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(25);
    let filters = SearchFilters::parse(env::args().nth(3).as_deref());

    let db = Db::connect(&database_url, 5).await?;
    let response = search_products(&db, Some(&q), &filters, 0, limit, SortMode::Relevance).await?;

    println!("Results ({} of {} total):", response.results.len(), response.total);
    for product in &response.results {
        let price = match (&product.lowest_price, &product.highest_price) {
            (Some(lo), Some(hi)) if lo != hi => format!("{lo} - {hi}"),
            (Some(lo), _) => format!("{lo}"),
            _ => "no price".to_string(),
        };
        println!(
            "  [{}] {} ({} providers, {})",
            product.sku, product.name, product.provider_count, price
        );
    }

    println!("\nProvider facet:");
    for facet in &response.facets.provider {
        println!("  {} ({})", facet.label, facet.count);
    }
    Ok(())
}
