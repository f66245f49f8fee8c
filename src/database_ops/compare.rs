//! Cross-provider price comparison for a single part number.

use tracing::instrument;
use uuid::Uuid;

use super::db::Db;
use super::error::CatalogResult;
use super::models::{ProviderOffer, OFFER_COLUMNS};

fn offers_by_product_sql() -> String {
    format!(
        "SELECT {OFFER_COLUMNS} \
         FROM provider_products o \
         JOIN providers pr ON pr.id = o.provider_id \
         WHERE o.product_id = $1 \
         ORDER BY COALESCE(o.price, o.list_price) ASC NULLS LAST"
    )
}

/// Resolve a SKU to its full, unfiltered offer list, cheapest first
/// (effective price ascending, unpriced offers last).
///
/// An unknown SKU yields an empty list, not an error; it is documented as
/// indistinguishable from a known SKU with zero offers.
#[instrument(skip(db))]
pub async fn compare_offers(db: &Db, sku: &str) -> CatalogResult<Vec<ProviderOffer>> {
    let mut tx = db.pool.begin().await?;

    let product_id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM products WHERE sku = $1")
        .bind(sku)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(product_id) = product_id else {
        return Ok(Vec::new());
    };

    let sql = offers_by_product_sql();
    let rows = sqlx::query(&sql)
        .bind(product_id)
        .fetch_all(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(rows.iter().map(ProviderOffer::from_row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offers_sort_by_effective_price_with_unpriced_last() {
        let sql = offers_by_product_sql();
        assert!(sql.contains(" WHERE o.product_id = $1 "));
        assert!(sql.ends_with(" ORDER BY COALESCE(o.price, o.list_price) ASC NULLS LAST"));
    }

    #[test]
    fn offers_join_their_provider() {
        let sql = offers_by_product_sql();
        assert!(sql.contains(" JOIN providers pr ON pr.id = o.provider_id "));
        assert!(sql.contains("pr.name AS provider_name"));
    }
}
