//! Provider lookup and the paginated view of one provider's own offers.

use sqlx::{Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use super::db::Db;
use super::error::{CatalogError, CatalogResult};
use super::models::{
    BrandSummary, CategorySummary, ProductSummary, ProviderOffer, ProviderOffering,
    ProviderOfferingsResponse, ProviderSummary, OFFER_COLUMNS,
};
use super::search::page_offset;

fn offerings_page_sql() -> String {
    format!(
        "SELECT {OFFER_COLUMNS}, \
         p.id AS product_id, p.sku, p.name AS product_name, p.description, \
         b.id AS brand_id, b.name AS brand_name, b.slug AS brand_slug, \
         c.id AS category_id, c.name AS category_name, c.slug AS category_slug, \
         c.parent_id AS category_parent_id \
         FROM provider_products o \
         JOIN providers pr ON pr.id = o.provider_id \
         JOIN products p ON p.id = o.product_id \
         LEFT JOIN brands b ON b.id = p.brand_id \
         LEFT JOIN categories c ON c.id = p.default_category_id \
         WHERE o.provider_id = $1 \
         ORDER BY o.created_at DESC \
         OFFSET $2 LIMIT $3"
    )
}

/// Fold one offer row into a listing. The product rollup is degenerate:
/// lowest = highest = this offer's effective price, provider count 1.
fn single_offer_listing(offer: ProviderOffer, mut product: ProductSummary) -> ProviderOffering {
    let effective = offer.effective_price().cloned();
    product.lowest_price = effective.clone();
    product.highest_price = effective;
    product.provider_count = 1;
    ProviderOffering {
        provider: offer.provider.clone(),
        product,
        offer,
    }
}

async fn fetch_provider(
    tx: &mut Transaction<'_, Postgres>,
    provider_id: Uuid,
) -> CatalogResult<ProviderSummary> {
    let row = sqlx::query(
        "SELECT pr.id AS provider_id, pr.name AS provider_name, pr.slug AS provider_slug, \
         pr.website AS provider_website, pr.contact_email AS provider_contact_email, \
         pr.contact_phone AS provider_contact_phone \
         FROM providers pr WHERE pr.id = $1",
    )
    .bind(provider_id)
    .fetch_optional(&mut **tx)
    .await?;
    match row {
        Some(row) => Ok(ProviderSummary::from_row(&row)),
        None => Err(CatalogError::NotFound("provider")),
    }
}

/// Look a provider up by id.
#[instrument(skip(db))]
pub async fn load_provider(db: &Db, provider_id: Uuid) -> CatalogResult<ProviderSummary> {
    let mut tx = db.pool.begin().await?;
    let provider = fetch_provider(&mut tx, provider_id).await?;
    tx.commit().await?;
    Ok(provider)
}

/// Page through one provider's offers, most recently created first, each
/// joined to its product. `total` counts all of the provider's offers,
/// unfiltered.
#[instrument(skip(db))]
pub async fn load_provider_offerings(
    db: &Db,
    provider_id: Uuid,
    page: i64,
    page_size: i64,
) -> CatalogResult<ProviderOfferingsResponse> {
    let mut tx = db.pool.begin().await?;

    let provider = fetch_provider(&mut tx, provider_id).await?;

    let sql = offerings_page_sql();
    let rows = sqlx::query(&sql)
        .bind(provider_id)
        .bind(page_offset(page, page_size))
        .bind(page_size)
        .fetch_all(&mut *tx)
        .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM provider_products WHERE provider_id = $1")
        .bind(provider_id)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        let offer = ProviderOffer::from_row(row);
        let product = ProductSummary {
            id: row.get("product_id"),
            sku: row.get("sku"),
            name: row.get("product_name"),
            description: row.get("description"),
            brand: BrandSummary::opt_from_row(row),
            default_category: CategorySummary::opt_from_row(row),
            lowest_price: None,
            highest_price: None,
            provider_count: 0,
        };
        items.push(single_offer_listing(offer, product));
    }

    Ok(ProviderOfferingsResponse {
        provider,
        total,
        page,
        page_size,
        items,
    })
}
