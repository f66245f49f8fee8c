//! Product detail: one eager fetch per related collection, rolled up in
//! process. No predicate filtering applies here; detail always shows the
//! product's full offer roster.

use sqlx::{Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use super::db::Db;
use super::error::{CatalogError, CatalogResult};
use super::models::{
    price_range, AttributeEntry, BrandSummary, CategorySummary, ImageEntry, ProductDetail,
    ProductSummary, ProviderOffer, OFFER_COLUMNS,
};

pub(crate) async fn fetch_product_offers(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
) -> CatalogResult<Vec<ProviderOffer>> {
    let sql = format!(
        "SELECT {OFFER_COLUMNS} \
         FROM provider_products o \
         JOIN providers pr ON pr.id = o.provider_id \
         WHERE o.product_id = $1 \
         ORDER BY o.created_at ASC"
    );
    let rows = sqlx::query(&sql)
        .bind(product_id)
        .fetch_all(&mut **tx)
        .await?;
    Ok(rows.iter().map(ProviderOffer::from_row).collect())
}

/// Load a product with its attributes, images (ordered by sort_order) and
/// full offer list. Unknown id is the only error a caller must handle; a
/// product with zero offers is a normal result with absent prices.
#[instrument(skip(db))]
pub async fn load_product_detail(db: &Db, product_id: Uuid) -> CatalogResult<ProductDetail> {
    let mut tx = db.pool.begin().await?;

    let row = sqlx::query(
        "SELECT p.id, p.sku, p.name, p.description, \
         b.id AS brand_id, b.name AS brand_name, b.slug AS brand_slug, \
         c.id AS category_id, c.name AS category_name, c.slug AS category_slug, \
         c.parent_id AS category_parent_id \
         FROM products p \
         LEFT JOIN brands b ON b.id = p.brand_id \
         LEFT JOIN categories c ON c.id = p.default_category_id \
         WHERE p.id = $1",
    )
    .bind(product_id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(row) = row else {
        return Err(CatalogError::NotFound("product"));
    };

    let offers = fetch_product_offers(&mut tx, product_id).await?;

    let attribute_rows = sqlx::query(
        "SELECT key, value, value_type FROM product_attributes \
         WHERE product_id = $1 ORDER BY key ASC",
    )
    .bind(product_id)
    .fetch_all(&mut *tx)
    .await?;

    let image_rows = sqlx::query(
        "SELECT url, alt_text, sort_order FROM product_images \
         WHERE product_id = $1 ORDER BY sort_order ASC",
    )
    .bind(product_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    let attributes = attribute_rows
        .iter()
        .map(|r| AttributeEntry {
            key: r.get("key"),
            value: r.get("value"),
            value_type: r.get("value_type"),
        })
        .collect();
    let images = image_rows
        .iter()
        .map(|r| ImageEntry {
            url: r.get("url"),
            alt_text: r.get("alt_text"),
            sort_order: r.get("sort_order"),
        })
        .collect();

    let (lowest_price, highest_price) = price_range(&offers);
    // (provider, product) is unique, so the offer count IS the provider count.
    let provider_count = offers.len() as i64;

    Ok(ProductDetail {
        summary: ProductSummary {
            id: row.get("id"),
            sku: row.get("sku"),
            name: row.get("name"),
            description: row.get("description"),
            brand: BrandSummary::opt_from_row(&row),
            default_category: CategorySummary::opt_from_row(&row),
            lowest_price,
            highest_price,
            provider_count,
        },
        attributes,
        images,
        offers,
    })
}
