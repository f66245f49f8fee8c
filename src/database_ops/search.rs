//! The main search path: paginated list, total count and facets, composed
//! from one predicate list and executed on one transaction so the page,
//! the count and the facet numbers always agree with each other.

use sqlx::{Postgres, QueryBuilder, Row, Transaction};
use tracing::instrument;

use super::db::Db;
use super::error::CatalogResult;
use super::facets::build_facets;
use super::filters::SearchFilters;
use super::models::{BrandSummary, CategorySummary, ProductSummary, SearchResponse};
use super::predicates::{
    build_conditions, normalize_query, push_conditions, Predicate, CATALOG_JOINS,
};
use super::sort::{push_order_by, SortMode};

/// OFFSET for a zero-based page window. Saturates instead of overflowing:
/// an absurd page number becomes an offset past the last row, which Postgres
/// answers with an empty page.
pub(super) fn page_offset(page: i64, page_size: i64) -> i64 {
    page.saturating_mul(page_size)
}

fn page_query<'args>(
    conditions: &'args [Predicate],
    query: Option<&'args str>,
    sort: SortMode,
    page: i64,
    page_size: i64,
) -> QueryBuilder<'args, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT p.id, p.sku, p.name, p.description, \
         b.id AS brand_id, b.name AS brand_name, b.slug AS brand_slug, \
         c.id AS category_id, c.name AS category_name, c.slug AS category_slug, \
         c.parent_id AS category_parent_id, \
         COUNT(DISTINCT o.provider_id) AS provider_count, \
         MIN(COALESCE(o.price, o.list_price)) AS lowest_price, \
         MAX(COALESCE(o.price, o.list_price)) AS highest_price",
    );
    qb.push(CATALOG_JOINS);
    push_conditions(&mut qb, conditions);
    qb.push(" GROUP BY p.id, b.id, c.id");
    push_order_by(&mut qb, sort, query);
    qb.push(" OFFSET ");
    qb.push_bind(page_offset(page, page_size));
    qb.push(" LIMIT ");
    qb.push_bind(page_size);
    qb
}

fn count_query<'args>(conditions: &'args [Predicate]) -> QueryBuilder<'args, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(DISTINCT p.id) AS total");
    qb.push(CATALOG_JOINS);
    push_conditions(&mut qb, conditions);
    qb
}

async fn fetch_page(
    tx: &mut Transaction<'_, Postgres>,
    conditions: &[Predicate],
    query: Option<&str>,
    sort: SortMode,
    page: i64,
    page_size: i64,
) -> CatalogResult<Vec<ProductSummary>> {
    let mut qb = page_query(conditions, query, sort, page, page_size);
    let rows = qb.build().fetch_all(&mut **tx).await?;

    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        results.push(ProductSummary {
            id: row.get("id"),
            sku: row.get("sku"),
            name: row.get("name"),
            description: row.get("description"),
            brand: BrandSummary::opt_from_row(&row),
            default_category: CategorySummary::opt_from_row(&row),
            lowest_price: row.get("lowest_price"),
            highest_price: row.get("highest_price"),
            provider_count: row.get("provider_count"),
        });
    }
    Ok(results)
}

async fn fetch_total(
    tx: &mut Transaction<'_, Postgres>,
    conditions: &[Predicate],
) -> CatalogResult<i64> {
    let mut qb = count_query(conditions);
    let row = qb.build().fetch_one(&mut **tx).await?;
    Ok(row.get("total"))
}

/// Search the catalog: parsed filters plus an optional free-text query, a
/// zero-based page window and a sort mode.
///
/// The rollup columns (lowest/highest effective price, distinct provider
/// count) are scoped to the offers surviving the active predicates; with a
/// provider filter on, `provider_count` counts only the filtered providers.
#[instrument(skip(db, filters), fields(sort = sort.as_str()))]
pub async fn search_products(
    db: &Db,
    query: Option<&str>,
    filters: &SearchFilters,
    page: i64,
    page_size: i64,
    sort: SortMode,
) -> CatalogResult<SearchResponse> {
    let query = normalize_query(query);
    let conditions = build_conditions(filters, query);

    // One transaction so the page, the count and the facets observe the
    // same snapshot even while the ingestion job is writing.
    let mut tx = db.pool.begin().await?;
    let results = fetch_page(&mut tx, &conditions, query, sort, page, page_size).await?;
    let total = fetch_total(&mut tx, &conditions).await?;
    let facets = build_facets(&mut tx, &conditions).await?;
    tx.commit().await?;

    Ok(SearchResponse {
        results,
        total,
        facets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some_conditions() -> Vec<Predicate> {
        let mut filters = SearchFilters::default();
        filters
            .providers
            .insert("11111111-1111-1111-1111-111111111111".parse().unwrap());
        filters
            .brands
            .insert("22222222-2222-2222-2222-222222222222".parse().unwrap());
        build_conditions(&filters, Some("gasket"))
    }

    fn where_clause(sql: &str) -> &str {
        let start = sql.find(" WHERE ").expect("query has a WHERE clause");
        let end = sql[start..]
            .find(" GROUP BY ")
            .map(|off| start + off)
            .unwrap_or(sql.len());
        &sql[start..end]
    }

    #[test]
    fn list_and_count_share_the_exact_where_clause() {
        let conditions = some_conditions();
        let list_sql = page_query(&conditions, Some("gasket"), SortMode::Relevance, 0, 20)
            .sql()
            .to_string();
        let count_sql = count_query(&conditions).sql().to_string();
        assert_eq!(where_clause(&list_sql), where_clause(&count_sql));
    }

    #[test]
    fn unfiltered_queries_have_no_where_clause() {
        let count_sql = count_query(&[]).sql().to_string();
        assert!(!count_sql.contains("WHERE"));
        assert_eq!(
            count_sql,
            format!("SELECT COUNT(DISTINCT p.id) AS total{CATALOG_JOINS}")
        );
    }

    #[test]
    fn page_query_rolls_up_prices_and_provider_count() {
        let sql = page_query(&[], None, SortMode::Name, 0, 20).sql().to_string();
        assert!(sql.contains("COUNT(DISTINCT o.provider_id) AS provider_count"));
        assert!(sql.contains("MIN(COALESCE(o.price, o.list_price)) AS lowest_price"));
        assert!(sql.contains("MAX(COALESCE(o.price, o.list_price)) AS highest_price"));
        assert!(sql.contains(" GROUP BY p.id, b.id, c.id"));
    }

    #[test]
    fn page_window_binds_offset_and_limit() {
        let sql = page_query(&[], None, SortMode::Name, 3, 25).sql().to_string();
        assert!(sql.contains(" OFFSET $1 LIMIT $2"));
    }

    #[test]
    fn relevance_without_query_emits_plain_name_order() {
        let sql = page_query(&[], None, SortMode::Relevance, 0, 20)
            .sql()
            .to_string();
        assert!(sql.contains(" ORDER BY p.name ASC "));
        assert!(!sql.contains("ts_rank_cd"));
    }

    #[test]
    fn huge_page_numbers_saturate_instead_of_overflowing() {
        assert_eq!(page_offset(i64::MAX / 2, 100), i64::MAX);
        assert_eq!(page_offset(3, 25), 75);
        // building the query with such a page must not panic
        let sql = page_query(&[], None, SortMode::Name, i64::MAX / 2, 100)
            .sql()
            .to_string();
        assert!(sql.contains(" OFFSET $1 LIMIT $2"));
    }

    #[test]
    fn text_query_binds_shift_pagination_placeholders() {
        let conditions = build_conditions(&SearchFilters::default(), Some("bolt"));
        let sql = page_query(&conditions, Some("bolt"), SortMode::Relevance, 1, 10)
            .sql()
            .to_string();
        // $1 = WHERE text match, $2 = rank expression, $3/$4 = window
        assert!(sql.contains("plainto_tsquery('simple', $1)"));
        assert!(sql.contains("plainto_tsquery('simple', $2)) DESC"));
        assert!(sql.contains(" OFFSET $3 LIMIT $4"));
    }
}
