//! Facet counts for search refinement.
//!
//! Each dimension is grouped independently, but always under the complete
//! active predicate set — including that dimension's own filter. Selecting
//! a provider therefore does not loosen the provider facet to show
//! alternatives; that behaviour is deliberate and load-bearing for the UI.

use sqlx::{Postgres, QueryBuilder, Row, Transaction};
use uuid::Uuid;

use super::error::CatalogResult;
use super::models::{FacetCount, Facets};
use super::predicates::{push_conditions, Predicate, CATALOG_JOINS};

#[derive(Debug, Clone, Copy)]
enum FacetDimension {
    Provider,
    Brand,
    Category,
}

impl FacetDimension {
    fn key(self) -> &'static str {
        match self {
            FacetDimension::Provider => "provider",
            FacetDimension::Brand => "brand",
            FacetDimension::Category => "category",
        }
    }

    /// (id expression, label expression) over the shared join tree.
    fn columns(self) -> (&'static str, &'static str) {
        match self {
            FacetDimension::Provider => ("pr.id", "pr.name"),
            FacetDimension::Brand => ("b.id", "b.name"),
            FacetDimension::Category => ("c.id", "c.name"),
        }
    }
}

fn facet_query<'args>(
    dimension: FacetDimension,
    conditions: &'args [Predicate],
) -> QueryBuilder<'args, Postgres> {
    let (id_expr, label_expr) = dimension.columns();
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(id_expr);
    qb.push(" AS facet_id, ");
    qb.push(label_expr);
    qb.push(" AS facet_label, COUNT(DISTINCT p.id) AS product_count");
    qb.push(CATALOG_JOINS);
    push_conditions(&mut qb, conditions);
    qb.push(" GROUP BY ");
    qb.push(id_expr);
    qb.push(", ");
    qb.push(label_expr);
    qb.push(" ORDER BY ");
    qb.push(label_expr);
    qb.push(" ASC");
    qb
}

async fn fetch_dimension(
    tx: &mut Transaction<'_, Postgres>,
    dimension: FacetDimension,
    conditions: &[Predicate],
) -> CatalogResult<Vec<FacetCount>> {
    let mut qb = facet_query(dimension, conditions);
    let rows = qb.build().fetch_all(&mut **tx).await?;

    // The outer joins leave a NULL-keyed group for products without this
    // dimension; skip it rather than excluding it in SQL, so the WHERE
    // clause stays byte-identical to the list and count queries.
    let mut counts = Vec::with_capacity(rows.len());
    for row in rows {
        let id: Option<Uuid> = row.get("facet_id");
        let Some(id) = id else { continue };
        counts.push(FacetCount {
            key: dimension.key(),
            value: id.to_string(),
            label: row.get("facet_label"),
            count: row.get("product_count"),
        });
    }
    Ok(counts)
}

/// Compute provider/brand/category facet counts under the given predicate
/// slice, each ordered alphabetically by label.
pub(crate) async fn build_facets(
    tx: &mut Transaction<'_, Postgres>,
    conditions: &[Predicate],
) -> CatalogResult<Facets> {
    Ok(Facets {
        provider: fetch_dimension(tx, FacetDimension::Provider, conditions).await?,
        brand: fetch_dimension(tx, FacetDimension::Brand, conditions).await?,
        category: fetch_dimension(tx, FacetDimension::Category, conditions).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::filters::SearchFilters;
    use crate::database_ops::predicates::build_conditions;

    fn provider_filter() -> SearchFilters {
        let mut filters = SearchFilters::default();
        filters
            .providers
            .insert("11111111-1111-1111-1111-111111111111".parse().unwrap());
        filters
    }

    #[test]
    fn facet_queries_group_and_order_by_their_dimension() {
        let sql = facet_query(FacetDimension::Provider, &[]).sql().to_string();
        assert!(sql.contains("COUNT(DISTINCT p.id)"));
        assert!(sql.contains("GROUP BY pr.id, pr.name"));
        assert!(sql.ends_with("ORDER BY pr.name ASC"));

        let sql = facet_query(FacetDimension::Category, &[]).sql().to_string();
        assert!(sql.contains("GROUP BY c.id, c.name"));
        assert!(sql.ends_with("ORDER BY c.name ASC"));
    }

    #[test]
    fn facet_queries_keep_their_own_dimension_filter() {
        // Choosing a provider must NOT loosen the provider facet's counts.
        let conditions = build_conditions(&provider_filter(), None);
        let sql = facet_query(FacetDimension::Provider, &conditions)
            .sql()
            .to_string();
        assert!(sql.contains("WHERE pr.id = ANY($1)"));
    }

    #[test]
    fn all_dimensions_share_the_same_where_clause() {
        let conditions = build_conditions(&provider_filter(), Some("flange"));
        let extract_where = |dim| {
            let sql = facet_query(dim, &conditions).sql().to_string();
            let start = sql.find(" WHERE ").expect("facet query has a WHERE");
            let end = sql.find(" GROUP BY ").expect("facet query has a GROUP BY");
            sql[start..end].to_string()
        };
        let provider = extract_where(FacetDimension::Provider);
        assert_eq!(provider, extract_where(FacetDimension::Brand));
        assert_eq!(provider, extract_where(FacetDimension::Category));
    }
}
