//! Canonical predicate composition for catalog queries.
//!
//! `build_conditions` turns a [`SearchFilters`] plus an optional free-text
//! query into one ordered predicate list. `push_conditions` is the single
//! place that list becomes SQL: the paginated list query, the total-count
//! query and all three facet queries push the same slice through it, so the
//! four query shapes can never drift apart.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::filters::SearchFilters;

/// Join tree every search-shaped query runs over. The predicate SQL below
/// refers to these aliases (`p`, `b`, `c`, `o`, `pr`).
pub const CATALOG_JOINS: &str = " FROM products p \
    LEFT JOIN brands b ON b.id = p.brand_id \
    LEFT JOIN categories c ON c.id = p.default_category_id \
    LEFT JOIN provider_products o ON o.product_id = p.id \
    LEFT JOIN providers pr ON pr.id = o.provider_id";

/// Synthesized full-text document: SKU, name and description joined with
/// single spaces, missing description contributing an empty string.
pub const SEARCH_DOCUMENT: &str = "concat_ws(' ', p.sku, p.name, coalesce(p.description, ''))";

/// One boolean narrowing condition. The variants appear in the list in this
/// fixed order: provider, brand, category, text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Product has at least one offer from one of these providers.
    ProviderIn(Vec<Uuid>),
    /// Product's brand is one of these.
    BrandIn(Vec<Uuid>),
    /// Product's default category is one of these.
    CategoryIn(Vec<Uuid>),
    /// Tokenized document matches the tokenized query.
    TextMatch(String),
}

/// Treat `None`, `""` and whitespace-only strings uniformly as "no query".
pub fn normalize_query(query: Option<&str>) -> Option<&str> {
    query.map(str::trim).filter(|q| !q.is_empty())
}

/// Compose the canonical ordered predicate list. A dimension contributes a
/// predicate only when its filter set is non-empty; the text predicate only
/// when the query is non-empty after trimming.
pub fn build_conditions(filters: &SearchFilters, query: Option<&str>) -> Vec<Predicate> {
    let mut conditions = Vec::with_capacity(4);

    if !filters.providers.is_empty() {
        conditions.push(Predicate::ProviderIn(sorted_ids(&filters.providers)));
    }
    if !filters.brands.is_empty() {
        conditions.push(Predicate::BrandIn(sorted_ids(&filters.brands)));
    }
    if !filters.categories.is_empty() {
        conditions.push(Predicate::CategoryIn(sorted_ids(&filters.categories)));
    }
    if let Some(q) = normalize_query(query) {
        conditions.push(Predicate::TextMatch(q.to_string()));
    }

    conditions
}

// Set iteration order is arbitrary; sort so the rendered SQL and its binds
// are stable for a given filter string.
fn sorted_ids(ids: &std::collections::HashSet<Uuid>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = ids.iter().copied().collect();
    ids.sort();
    ids
}

/// Render the predicate list as a `WHERE` clause (nothing when empty),
/// AND-combined in list order.
pub fn push_conditions<'args>(
    qb: &mut QueryBuilder<'args, Postgres>,
    conditions: &'args [Predicate],
) {
    for (idx, condition) in conditions.iter().enumerate() {
        qb.push(if idx == 0 { " WHERE " } else { " AND " });
        match condition {
            Predicate::ProviderIn(ids) => {
                qb.push("pr.id = ANY(");
                qb.push_bind(ids);
                qb.push(")");
            }
            Predicate::BrandIn(ids) => {
                qb.push("p.brand_id = ANY(");
                qb.push_bind(ids);
                qb.push(")");
            }
            Predicate::CategoryIn(ids) => {
                qb.push("p.default_category_id = ANY(");
                qb.push_bind(ids);
                qb.push(")");
            }
            Predicate::TextMatch(query) => {
                qb.push("to_tsvector('simple', ");
                qb.push(SEARCH_DOCUMENT);
                qb.push(") @@ plainto_tsquery('simple', ");
                qb.push_bind(query);
                qb.push(")");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(providers: &[&str], brands: &[&str], categories: &[&str]) -> SearchFilters {
        let parse = |ids: &[&str]| ids.iter().map(|s| Uuid::parse_str(s).unwrap()).collect();
        SearchFilters {
            providers: parse(providers),
            brands: parse(brands),
            categories: parse(categories),
        }
    }

    const ID_A: &str = "11111111-1111-1111-1111-111111111111";
    const ID_B: &str = "22222222-2222-2222-2222-222222222222";

    #[test]
    fn empty_input_yields_no_conditions() {
        let conditions = build_conditions(&SearchFilters::default(), None);
        assert!(conditions.is_empty());
    }

    #[test]
    fn conditions_appear_in_fixed_order() {
        let f = filters(&[ID_A], &[ID_B], &[ID_A]);
        let conditions = build_conditions(&f, Some("gasket"));
        assert_eq!(conditions.len(), 4);
        assert!(matches!(conditions[0], Predicate::ProviderIn(_)));
        assert!(matches!(conditions[1], Predicate::BrandIn(_)));
        assert!(matches!(conditions[2], Predicate::CategoryIn(_)));
        assert!(matches!(conditions[3], Predicate::TextMatch(_)));
    }

    #[test]
    fn blank_query_adds_no_text_predicate() {
        let conditions = build_conditions(&SearchFilters::default(), Some("   "));
        assert!(conditions.is_empty());
        assert_eq!(normalize_query(Some("  ")), None);
        assert_eq!(normalize_query(Some(" bolt ")), Some("bolt"));
    }

    #[test]
    fn query_only_yields_single_text_predicate() {
        let conditions = build_conditions(&SearchFilters::default(), Some("hex bolt"));
        assert_eq!(
            conditions,
            vec![Predicate::TextMatch("hex bolt".to_string())]
        );
    }

    #[test]
    fn ids_are_sorted_for_stable_sql() {
        let f = filters(&[ID_B, ID_A], &[], &[]);
        let conditions = build_conditions(&f, None);
        let Predicate::ProviderIn(ids) = &conditions[0] else {
            panic!("expected provider predicate");
        };
        assert_eq!(ids[0].to_string(), ID_A);
        assert_eq!(ids[1].to_string(), ID_B);
    }

    #[test]
    fn renders_where_clause_with_and_separators() {
        let f = filters(&[ID_A], &[ID_B], &[]);
        let conditions = build_conditions(&f, Some("washer"));
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1");
        push_conditions(&mut qb, &conditions);
        let sql = qb.sql().to_string();
        assert!(sql.contains(" WHERE pr.id = ANY($1)"));
        assert!(sql.contains(" AND p.brand_id = ANY($2)"));
        assert!(sql.contains("plainto_tsquery('simple', $3)"));
    }

    #[test]
    fn no_conditions_renders_no_where() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1");
        push_conditions(&mut qb, &[]);
        assert_eq!(qb.sql(), "SELECT 1");
    }

    #[test]
    fn rendering_is_identical_across_query_shapes() {
        let f = filters(&[ID_A], &[], &[ID_B]);
        let conditions = build_conditions(&f, Some("valve"));

        let mut list = QueryBuilder::<Postgres>::new("list");
        let mut count = QueryBuilder::<Postgres>::new("count");
        push_conditions(&mut list, &conditions);
        push_conditions(&mut count, &conditions);

        let list_where = list.sql().strip_prefix("list").unwrap().to_string();
        let count_where = count.sql().strip_prefix("count").unwrap().to_string();
        assert_eq!(list_where, count_where);
        assert!(!list_where.is_empty());
    }
}
