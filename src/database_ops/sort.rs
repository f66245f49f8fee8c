//! Sort and ranking policy for catalog search.

use std::str::FromStr;

use anyhow::anyhow;
use sqlx::{Postgres, QueryBuilder};

use super::predicates::SEARCH_DOCUMENT;

/// Requested result ordering. `Relevance` is the default and degrades to
/// plain name-ascending when no free-text query is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    #[default]
    Relevance,
    Price,
    PriceDesc,
    Name,
    NameDesc,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Relevance => "relevance",
            SortMode::Price => "price",
            SortMode::PriceDesc => "price_desc",
            SortMode::Name => "name",
            SortMode::NameDesc => "name_desc",
        }
    }
}

impl FromStr for SortMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(SortMode::Relevance),
            "price" => Ok(SortMode::Price),
            "price_desc" => Ok(SortMode::PriceDesc),
            "name" => Ok(SortMode::Name),
            "name_desc" => Ok(SortMode::NameDesc),
            other => Err(anyhow!("unknown sort mode: {other}")),
        }
    }
}

/// Append the `ORDER BY` clause for a sort mode to the paginated list query.
///
/// `query` must be the already-normalized free-text query (see
/// [`super::predicates::normalize_query`]); it only matters for
/// `Relevance`, where no ranking expression is emitted at all when it is
/// absent. Price sorts order by the aggregated effective price with nulls
/// last in both directions, so products without any priced offer always
/// trail.
pub fn push_order_by<'args>(
    qb: &mut QueryBuilder<'args, Postgres>,
    sort: SortMode,
    query: Option<&'args str>,
) {
    match sort {
        SortMode::Relevance => match query {
            Some(q) => {
                qb.push(" ORDER BY ts_rank_cd(to_tsvector('simple', ");
                qb.push(SEARCH_DOCUMENT);
                qb.push("), plainto_tsquery('simple', ");
                qb.push_bind(q);
                qb.push(")) DESC, p.name ASC");
            }
            None => {
                qb.push(" ORDER BY p.name ASC");
            }
        },
        SortMode::Price => {
            qb.push(" ORDER BY MIN(COALESCE(o.price, o.list_price)) ASC NULLS LAST, p.name ASC");
        }
        SortMode::PriceDesc => {
            qb.push(" ORDER BY MIN(COALESCE(o.price, o.list_price)) DESC NULLS LAST, p.name ASC");
        }
        SortMode::Name => {
            qb.push(" ORDER BY p.name ASC");
        }
        SortMode::NameDesc => {
            qb.push(" ORDER BY p.name DESC");
        }
    }
}
