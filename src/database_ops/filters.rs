//! Filter-string parsing for catalog search.
//!
//! The wire format is `dim:id1,id2;dim2:id3` where `dim` is one of
//! `provider`, `brand` or `category` and ids are entity UUIDs. Anything
//! malformed is dropped, never rejected: the parser cannot fail.

use std::collections::HashSet;
use uuid::Uuid;

/// Parsed filter sets, one per facet dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub providers: HashSet<Uuid>,
    pub brands: HashSet<Uuid>,
    pub categories: HashSet<Uuid>,
}

impl SearchFilters {
    /// Parse a raw filter string. `None` and `""` both mean "no filtering".
    ///
    /// Chunks without a `:` and chunks with an unknown dimension key are
    /// skipped. Id tokens are trimmed; empty tokens and tokens that are not
    /// valid UUIDs are skipped (they could never match a row, and dropping
    /// them here keeps a bad id from turning into a cast error downstream).
    /// Duplicate ids collapse into the set.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut filters = Self::default();
        let Some(raw) = raw else {
            return filters;
        };

        for chunk in raw.split(';') {
            let Some((key, values)) = chunk.split_once(':') else {
                continue;
            };
            let target = match key {
                "provider" => &mut filters.providers,
                "brand" => &mut filters.brands,
                "category" => &mut filters.categories,
                _ => continue,
            };
            for token in values.split(',') {
                if let Ok(id) = Uuid::parse_str(token.trim()) {
                    target.insert(id);
                }
            }
        }

        filters
    }

    /// True when no dimension carries any id.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty() && self.brands.is_empty() && self.categories.is_empty()
    }
}
