//! Response types produced by the query engine.
//!
//! Monetary amounts stay `BigDecimal` all the way to serialization; min,
//! max and coalesce never pass through binary floating point.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

/// Offer columns, with provider columns aliased for [`ProviderOffer::from_row`].
/// Assumes aliases `o` (provider_products) and `pr` (providers).
pub(crate) const OFFER_COLUMNS: &str = "o.id AS offer_id, o.unit_of_measure, o.currency, \
     o.list_price, o.price, o.inventory_quantity, o.inventory_updated_at, \
     pr.id AS provider_id, pr.name AS provider_name, pr.slug AS provider_slug, \
     pr.website AS provider_website, pr.contact_email AS provider_contact_email, \
     pr.contact_phone AS provider_contact_phone";

#[derive(Debug, Clone, Serialize)]
pub struct ProviderSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub website: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl ProviderSummary {
    pub(crate) fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("provider_id"),
            name: row.get("provider_name"),
            slug: row.get("provider_slug"),
            website: row.get("provider_website"),
            contact_email: row.get("provider_contact_email"),
            contact_phone: row.get("provider_contact_phone"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BrandSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl BrandSummary {
    /// Brand is optional on a product; the outer join yields NULL columns.
    pub(crate) fn opt_from_row(row: &PgRow) -> Option<Self> {
        let id: Option<Uuid> = row.get("brand_id");
        id.map(|id| Self {
            id,
            name: row.get("brand_name"),
            slug: row.get("brand_slug"),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
}

impl CategorySummary {
    pub(crate) fn opt_from_row(row: &PgRow) -> Option<Self> {
        let id: Option<Uuid> = row.get("category_id");
        id.map(|id| Self {
            id,
            name: row.get("category_name"),
            slug: row.get("category_slug"),
            parent_id: row.get("category_parent_id"),
        })
    }
}

/// One provider's listing of one product.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderOffer {
    pub id: Uuid,
    pub provider: ProviderSummary,
    pub unit_of_measure: Option<String>,
    pub currency: String,
    pub list_price: Option<BigDecimal>,
    pub price: Option<BigDecimal>,
    pub inventory_quantity: Option<f64>,
    pub inventory_updated_at: Option<DateTime<Utc>>,
}

impl ProviderOffer {
    pub(crate) fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("offer_id"),
            provider: ProviderSummary::from_row(row),
            unit_of_measure: row.get("unit_of_measure"),
            currency: row.get("currency"),
            list_price: row.get("list_price"),
            price: row.get("price"),
            inventory_quantity: row.get("inventory_quantity"),
            inventory_updated_at: row.get("inventory_updated_at"),
        }
    }

    /// Negotiated price when present, list price otherwise.
    pub fn effective_price(&self) -> Option<&BigDecimal> {
        self.price.as_ref().or(self.list_price.as_ref())
    }
}

/// Lowest and highest effective price over a set of offers. Offers without
/// any price contribute nothing; an all-unpriced (or empty) set yields
/// `(None, None)`.
pub(crate) fn price_range(offers: &[ProviderOffer]) -> (Option<BigDecimal>, Option<BigDecimal>) {
    match offers.iter().filter_map(ProviderOffer::effective_price).minmax() {
        MinMaxResult::NoElements => (None, None),
        MinMaxResult::OneElement(only) => (Some(only.clone()), Some(only.clone())),
        MinMaxResult::MinMax(lo, hi) => (Some(lo.clone()), Some(hi.clone())),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub brand: Option<BrandSummary>,
    pub default_category: Option<CategorySummary>,
    pub lowest_price: Option<BigDecimal>,
    pub highest_price: Option<BigDecimal>,
    pub provider_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeEntry {
    pub key: String,
    pub value: String,
    pub value_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageEntry {
    pub url: String,
    pub alt_text: Option<String>,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub summary: ProductSummary,
    pub attributes: Vec<AttributeEntry>,
    pub images: Vec<ImageEntry>,
    pub offers: Vec<ProviderOffer>,
}

/// One facet row: a dimension value and the number of distinct matching
/// products carrying it under the active filters.
#[derive(Debug, Clone, Serialize)]
pub struct FacetCount {
    pub key: &'static str,
    pub value: String,
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Facets {
    pub provider: Vec<FacetCount>,
    pub brand: Vec<FacetCount>,
    pub category: Vec<FacetCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<ProductSummary>,
    pub total: i64,
    pub facets: Facets,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderOffering {
    pub provider: ProviderSummary,
    pub product: ProductSummary,
    pub offer: ProviderOffer,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderOfferingsResponse {
    pub provider: ProviderSummary,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub items: Vec<ProviderOffering>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareResponse {
    pub sku: String,
    pub offers: Vec<ProviderOffer>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn offer(price: Option<&str>, list_price: Option<&str>) -> ProviderOffer {
        ProviderOffer {
            id: Uuid::new_v4(),
            provider: ProviderSummary {
                id: Uuid::new_v4(),
                name: "Acme Supply".into(),
                slug: "acme-supply".into(),
                website: None,
                contact_email: None,
                contact_phone: None,
            },
            unit_of_measure: None,
            currency: "USD".into(),
            list_price: list_price.map(|v| BigDecimal::from_str(v).unwrap()),
            price: price.map(|v| BigDecimal::from_str(v).unwrap()),
            inventory_quantity: None,
            inventory_updated_at: None,
        }
    }

    fn dec(v: &str) -> BigDecimal {
        BigDecimal::from_str(v).unwrap()
    }

    #[test]
    fn effective_price_prefers_negotiated_over_list() {
        assert_eq!(
            offer(Some("8.50"), Some("9.00")).effective_price(),
            Some(&dec("8.50"))
        );
        assert_eq!(
            offer(None, Some("9.00")).effective_price(),
            Some(&dec("9.00"))
        );
        assert_eq!(offer(None, None).effective_price(), None);
    }

    #[test]
    fn price_range_over_competing_offers() {
        // SKU "ABC": provider A at 10.00, provider B at 8.50 (list 9.00)
        let offers = vec![offer(Some("10.00"), None), offer(Some("8.50"), Some("9.00"))];
        let (lowest, highest) = price_range(&offers);
        assert_eq!(lowest, Some(dec("8.50")));
        assert_eq!(highest, Some(dec("10.00")));
    }

    #[test]
    fn price_range_ignores_unpriced_offers() {
        let offers = vec![offer(None, None), offer(None, Some("4.25"))];
        let (lowest, highest) = price_range(&offers);
        assert_eq!(lowest, Some(dec("4.25")));
        assert_eq!(highest, Some(dec("4.25")));
    }

    #[test]
    fn price_range_of_orphaned_product_is_absent_not_an_error() {
        assert_eq!(price_range(&[]), (None, None));
        let unpriced = vec![offer(None, None)];
        assert_eq!(price_range(&unpriced), (None, None));
    }

    #[test]
    fn product_detail_flattens_summary_fields() {
        let detail = ProductDetail {
            summary: ProductSummary {
                id: Uuid::new_v4(),
                sku: "WID-001".into(),
                name: "Widget".into(),
                description: None,
                brand: None,
                default_category: None,
                lowest_price: Some(dec("8.50")),
                highest_price: Some(dec("10.00")),
                provider_count: 2,
            },
            attributes: Vec::new(),
            images: Vec::new(),
            offers: Vec::new(),
        };
        let value = serde_json::to_value(&detail).unwrap();
        // summary fields sit at the top level, not under a "summary" key
        assert_eq!(value["sku"], "WID-001");
        assert_eq!(value["provider_count"], 2);
        assert!(value.get("summary").is_none());
        assert!(value["attributes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn facet_count_wire_shape() {
        let facet = FacetCount {
            key: "provider",
            value: Uuid::nil().to_string(),
            label: "Acme Supply".into(),
            count: 3,
        };
        let value = serde_json::to_value(&facet).unwrap();
        assert_eq!(value["key"], "provider");
        assert_eq!(value["label"], "Acme Supply");
        assert_eq!(value["count"], 3);
    }
}
