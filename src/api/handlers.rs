// HTTP request handlers for API endpoints

use actix_web::{web, HttpResponse, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::api::models::*;
use crate::api::server::ApiConfig;
use crate::database_ops::compare::compare_offers;
use crate::database_ops::db::Db;
use crate::database_ops::error::CatalogError;
use crate::database_ops::filters::SearchFilters;
use crate::database_ops::models::CompareResponse;
use crate::database_ops::products::load_product_detail;
use crate::database_ops::providers::{load_provider, load_provider_offerings};
use crate::database_ops::search::search_products;
use crate::database_ops::sort::SortMode;

/// Upper bound on page_size for every paginated endpoint.
pub const MAX_PAGE_SIZE: i64 = 100;

fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::<()>::error(message))
}

/// Map a core result onto an HTTP response: bare body on success, 404 for
/// unknown ids, 500 for storage failures (logged, never retried).
fn catalog_response<T: Serialize>(result: Result<T, CatalogError>, op: &str) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(CatalogError::NotFound(what)) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error(format!("{what} not found")))
        }
        Err(CatalogError::Storage(err)) => {
            tracing::error!(op, error = %err, "catalog query failed");
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error("storage failure"))
        }
    }
}

/// Health check endpoint
pub async fn health_check(db: web::Data<Db>) -> Result<HttpResponse> {
    // Quick database connectivity check
    let db_status = match sqlx::query_scalar::<_, bool>("SELECT true")
        .fetch_one(&db.pool)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let response = ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        database: db_status.to_string(),
    });

    Ok(HttpResponse::Ok().json(response))
}

/// Search the catalog with optional full-text query, filters, paging and sort
pub async fn search_catalog(
    params: web::Query<SearchParams>,
    db: web::Data<Db>,
    config: web::Data<ApiConfig>,
) -> Result<HttpResponse> {
    let params = params.into_inner();

    let page = params.page.unwrap_or(0);
    if page < 0 {
        return Ok(bad_request("page must be >= 0"));
    }
    let page_size = params.page_size.unwrap_or(config.default_page_size);
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Ok(bad_request(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    let sort = match params.sort.as_deref() {
        None => SortMode::default(),
        Some(raw) => match raw.parse::<SortMode>() {
            Ok(sort) => sort,
            Err(err) => return Ok(bad_request(err.to_string())),
        },
    };
    let filters = SearchFilters::parse(params.filters.as_deref());

    tracing::info!(
        q = ?params.q,
        filters = ?params.filters,
        page,
        page_size,
        sort = sort.as_str(),
        "search requested"
    );

    let result = search_products(&db, params.q.as_deref(), &filters, page, page_size, sort).await;
    Ok(catalog_response(result, "search"))
}

/// Product detail with attributes, images and all offers
pub async fn get_product(path: web::Path<String>, db: web::Data<Db>) -> Result<HttpResponse> {
    let Ok(product_id) = Uuid::parse_str(&path.into_inner()) else {
        // a non-UUID id can't exist in the catalog
        return Ok(catalog_response::<()>(
            Err(CatalogError::NotFound("product")),
            "product_detail",
        ));
    };

    let result = load_product_detail(&db, product_id).await;
    Ok(catalog_response(result, "product_detail"))
}

/// Provider summary lookup
pub async fn get_provider(path: web::Path<String>, db: web::Data<Db>) -> Result<HttpResponse> {
    let Ok(provider_id) = Uuid::parse_str(&path.into_inner()) else {
        return Ok(catalog_response::<()>(
            Err(CatalogError::NotFound("provider")),
            "provider",
        ));
    };

    let result = load_provider(&db, provider_id).await;
    Ok(catalog_response(result, "provider"))
}

/// Paginated list of one provider's own offers
pub async fn list_provider_offerings(
    path: web::Path<String>,
    params: web::Query<PageParams>,
    db: web::Data<Db>,
    config: web::Data<ApiConfig>,
) -> Result<HttpResponse> {
    let Ok(provider_id) = Uuid::parse_str(&path.into_inner()) else {
        return Ok(catalog_response::<()>(
            Err(CatalogError::NotFound("provider")),
            "provider_offerings",
        ));
    };

    let page = params.page.unwrap_or(0);
    if page < 0 {
        return Ok(bad_request("page must be >= 0"));
    }
    let page_size = params.page_size.unwrap_or(config.default_page_size);
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Ok(bad_request(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    let result = load_provider_offerings(&db, provider_id, page, page_size).await;
    Ok(catalog_response(result, "provider_offerings"))
}

/// Cross-provider price comparison for a SKU. An unknown SKU is a normal
/// empty result, not a 404.
pub async fn compare_by_sku(
    params: web::Query<CompareParams>,
    db: web::Data<Db>,
) -> Result<HttpResponse> {
    let sku = params.into_inner().sku;
    let result = compare_offers(&db, &sku)
        .await
        .map(|offers| CompareResponse { sku, offers });
    Ok(catalog_response(result, "compare"))
}
