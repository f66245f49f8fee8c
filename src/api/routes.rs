// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        // Catalog search
        .route("/search", web::get().to(handlers::search_catalog))
        // Cross-provider comparison by SKU
        .route("/compare", web::get().to(handlers::compare_by_sku))
        // Products
        .route("/products/{product_id}", web::get().to(handlers::get_product))
        // Providers
        .route("/providers/{provider_id}", web::get().to(handlers::get_provider))
        .route(
            "/providers/{provider_id}/offerings",
            web::get().to(handlers::list_provider_offerings),
        );
}
