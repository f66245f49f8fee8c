// API server implementation using actix-web

use crate::api::{middleware, routes};
use crate::database_ops::db::Db;
use crate::util::env as env_util;
use actix_web::{web, App, HttpServer};
use anyhow::{ensure, Context, Result};

use super::handlers::MAX_PAGE_SIZE;

/// Per-request defaults handed to handlers via app data; no process-wide
/// mutable settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub default_page_size: i64,
}

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
    pub default_page_size: i64,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        env_util::init_env();

        let host = env_util::env_opt("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = env_util::env_opt("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .context("Invalid API_PORT")?;

        let allowed_origins =
            env_util::env_opt("ALLOWED_ORIGINS").unwrap_or_else(|| "*".to_string());

        let default_page_size: i64 = env_util::env_parse("PAGE_SIZE", 20);
        ensure!(
            (1..=MAX_PAGE_SIZE).contains(&default_page_size),
            "PAGE_SIZE must be between 1 and {MAX_PAGE_SIZE}"
        );

        Ok(Self {
            host,
            port,
            allowed_origins,
            default_page_size,
        })
    }

    /// Start the HTTP server
    pub async fn run(self, db: Db) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            "Starting catalog-compare API server"
        );

        let db_data = web::Data::new(db);
        let config_data = web::Data::new(ApiConfig {
            default_page_size: self.default_page_size,
        });
        let allowed_origins = self.allowed_origins.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(db_data.clone())
                .app_data(config_data.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
