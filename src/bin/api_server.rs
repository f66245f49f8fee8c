// HTTP API server binary for catalog-compare

use anyhow::Result;
use catalog_compare::api::ApiServer;
use catalog_compare::database_ops::db::Db;
use catalog_compare::util::env as env_util;

#[actix_web::main]
async fn main() -> Result<()> {
    catalog_compare::tracing::init_tracing("info,sqlx=warn")?;

    tracing::info!("Initializing catalog-compare API server");

    // Load dotenv/env once (safe to call multiple times)
    env_util::init_env();

    // Load configuration from environment
    let server = ApiServer::from_env()?;

    // Initialize database connection
    let database_url = env_util::db_url()?;
    let max_connections = env_util::env_parse("DATABASE_MAX_CONNECTIONS", 10u32);
    let db = Db::connect(&database_url, max_connections).await?;

    server.run(db).await
}
