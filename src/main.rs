use anyhow::Result;
use rutinas_api::api::routes::create_routes;
use rutinas_api::config::{run_migrations, AppConfig, DatabaseConfig};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let app_config = AppConfig::from_env()?;
    let db_config = DatabaseConfig::from_env()?;

    let pool = db_config.create_pool().await?;
    run_migrations(&pool).await?;
    info!("database ready, migrations applied");

    let app = create_routes(pool);

    let listener = TcpListener::bind(app_config.server_address()).await?;
    info!("rutinas-api listening on http://{}", app_config.server_address());

    axum::serve(listener, app).await?;

    Ok(())
}
