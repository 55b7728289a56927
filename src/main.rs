//! Bootstrap binary: prepares the database and seeds reference data.

use dotenvy::dotenv;
use recipe_box::{
    config::{database, settings},
    core::catalog,
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(
        database_url = %app_config.database_url,
        tags = app_config.tags.len(),
        "Configuration loaded"
    );

    // 4. Connect and make sure the schema exists
    let db = database::create_connection(&app_config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed reference data
    let ingredients = catalog::seed_ingredients_from_file(&db, &app_config.ingredients_path)
        .await
        .inspect_err(|e| {
            error!(
                "Failed to seed ingredients from {}: {}",
                app_config.ingredients_path, e
            );
        })?;
    let tags = catalog::seed_tags(&db, &app_config.tags)
        .await
        .inspect_err(|e| error!("Failed to seed tags: {}", e))?;

    info!(ingredients, tags, "Recipe database ready");
    Ok(())
}
