use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use common::database::{DatabaseConfig, init_pool};

use api::{
    repositories::{
        CatalogRepository, GiftRepository, InventoryRepository, LedgerRepository,
        MessageRepository, UserRepository,
    },
    routes, seed,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Run pending migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Initialize repositories
    let user_repository = UserRepository::new(pool.clone());
    let catalog_repository = CatalogRepository::new(pool.clone());
    let inventory_repository = InventoryRepository::new(pool.clone());
    let ledger_repository = LedgerRepository::new(pool.clone());
    let gift_repository = GiftRepository::new(pool.clone());
    let message_repository = MessageRepository::new(pool.clone());

    // Seed the character catalog; existing rows are left untouched
    seed::seed_catalog(&catalog_repository).await?;

    info!("API service initialized successfully");

    let app_state = AppState {
        db_pool: pool,
        user_repository,
        catalog_repository,
        inventory_repository,
        ledger_repository,
        gift_repository,
        message_repository,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
    info!("API service listening on 0.0.0.0:3001");

    axum::serve(listener, app).await?;

    Ok(())
}
