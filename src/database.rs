use crate::error::ApiError;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

pub type DatabasePool = Pool<Postgres>;

pub async fn create_connection_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<DatabasePool, ApiError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

pub async fn health_check(pool: &DatabasePool) -> Result<(), ApiError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

pub async fn run_migrations(pool: &DatabasePool) -> Result<(), ApiError> {
    tracing::info!("Running database migrations...");

    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => {
            tracing::info!("Database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Database migration failed: {}", e);
            Err(ApiError::Migration(e))
        }
    }
}
