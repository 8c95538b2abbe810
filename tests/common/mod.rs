#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use grc_backend::{config, database::DatabasePool, router::build_router, AppState};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

/// Seeded NIST CSF 2.0 framework id.
pub const NIST_CSF_ID: &str = "6f1c2a9e-0000-4000-8000-000000000001";

fn test_settings(api_keys: Vec<String>) -> config::Settings {
    let mut settings =
        config::Settings::new_with_env_file(false).expect("Failed to create test config");
    settings.api_keys = api_keys;
    settings.cors_allow_origins = vec!["*".to_string()];
    settings
}

/// Router over a pool that never connects; for paths rejected before any query.
pub async fn create_offline_app(api_keys: Vec<String>) -> Router {
    let settings = test_settings(api_keys);
    let pool = PgPoolOptions::new()
        .connect_lazy(&settings.database_url)
        .expect("Failed to create lazy pool");

    let app_state = AppState::new_with_pool(settings, pool)
        .await
        .expect("Failed to create test app state");
    build_router(app_state)
}

/// Router over a migrated database, or `None` when DATABASE_URL is unset.
pub async fn create_database_app() -> Option<(Router, DatabasePool)> {
    let db_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping database-backed test");
            return None;
        }
    };

    let mut settings = test_settings(Vec::new());
    settings.database_url = db_url.clone();

    let pool = grc_backend::database::create_connection_pool(&db_url, 5)
        .await
        .expect("Failed to create database pool");

    let app_state = AppState::new_with_pool(settings, pool.clone())
        .await
        .expect("Failed to create test app state");

    Some((build_router(app_state), pool))
}

pub struct Identity {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: &'static str,
}

impl Identity {
    pub fn new(organization_id: Uuid, role: &'static str) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            organization_id,
            role,
        }
    }
}

pub async fn seed_organization(pool: &DatabasePool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO organizations (id, name) VALUES ($1, $2)")
        .bind(id)
        .bind(format!("Org {}", id.simple()))
        .execute(pool)
        .await
        .expect("Failed to seed organization");
    id
}

/// Insert the identity as a user row so foreign keys and membership checks hold.
pub async fn seed_user(pool: &DatabasePool, identity: &Identity) {
    sqlx::query(
        "INSERT INTO users (id, organization_id, email, role) VALUES ($1, $2, $3, $4::user_role)",
    )
    .bind(identity.user_id)
    .bind(identity.organization_id)
    .bind(format!("{}@example.org", identity.user_id.simple()))
    .bind(identity.role)
    .execute(pool)
    .await
    .expect("Failed to seed user");
}

pub fn request(
    method: Method,
    uri: &str,
    identity: Option<&Identity>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(identity) = identity {
        builder = builder
            .header("x-user-id", identity.user_id.to_string())
            .header("x-organization-id", identity.organization_id.to_string())
            .header("x-user-role", identity.role);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Helper to extract response body as JSON
pub async fn extract_json(response: axum::response::Response) -> Value {
    use axum::body::to_bytes;
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}
