// This is the entry point of the What-If moderation backend.
//
// **Architecture Overview:**
// - `core/` = Business logic (transport-agnostic)
// - `infra/` = Implementations of core traits (SQLite, in-memory)
// - `api/` = HTTP adapters (axum routes)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Serve the HTTP API

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "api/api_layer.rs"]
mod api;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::sync::Arc;

use crate::api::moderation::ApiState;
use crate::core::moderation::ModerationService;
use crate::infra::moderation::SqliteFilterStore;

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    if admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set; PUT /filters is disabled");
    }

    // Keep the runtime database in a dedicated folder so the repo root stays tidy.
    let data_dir = "data";
    std::fs::create_dir_all(data_dir).expect("Failed to create data directory for SQLite files");
    let filter_db_path = format!("{}/moderation.db", data_dir);

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    // Create the SQLite-backed filter store
    let filter_store = SqliteFilterStore::new(&filter_db_path)
        .await
        .expect("Failed to initialize SQLite filter store");

    // Create the moderation service with the store injected and wrap in Arc
    let moderation_service = Arc::new(ModerationService::new(filter_store));

    // ========================================================================
    // HTTP SERVER SETUP
    // ========================================================================

    let state = ApiState::new(Arc::clone(&moderation_service), admin_token);
    let router = api::moderation::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listen address");
    tracing::info!("moderation service listening on {bind_addr}");

    axum::serve(listener, router).await.expect("Server error");
}
