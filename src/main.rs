use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use orgtree_api::database::{schema, DatabaseManager};
use orgtree_api::handlers::{groups, hierarchy, users};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, APP_ENV, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = orgtree_api::config::config();
    tracing::info!("Starting orgtree API in {:?} mode", config.environment);

    // Apply the schema up front; a failure here is logged, not fatal, so the
    // process still serves /health against a recovering database.
    match DatabaseManager::pool().await {
        Ok(pool) => {
            if let Err(e) = schema::ensure_schema(&pool).await {
                tracing::error!("Error initializing database schema: {}", e);
            }
        }
        Err(e) => tracing::error!("Database unavailable at startup: {}", e),
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("ORGTREE_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 orgtree API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(hierarchy_routes())
        .merge(user_routes())
        .merge(group_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn hierarchy_routes() -> Router {
    Router::new()
        // Full hierarchical dump of the group/user forest
        .route("/all", get(hierarchy::all))
        // Breadcrumb of groups above a user
        .route("/users/:id/groups", get(hierarchy::user_groups))
        // All users under a group and its descendants, with optional filters
        .route("/groups/:id/users", get(hierarchy::group_users))
}

fn user_routes() -> Router {
    use axum::routing::patch;

    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:id",
            get(users::get).put(users::update).delete(users::delete),
        )
        // Add/move user to group
        .route("/users/:id/groups/:group_id", patch(users::move_to_group))
}

fn group_routes() -> Router {
    use axum::routing::patch;

    Router::new()
        .route("/groups", get(groups::list).post(groups::create))
        .route(
            "/groups/:id",
            get(groups::get).put(groups::update).delete(groups::delete),
        )
        // Add/move group under a parent group
        .route("/groups/:id/groups/:parent_id", patch(groups::move_to_parent))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "orgtree API",
        "version": version,
        "description": "Hierarchical user/group directory API",
        "endpoints": {
            "hierarchy": "/all, /users/:id/groups, /groups/:id/users?jobTitle=&firstName=",
            "users": "/users, /users/:id",
            "groups": "/groups, /groups/:id",
            "moves": "PATCH /users/:id/groups/:groupId, PATCH /groups/:id/groups/:parentId",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
