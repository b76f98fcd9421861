use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::from_extractor,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use propval_api::api::handlers::{
    assist as assist_handlers, auth as auth_handlers, config, drafts, history, reports, templates,
};
use propval_api::api::middleware::auth::AdminAuth;
use propval_api::assist::AssistClient;
use propval_api::infrastructure::geocode::Geocoder;
use propval_api::infrastructure::object_store::GcsObjectStore;
use propval_api::state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let bucket = std::env::var("GCS_BUCKET").unwrap_or_else(|_| {
        tracing::warn!("GCS_BUCKET not set, using default");
        "propval-dev".to_string()
    });

    // Build shared state; external-service clients are constructed once
    // here and injected everywhere
    let store = Arc::new(GcsObjectStore::new(bucket));
    let geocoder = Arc::new(Geocoder::new(std::env::var("GEOCODING_API_KEY").ok()));
    let assist_client = Arc::new(AssistClient::new(std::env::var("GEMINI_API_KEY").ok()));
    let state = AppState::new(store, geocoder, assist_client);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Everything except login and the health check sits behind the admin
    // session token
    let protected = Router::new()
        // Draft routes
        .route("/api/drafts", get(drafts::list_drafts))
        .route("/api/drafts", post(drafts::save_draft))
        .route("/api/drafts/:id", get(drafts::get_draft))
        .route("/api/drafts/:id", delete(drafts::delete_draft))
        // History routes
        .route("/api/history", get(history::list_history))
        .route("/api/history/:id", delete(history::delete_history))
        // Template and image routes
        .route("/api/templates", get(templates::list_templates))
        .route("/api/templates", post(templates::upload_template))
        .route("/api/templates/:name", delete(templates::delete_template))
        .route("/api/images", post(templates::upload_image))
        // Configuration routes
        .route("/api/config/ai", get(config::get_ai_config).put(config::put_ai_config))
        .route(
            "/api/config/image-options",
            get(config::get_image_options).put(config::put_image_options),
        )
        .route(
            "/api/config/:collection",
            get(config::get_cards).put(config::put_cards),
        )
        // Report generation
        .route("/api/reports", post(reports::generate_report))
        // Assist routes
        .route("/api/assist/commentary", post(assist_handlers::draft_commentary))
        .route("/api/assist/rewrite", post(assist_handlers::rewrite))
        .route_layer(from_extractor::<AdminAuth>());

    // Build router
    let app = Router::new()
        .route("/health", get(auth_handlers::health_check))
        .route("/api/auth/login", post(auth_handlers::login))
        .merge(protected)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state);

    // Start server
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000u16);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
