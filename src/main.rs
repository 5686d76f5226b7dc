use std::sync::Arc;

use axum::{Router, routing::get};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
use whosaidit::{AppState, Config, badges, db, directory, feedback, ingest, logs, quiz, stats};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Arc::new(Config::load());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&config.database_url)
        .await
        .unwrap();
    db::init(&db_pool).await.unwrap();

    // The chat transport pushes live events into this sender; ingestion
    // runs on its own task and never blocks request handling.
    let chat_events = ingest::spawn(db_pool.clone());

    let app_state = AppState {
        db_pool,
        http: reqwest::Client::new(),
        badges: badges::BadgeCache::default(),
        config: config.clone(),
        chat_events,
    };

    let app = Router::new()
        .merge(directory::router())
        .merge(quiz::router())
        .nest("/api/logs", logs::router())
        .nest("/api/feedback", feedback::router())
        .route("/badges-mapping", get(badges::mapping))
        .route("/api/stats", get(stats::stats))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let address = format!("0.0.0.0:{}", config.port);
    info!("listening on {address}");

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
