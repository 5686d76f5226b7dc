pub mod badges;
pub mod bots;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod feedback;
pub mod ingest;
pub mod logs;
pub mod quiz;
pub mod stats;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::mpsc;

pub use config::Config;
pub use error::{AppError, AppResult};

/// Fallback display color when an event or record carries none.
pub const DEFAULT_COLOR: &str = "#9146FF";

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub http: reqwest::Client,
    pub badges: badges::BadgeCache,
    pub config: Arc<Config>,
    /// Attachment point for the chat transport; whatever speaks to the
    /// chat platform pushes events here and the ingest task drains them.
    pub chat_events: mpsc::Sender<ingest::ChatEvent>,
}

/// The client-safe shape of a chat participant: what a quiz option, a log
/// record's sender, and a directory sample all look like on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub badges: HashMap<String, String>,
}

pub fn default_color() -> String {
    DEFAULT_COLOR.to_owned()
}
