use std::collections::HashMap;

use sqlx::SqlitePool;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::bots::is_bot;
use crate::directory::{ProfilePatch, store};
use crate::{AppResult, DEFAULT_COLOR};

/// One live chat event as handed over by the chat transport.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub channel: String,
    /// Stable platform id of the sender; events without one are dropped.
    pub user_id: Option<String>,
    pub username: String,
    pub display_name: Option<String>,
    pub color: Option<String>,
    pub badges: Option<HashMap<String, String>>,
    pub text: String,
    /// Set on echoes of our own output.
    pub is_self: bool,
}

/// Spawns the ingest task and returns the sender the chat transport feeds.
pub fn spawn(db_pool: SqlitePool) -> mpsc::Sender<ChatEvent> {
    let (tx, rx) = mpsc::channel(256);
    tokio::spawn(run(rx, db_pool));
    tx
}

/// Drains the event stream for the life of the process. One bad event must
/// not stop ingestion of the ones behind it, so failures are logged here
/// and dropped.
pub async fn run(mut rx: mpsc::Receiver<ChatEvent>, db_pool: SqlitePool) {
    info!("chat ingest running");

    while let Some(event) = rx.recv().await {
        let username = event.username.clone();
        if let Err(err) = ingest_event(&db_pool, event).await {
            warn!("failed to record chatter {username}: {err}");
        }
    }

    info!("chat event stream closed, ingest stopping");
}

/// Classifies one event and upserts the sender into the directory. Returns
/// whether the event survived to the upsert.
pub async fn ingest_event(pool: &SqlitePool, event: ChatEvent) -> AppResult<bool> {
    if event.is_self {
        return Ok(false);
    }
    let Some(user_id) = event.user_id else {
        return Ok(false);
    };
    if is_bot(&event.username) {
        return Ok(false);
    }

    let patch = ProfilePatch {
        username: event.username.to_lowercase(),
        display_name: event.display_name.unwrap_or_else(|| event.username.clone()),
        color: event.color.unwrap_or_else(|| DEFAULT_COLOR.to_owned()),
        badges: event.badges.unwrap_or_default(),
        last_seen: OffsetDateTime::now_utc(),
    };

    store::upsert(pool, &user_id, patch).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;
    use crate::directory::store::{count, find_by_handle};

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init(&pool).await.unwrap();
        pool
    }

    fn event(username: &str) -> ChatEvent {
        ChatEvent {
            channel: "zoil".to_owned(),
            user_id: Some("101".to_owned()),
            username: username.to_owned(),
            display_name: None,
            color: None,
            badges: None,
            text: "hello".to_owned(),
            is_self: false,
        }
    }

    #[tokio::test]
    async fn self_events_are_dropped() {
        let pool = test_pool().await;
        let ev = ChatEvent {
            is_self: true,
            ..event("Alice")
        };

        assert!(!ingest_event(&pool, ev).await.unwrap());
        assert_eq!(count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn events_without_a_stable_id_are_dropped() {
        let pool = test_pool().await;
        let ev = ChatEvent {
            user_id: None,
            ..event("Alice")
        };

        assert!(!ingest_event(&pool, ev).await.unwrap());
        assert_eq!(count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn bot_senders_are_dropped() {
        let pool = test_pool().await;

        assert!(!ingest_event(&pool, event("Nightbot")).await.unwrap());
        assert!(!ingest_event(&pool, event("some_bot_acct")).await.unwrap());
        assert_eq!(count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_attributes_fall_back() {
        let pool = test_pool().await;

        assert!(ingest_event(&pool, event("Alice")).await.unwrap());

        let profile = find_by_handle(&pool, "alice").await.unwrap().unwrap();
        assert_eq!(profile.display_name, "Alice");
        assert_eq!(profile.color, DEFAULT_COLOR);
        assert!(profile.badges.is_empty());
        assert_eq!(profile.message_count, 1);
    }

    #[tokio::test]
    async fn ingesting_twice_counts_twice_with_one_profile() {
        let pool = test_pool().await;

        ingest_event(&pool, event("Alice")).await.unwrap();
        ingest_event(&pool, event("Alice")).await.unwrap();

        assert_eq!(count(&pool).await.unwrap(), 1);
        let profile = find_by_handle(&pool, "alice").await.unwrap().unwrap();
        assert_eq!(profile.message_count, 2);
    }
}
