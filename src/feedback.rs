use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::{AppError, AppResult, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show))
        .route("/{vote}", post(vote))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub likes: i64,
    pub dislikes: i64,
    pub last_updated: String,
}

#[debug_handler]
async fn show(State(db_pool): State<SqlitePool>) -> AppResult<Json<Feedback>> {
    ensure_row(&db_pool).await?;
    Ok(Json(load(&db_pool).await?))
}

#[debug_handler]
async fn vote(
    State(db_pool): State<SqlitePool>,
    Path(kind): Path<String>,
) -> AppResult<Json<Feedback>> {
    let Some(sql) = vote_sql(&kind) else {
        return Err(AppError::Validation(format!("unknown vote type: {kind}")));
    };

    ensure_row(&db_pool).await?;
    sqlx::query(sql)
        .bind(OffsetDateTime::now_utc().format(&Rfc3339)?)
        .execute(&db_pool)
        .await?;

    Ok(Json(load(&db_pool).await?))
}

/// The vote kind picks a fixed statement; nothing caller-controlled reaches
/// the SQL text.
fn vote_sql(kind: &str) -> Option<&'static str> {
    match kind {
        "like" => Some("UPDATE feedback SET likes = likes + 1, last_updated = ? WHERE id = 1"),
        "dislike" => {
            Some("UPDATE feedback SET dislikes = dislikes + 1, last_updated = ? WHERE id = 1")
        }
        _ => None,
    }
}

async fn ensure_row(pool: &SqlitePool) -> AppResult<()> {
    sqlx::query("INSERT OR IGNORE INTO feedback (id, likes, dislikes, last_updated) VALUES (1, 0, 0, ?)")
        .bind(OffsetDateTime::now_utc().format(&Rfc3339)?)
        .execute(pool)
        .await?;
    Ok(())
}

async fn load(pool: &SqlitePool) -> AppResult<Feedback> {
    let (likes, dislikes, last_updated): (i64, i64, String) =
        sqlx::query_as("SELECT likes, dislikes, last_updated FROM feedback WHERE id = 1")
            .fetch_one(pool)
            .await?;
    Ok(Feedback {
        likes,
        dislikes,
        last_updated,
    })
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    #[test]
    fn only_like_and_dislike_are_votes() {
        assert!(vote_sql("like").is_some());
        assert!(vote_sql("dislike").is_some());
        assert!(vote_sql("upvote").is_none());
        assert!(vote_sql("").is_none());
    }

    #[tokio::test]
    async fn counters_start_at_zero_and_increment() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init(&pool).await.unwrap();

        ensure_row(&pool).await.unwrap();
        let fb = load(&pool).await.unwrap();
        assert_eq!((fb.likes, fb.dislikes), (0, 0));

        sqlx::query(vote_sql("like").unwrap())
            .bind("2026-01-01T00:00:00Z")
            .execute(&pool)
            .await
            .unwrap();
        let fb = load(&pool).await.unwrap();
        assert_eq!((fb.likes, fb.dislikes), (1, 0));
    }
}
