use axum::{Json, debug_handler, extract::State};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{AppResult, directory, quiz};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_chatters: i64,
    pub total_quizzes: i64,
    pub active_quiz: Option<String>,
}

#[debug_handler]
pub async fn stats(State(db_pool): State<SqlitePool>) -> AppResult<Json<Stats>> {
    Ok(Json(Stats {
        total_chatters: directory::store::count(&db_pool).await?,
        total_quizzes: quiz::store::count(&db_pool).await?,
        active_quiz: quiz::store::active(&db_pool).await?.map(|q| q.title),
    }))
}
