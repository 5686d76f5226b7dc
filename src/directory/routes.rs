use std::collections::HashMap;

use axum::{
    Json, debug_handler,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{AppError, AppResult};

use super::store;

/// Directory entry as sent to the quiz builder: display name up front,
/// handle kept for exclusion bookkeeping.
#[derive(Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub color: String,
    pub badges: HashMap<String, String>,
    pub username: String,
}

impl From<store::Profile> for DirectoryEntry {
    fn from(profile: store::Profile) -> Self {
        Self {
            name: profile.display_name,
            color: profile.color,
            badges: profile.badges,
            username: profile.username,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct RandomQuery {
    count: Option<usize>,
    exclude: Option<String>,
}

/// Random decoy candidates, excluding one handle (usually the true sender).
#[debug_handler]
pub(crate) async fn random(
    State(db_pool): State<SqlitePool>,
    Query(RandomQuery { count, exclude }): Query<RandomQuery>,
) -> AppResult<Json<Vec<DirectoryEntry>>> {
    let excluded: Vec<String> = exclude.into_iter().map(|e| e.to_lowercase()).collect();

    let sample = store::sample_excluding(&db_pool, &excluded, count.unwrap_or(3)).await?;
    Ok(Json(sample.into_iter().map(DirectoryEntry::from).collect()))
}

#[derive(Deserialize)]
pub(crate) struct SearchQuery {
    query: Option<String>,
}

#[debug_handler]
pub(crate) async fn search(
    State(db_pool): State<SqlitePool>,
    Query(SearchQuery { query }): Query<SearchQuery>,
) -> AppResult<Json<Vec<DirectoryEntry>>> {
    let Some(query) = query else {
        return Ok(Json(Vec::new()));
    };

    let hits = store::search_handles(&db_pool, &query, &[], 10).await?;
    Ok(Json(hits.into_iter().map(DirectoryEntry::from).collect()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    pub username: String,
    pub display_name: String,
    pub color: String,
    pub badges: HashMap<String, String>,
}

#[debug_handler]
pub(crate) async fn user_detail(
    State(db_pool): State<SqlitePool>,
    Path(username): Path<String>,
) -> AppResult<Json<UserDetail>> {
    let Some(profile) = store::find_by_handle(&db_pool, &username).await? else {
        return Err(AppError::NotFound("user"));
    };

    Ok(Json(UserDetail {
        username: profile.username,
        display_name: profile.display_name,
        color: profile.color,
        badges: profile.badges,
    }))
}
