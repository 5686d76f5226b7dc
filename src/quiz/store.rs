use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::{AppResult, Persona};

/// One quiz question as stored: the message, who really sent it, and the
/// decoys shown alongside. Provenance is kept for the builder but never
/// leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionCandidate {
    pub message: String,
    pub sender: Persona,
    #[serde(default)]
    pub distractors: Vec<Persona>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub uuid: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub emote_url: Option<String>,
    pub questions: Vec<QuestionCandidate>,
    pub is_active: bool,
    pub created_at: String,
}

const QUIZ_COLS: &str = "uuid,title,description,emote_url,questions,is_active,created_at";

type QuizRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    bool,
    String,
);

fn from_row(row: QuizRow) -> AppResult<Quiz> {
    let (uuid, title, description, emote_url, questions, is_active, created_at) = row;
    Ok(Quiz {
        uuid: Uuid::parse_str(&uuid).map_err(anyhow::Error::from)?,
        title,
        description,
        emote_url,
        questions: serde_json::from_str(&questions)?,
        is_active,
        created_at,
    })
}

pub async fn create(
    pool: &SqlitePool,
    title: String,
    description: Option<String>,
    emote_url: Option<String>,
    questions: Vec<QuestionCandidate>,
) -> AppResult<Quiz> {
    let quiz = Quiz {
        uuid: Uuid::now_v7(),
        title,
        description,
        emote_url,
        questions,
        is_active: false,
        created_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
    };

    sqlx::query(
        "INSERT INTO quizzes (uuid,title,description,emote_url,questions,is_active,created_at)
         VALUES (?,?,?,?,?,?,?)",
    )
    .bind(quiz.uuid.to_string())
    .bind(&quiz.title)
    .bind(&quiz.description)
    .bind(&quiz.emote_url)
    .bind(serde_json::to_string(&quiz.questions)?)
    .bind(quiz.is_active)
    .bind(&quiz.created_at)
    .execute(pool)
    .await?;

    Ok(quiz)
}

/// Newest first; `public_only` keeps just published quizzes.
pub async fn list(pool: &SqlitePool, public_only: bool) -> AppResult<Vec<Quiz>> {
    let sql = if public_only {
        format!("SELECT {QUIZ_COLS} FROM quizzes WHERE is_active = 1 ORDER BY created_at DESC")
    } else {
        format!("SELECT {QUIZ_COLS} FROM quizzes ORDER BY created_at DESC")
    };

    let rows: Vec<QuizRow> = sqlx::query_as(&sql).fetch_all(pool).await?;
    rows.into_iter().map(from_row).collect()
}

pub async fn get(pool: &SqlitePool, uuid: Uuid) -> AppResult<Option<Quiz>> {
    let row: Option<QuizRow> =
        sqlx::query_as(&format!("SELECT {QUIZ_COLS} FROM quizzes WHERE uuid = ?"))
            .bind(uuid.to_string())
            .fetch_optional(pool)
            .await?;

    row.map(from_row).transpose()
}

/// Flips the published flag; `None` if the quiz does not exist.
pub async fn toggle(pool: &SqlitePool, uuid: Uuid) -> AppResult<Option<Quiz>> {
    let changed = sqlx::query("UPDATE quizzes SET is_active = NOT is_active WHERE uuid = ?")
        .bind(uuid.to_string())
        .execute(pool)
        .await?
        .rows_affected();

    if changed == 0 {
        return Ok(None);
    }
    get(pool, uuid).await
}

pub async fn delete(pool: &SqlitePool, uuid: Uuid) -> AppResult<()> {
    sqlx::query("DELETE FROM quizzes WHERE uuid = ?")
        .bind(uuid.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// The quiz currently served by `/daily`, if any is published.
pub async fn active(pool: &SqlitePool) -> AppResult<Option<Quiz>> {
    let row: Option<QuizRow> = sqlx::query_as(&format!(
        "SELECT {QUIZ_COLS} FROM quizzes WHERE is_active = 1 ORDER BY created_at DESC LIMIT 1"
    ))
    .fetch_optional(pool)
    .await?;

    row.map(from_row).transpose()
}

pub async fn count(pool: &SqlitePool) -> AppResult<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quizzes")
        .fetch_one(pool)
        .await?;
    Ok(n)
}
