use axum::{
    Json, debug_handler,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppError, AppResult};

use super::store::{self, QuestionCandidate, Quiz};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateQuiz {
    title: Option<String>,
    description: Option<String>,
    emote_url: Option<String>,
    questions: Option<Vec<QuestionCandidate>>,
}

#[debug_handler]
pub(crate) async fn create(
    State(db_pool): State<SqlitePool>,
    Json(body): Json<CreateQuiz>,
) -> AppResult<Json<Quiz>> {
    let (Some(title), Some(questions)) = (body.title, body.questions) else {
        return Err(AppError::Validation(
            "title and questions are required".to_owned(),
        ));
    };
    if title.is_empty() || questions.is_empty() {
        return Err(AppError::Validation(
            "title and questions are required".to_owned(),
        ));
    }

    for question in &questions {
        if question.distractors.is_empty() {
            return Err(AppError::Validation(
                "every question needs at least one distractor".to_owned(),
            ));
        }
        if question
            .distractors
            .iter()
            .any(|d| d.name == question.sender.name)
        {
            return Err(AppError::Validation(
                "distractors must not include the sender".to_owned(),
            ));
        }
    }

    let quiz = store::create(
        &db_pool,
        title,
        body.description,
        body.emote_url,
        questions,
    )
    .await?;
    Ok(Json(quiz))
}

#[derive(Deserialize)]
pub(crate) struct ListQuery {
    public: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuizSummary {
    uuid: Uuid,
    title: String,
    description: Option<String>,
    emote_url: Option<String>,
    created_at: String,
    is_active: bool,
    question_count: usize,
}

#[debug_handler]
pub(crate) async fn list(
    State(db_pool): State<SqlitePool>,
    Query(ListQuery { public }): Query<ListQuery>,
) -> AppResult<Json<Vec<QuizSummary>>> {
    let quizzes = store::list(&db_pool, public.unwrap_or(false)).await?;

    Ok(Json(
        quizzes
            .into_iter()
            .map(|q| QuizSummary {
                uuid: q.uuid,
                title: q.title,
                description: q.description,
                emote_url: q.emote_url,
                created_at: q.created_at,
                is_active: q.is_active,
                question_count: q.questions.len(),
            })
            .collect(),
    ))
}

#[debug_handler]
pub(crate) async fn get_one(
    State(db_pool): State<SqlitePool>,
    Path(uuid): Path<Uuid>,
) -> AppResult<Json<Quiz>> {
    let Some(quiz) = store::get(&db_pool, uuid).await? else {
        return Err(AppError::NotFound("quiz"));
    };
    Ok(Json(quiz))
}

#[debug_handler]
pub(crate) async fn toggle(
    State(db_pool): State<SqlitePool>,
    Path(uuid): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let Some(quiz) = store::toggle(&db_pool, uuid).await? else {
        return Err(AppError::NotFound("quiz"));
    };
    Ok(Json(json!({ "success": true, "quiz": quiz })))
}

#[debug_handler]
pub(crate) async fn delete_one(
    State(db_pool): State<SqlitePool>,
    Path(uuid): Path<Uuid>,
) -> AppResult<Json<Value>> {
    store::delete(&db_pool, uuid).await?;
    Ok(Json(json!({ "success": true })))
}
