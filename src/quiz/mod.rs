pub mod assemble;
pub mod routes;
pub mod store;

use axum::{
    Json, Router, debug_handler,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::logs::DATE_FORMAT;
use crate::{AppError, AppResult, AppState};

pub use self::assemble::{ClientQuestion, assemble, decode_token};
pub use self::store::{QuestionCandidate, Quiz};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/quiz", post(routes::create))
        .route("/api/quizzes", get(routes::list))
        .route(
            "/api/quiz/{uuid}",
            get(routes::get_one).delete(routes::delete_one),
        )
        .route("/api/quiz/{uuid}/toggle", post(routes::toggle))
        .route("/daily", get(daily))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DailyChallenge {
    date: String,
    quiz_title: String,
    questions: Vec<ClientQuestion>,
}

/// Serves the published quiz with freshly shuffled options. Nothing about
/// the round is kept server-side; the answer token is all the client needs.
#[debug_handler]
async fn daily(State(db_pool): State<SqlitePool>) -> AppResult<Json<DailyChallenge>> {
    let Some(quiz) = store::active(&db_pool).await? else {
        return Err(AppError::NotFound("active quiz"));
    };
    if quiz.questions.is_empty() {
        return Err(AppError::NotFound("active quiz"));
    }

    let mut rng = rand::rng();
    let questions = quiz
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| assemble(format!("{}:{i}", quiz.uuid), q, &mut rng))
        .collect();

    Ok(Json(DailyChallenge {
        date: OffsetDateTime::now_utc().date().format(DATE_FORMAT)?,
        quiz_title: quiz.title,
        questions,
    }))
}
