pub mod fetch;
pub mod parse;
pub mod search;

use axum::{Json, Router, debug_handler, extract::Query, extract::State, routing::get};
use serde::Deserialize;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::{AppError, AppResult, AppState};

use self::fetch::HttpLogSource;
use self::search::{
    DEFAULT_RECENT_LIMIT, DEFAULT_SEARCH_LIMIT, SearchOutcome, enumerate_days, fetch_days,
    filter_and_sort, into_outcome,
};

pub static DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recent", get(recent))
        .route("/search", get(search_range))
}

#[derive(Deserialize)]
struct SearchQuery {
    from: Option<String>,
    to: Option<String>,
    q: Option<String>,
    user: Option<String>,
    limit: Option<usize>,
}

#[debug_handler]
async fn search_range(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchOutcome>> {
    let (Some(from), Some(to)) = (params.from, params.to) else {
        return Err(AppError::Validation(
            "from and to dates are required (YYYY-MM-DD)".to_owned(),
        ));
    };

    let from = parse_date(&from)?;
    let to = parse_date(&to)?;
    let days = enumerate_days(from, to)?;

    let source = HttpLogSource::new(state.http.clone(), &state.config);
    let (records, days_searched) = fetch_days(&source, &days).await;

    let records = filter_and_sort(records, params.q.as_deref(), params.user.as_deref());
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

    Ok(Json(into_outcome(records, days_searched, limit)?))
}

/// Today's log only, for the quiz builder.
#[debug_handler]
async fn recent(State(state): State<AppState>) -> AppResult<Json<SearchOutcome>> {
    let today = OffsetDateTime::now_utc().date();

    let source = HttpLogSource::new(state.http.clone(), &state.config);
    let (records, days_searched) = fetch_days(&source, &[today]).await;

    let records = filter_and_sort(records, None, None);
    Ok(Json(into_outcome(
        records,
        days_searched,
        DEFAULT_RECENT_LIMIT,
    )?))
}

fn parse_date(raw: &str) -> AppResult<Date> {
    Date::parse(raw, DATE_FORMAT)
        .map_err(|_| AppError::Validation("invalid date format, use YYYY-MM-DD".to_owned()))
}
