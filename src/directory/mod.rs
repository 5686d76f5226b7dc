pub mod routes;
pub mod store;

use axum::{Router, routing::get};

use crate::AppState;

pub use self::store::{Profile, ProfilePatch};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/random", get(routes::random))
        .route("/api/users/search", get(routes::search))
        .route("/api/user/{username}", get(routes::user_detail))
}
