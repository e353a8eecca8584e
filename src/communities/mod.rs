mod join;
mod new;
mod page;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub use new::create_community;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", get(new::new_community_page).post(new::new_community))
        .route("/{slug}", get(page::community))
        .route("/{slug}/join", post(join::join))
        .route("/{slug}/leave", post(join::leave))
}
