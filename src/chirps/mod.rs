mod new;
mod page;
mod react;
mod tags;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub use new::create_chirp;
pub use page::chirp_to_html;
pub use tags::tag_page;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", get(new::new_chirp_page).post(new::new_chirp))
        .route("/{uuid}", get(page::chirp))
        .route("/{uuid}/like", post(react::like))
        .route("/{uuid}/share", post(react::share))
}
