mod follow;
mod page;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub use follow::{follow, followers, following, unfollow};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{uuid}", get(page::profile))
        .route("/{uuid}/followers", get(page::followers_page))
        .route("/{uuid}/following", get(page::following_page))
        .route("/{uuid}/follow", post(follow::follow_handler))
        .route("/{uuid}/unfollow", post(follow::unfollow_handler))
}
