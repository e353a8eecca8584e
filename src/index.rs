use axum::{debug_handler, extract::State, response::{Html, IntoResponse, Redirect, Response}};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{auth, chirps, db::Chirp, include_res, AppResult};

const FEED_LIMIT: i64 = 50;

#[debug_handler]
pub async fn index(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = auth::current_profile(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };
    if let Some(gate) = auth::onboarding_gate(&me) {
        return Ok(gate.into_response());
    }

    // own chirps plus the follow set; a fresh account with nobody followed
    // falls back to the global firehose
    let mut feed: Vec<Chirp> = sqlx::query_as(
        "SELECT c.* FROM chirps c
         WHERE c.parent_id IS NULL AND (
            c.author_id=? OR c.author_id IN
                (SELECT followee_id FROM follows WHERE follower_id=?)
         )
         ORDER BY c.created_at DESC LIMIT ?",
    )
    .bind(&me.uuid)
    .bind(&me.uuid)
    .bind(FEED_LIMIT)
    .fetch_all(&db_pool)
    .await?;

    if feed.is_empty() {
        feed = sqlx::query_as(
            "SELECT * FROM chirps WHERE parent_id IS NULL ORDER BY created_at DESC LIMIT ?",
        )
        .bind(FEED_LIMIT)
        .fetch_all(&db_pool)
        .await?;
    }

    let mut items = String::new();
    for chirp in &feed {
        items += &chirps::chirp_to_html(&db_pool, chirp).await?;
    }

    Ok(Html(
        include_res!(str, "/pages/index.html")
            .replace("{me}", &me.uuid)
            .replace("{chirps}", &items)
    ).into_response())
}
