use axum::{debug_handler, extract::State, response::{Html, IntoResponse, Redirect, Response}};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{auth, include_res, res, AppResult};

/// The notification surface. Everything here is derived straight from the
/// content tables on each request; nothing is stored per-notification.
#[debug_handler]
pub async fn activity(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = auth::current_profile(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login?return_url=/activity").into_response());
    };

    let mut events: Vec<(i64, String)> = Vec::new();

    let replies: Vec<(String, String, String, i64)> = sqlx::query_as(
        "SELECT c.uuid,p.uuid,p.handle,c.created_at FROM chirps c
         JOIN chirps parent ON parent.uuid = c.parent_id
         JOIN profiles p ON p.uuid = c.author_id
         WHERE parent.author_id=? AND c.author_id!=?",
    )
    .bind(&me.uuid)
    .bind(&me.uuid)
    .fetch_all(&db_pool)
    .await?;
    for (chirp_id, author_id, handle, at) in replies {
        events.push((at, format!(
            "<li><a href=\"/p/{author_id}\">@{}</a> replied to <a href=\"/c/{chirp_id}\">your chirp</a></li>\n",
            res::escape(&handle)
        )));
    }

    let mentions: Vec<(String, String, String, i64)> = sqlx::query_as(
        "SELECT c.uuid,p.uuid,p.handle,c.created_at FROM chirp_mentions m
         JOIN chirps c ON c.uuid = m.chirp_id
         JOIN profiles p ON p.uuid = c.author_id
         WHERE m.profile_id=? AND c.author_id!=?",
    )
    .bind(&me.uuid)
    .bind(&me.uuid)
    .fetch_all(&db_pool)
    .await?;
    for (chirp_id, author_id, handle, at) in mentions {
        events.push((at, format!(
            "<li><a href=\"/p/{author_id}\">@{}</a> mentioned you in <a href=\"/c/{chirp_id}\">a chirp</a></li>\n",
            res::escape(&handle)
        )));
    }

    let new_followers: Vec<(String, String, i64)> = sqlx::query_as(
        "SELECT p.uuid,p.handle,f.created_at FROM follows f
         JOIN profiles p ON p.uuid = f.follower_id
         WHERE f.followee_id=?",
    )
    .bind(&me.uuid)
    .fetch_all(&db_pool)
    .await?;
    for (follower_id, handle, at) in new_followers {
        events.push((at, format!(
            "<li><a href=\"/p/{follower_id}\">@{}</a> followed you</li>\n",
            res::escape(&handle)
        )));
    }

    events.sort_by(|a, b| b.0.cmp(&a.0));

    let items: String = events.into_iter().map(|(_, html)| html).collect();
    Ok(Html(
        include_res!(str, "/pages/activity.html").replace("{events}", &items)
    ).into_response())
}
