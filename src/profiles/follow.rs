use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{auth, db::{self, Profile}, res, AppResult};

/// Creates the edge follower→followee. Idempotent, and a self-follow is a
/// no-op rather than an error.
pub async fn follow(db_pool: &SqlitePool, follower_id: &str, followee_id: &str) -> AppResult<()> {
    if follower_id == followee_id {
        return Ok(());
    }

    sqlx::query("INSERT OR IGNORE INTO follows (follower_id,followee_id,created_at) VALUES (?,?,?)")
        .bind(follower_id)
        .bind(followee_id)
        .bind(db::now())
        .execute(db_pool)
        .await?;
    Ok(())
}

/// Like [`follow`], but looks the followee up first. SQLite doesn't
/// enforce our REFERENCES clauses, so without this a follow aimed at a
/// random id would insert a phantom edge and inflate follower counts.
/// Returns whether the followee exists.
pub(crate) async fn follow_existing(
    db_pool: &SqlitePool,
    follower_id: &str,
    followee_id: &str,
) -> AppResult<bool> {
    let exists: Option<(String,)> = sqlx::query_as("SELECT uuid FROM profiles WHERE uuid=?")
        .bind(followee_id)
        .fetch_optional(db_pool)
        .await?;
    if exists.is_none() {
        return Ok(false);
    }

    follow(db_pool, follower_id, followee_id).await?;
    Ok(true)
}

/// Removes the edge if present. Idempotent.
pub async fn unfollow(db_pool: &SqlitePool, follower_id: &str, followee_id: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM follows WHERE follower_id=? AND followee_id=?")
        .bind(follower_id)
        .bind(followee_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn followers(db_pool: &SqlitePool, profile_id: &str) -> AppResult<Vec<Profile>> {
    Ok(sqlx::query_as(
        "SELECT p.* FROM profiles p
         JOIN follows f ON f.follower_id = p.uuid
         WHERE f.followee_id=? ORDER BY f.created_at DESC",
    )
    .bind(profile_id)
    .fetch_all(db_pool)
    .await?)
}

pub async fn following(db_pool: &SqlitePool, profile_id: &str) -> AppResult<Vec<Profile>> {
    Ok(sqlx::query_as(
        "SELECT p.* FROM profiles p
         JOIN follows f ON f.followee_id = p.uuid
         WHERE f.follower_id=? ORDER BY f.created_at DESC",
    )
    .bind(profile_id)
    .fetch_all(db_pool)
    .await?)
}

pub(crate) async fn is_following(
    db_pool: &SqlitePool,
    follower_id: &str,
    followee_id: &str,
) -> AppResult<bool> {
    Ok(sqlx::query_as::<_, (i64,)>("SELECT 1 FROM follows WHERE follower_id=? AND followee_id=?")
        .bind(follower_id)
        .bind(followee_id)
        .fetch_optional(db_pool)
        .await?
        .is_some())
}

#[debug_handler]
pub(crate) async fn follow_handler(
    Path(followee_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = auth::current_profile(&db_pool, &session).await? else {
        return Ok(Redirect::to(&format!("/login?return_url=/p/{followee_id}")).into_response());
    };
    if let Some(gate) = auth::onboarding_gate(&me) {
        return Ok(gate.into_response());
    }

    if !follow_existing(&db_pool, &me.uuid, &followee_id.to_string()).await? {
        return res::sorry("profile");
    }
    Ok(Redirect::to(&format!("/p/{followee_id}")).into_response())
}

#[debug_handler]
pub(crate) async fn unfollow_handler(
    Path(followee_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = auth::current_profile(&db_pool, &session).await? else {
        return Ok(Redirect::to(&format!("/login?return_url=/p/{followee_id}")).into_response());
    };
    if let Some(gate) = auth::onboarding_gate(&me) {
        return Ok(gate.into_response());
    }

    unfollow(&db_pool, &me.uuid, &followee_id.to_string()).await?;
    Ok(Redirect::to(&format!("/p/{followee_id}")).into_response())
}
