use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{auth, res, AppResult};

/// Set-membership toggle: inserts the (chirp, profile) pair if absent,
/// deletes it if present. Returns whether the pair is in the set afterward.
/// Counts are always derived from the set, never kept as counters.
async fn toggle(
    db_pool: &SqlitePool,
    table: &str,
    chirp_id: &str,
    profile_id: &str,
) -> AppResult<bool> {
    let removed = sqlx::query(&format!("DELETE FROM {table} WHERE chirp_id=? AND profile_id=?"))
        .bind(chirp_id)
        .bind(profile_id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if removed > 0 {
        return Ok(false);
    }

    sqlx::query(&format!("INSERT OR IGNORE INTO {table} (chirp_id,profile_id) VALUES (?,?)"))
        .bind(chirp_id)
        .bind(profile_id)
        .execute(db_pool)
        .await?;
    Ok(true)
}

pub async fn toggle_like(db_pool: &SqlitePool, chirp_id: &str, profile_id: &str) -> AppResult<bool> {
    toggle(db_pool, "chirp_likes", chirp_id, profile_id).await
}

pub async fn toggle_share(db_pool: &SqlitePool, chirp_id: &str, profile_id: &str) -> AppResult<bool> {
    toggle(db_pool, "chirp_shares", chirp_id, profile_id).await
}

pub(crate) async fn has_liked(db_pool: &SqlitePool, chirp_id: &str, profile_id: &str) -> AppResult<bool> {
    Ok(sqlx::query_as::<_, (i64,)>("SELECT 1 FROM chirp_likes WHERE chirp_id=? AND profile_id=?")
        .bind(chirp_id)
        .bind(profile_id)
        .fetch_optional(db_pool)
        .await?
        .is_some())
}

async fn react(
    db_pool: &SqlitePool,
    session: &Session,
    chirp_id: Uuid,
    table: &str,
) -> AppResult<Response> {
    let Some(me) = auth::current_profile(db_pool, session).await? else {
        return Ok(Redirect::to(&format!("/login?return_url=/c/{chirp_id}")).into_response());
    };
    if let Some(gate) = auth::onboarding_gate(&me) {
        return Ok(gate.into_response());
    }

    let chirp_id = chirp_id.to_string();
    let exists: Option<(String,)> = sqlx::query_as("SELECT uuid FROM chirps WHERE uuid=?")
        .bind(&chirp_id)
        .fetch_optional(db_pool)
        .await?;
    if exists.is_none() {
        return res::sorry("chirp");
    }

    toggle(db_pool, table, &chirp_id, &me.uuid).await?;
    Ok(Redirect::to(&format!("/c/{chirp_id}")).into_response())
}

#[debug_handler]
pub(crate) async fn like(
    Path(chirp_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    react(&db_pool, &session, chirp_id, "chirp_likes").await
}

#[debug_handler]
pub(crate) async fn share(
    Path(chirp_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    react(&db_pool, &session, chirp_id, "chirp_shares").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth, chirps, db, validate::{self, ChirpSubmission}};

    async fn seeded_chirp(pool: &SqlitePool) -> (String, String) {
        let author = auth::resolve_profile(pool, "ext:a").await.unwrap();
        let chirp = validate::validate(ChirpSubmission {
            body: "something to react to".to_owned(),
            ..Default::default()
        })
        .unwrap();
        let chirp_id = chirps::create_chirp(pool, &author.uuid, None, None, chirp)
            .await
            .unwrap();
        (chirp_id, author.uuid)
    }

    #[tokio::test]
    async fn like_toggles_round_trip() {
        let pool = db::memory_pool().await;
        let (chirp_id, me) = seeded_chirp(&pool).await;

        assert!(toggle_like(&pool, &chirp_id, &me).await.unwrap());
        assert!(has_liked(&pool, &chirp_id, &me).await.unwrap());

        // like again: back to unliked
        assert!(!toggle_like(&pool, &chirp_id, &me).await.unwrap());
        assert!(!has_liked(&pool, &chirp_id, &me).await.unwrap());
    }

    #[tokio::test]
    async fn likes_are_membership_not_counters() {
        let pool = db::memory_pool().await;
        let (chirp_id, me) = seeded_chirp(&pool).await;

        toggle_like(&pool, &chirp_id, &me).await.unwrap();
        // direct re-insert path can't double-count
        sqlx::query("INSERT OR IGNORE INTO chirp_likes (chirp_id,profile_id) VALUES (?,?)")
            .bind(&chirp_id)
            .bind(&me)
            .execute(&pool)
            .await
            .unwrap();

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chirp_likes WHERE chirp_id=?")
                .bind(&chirp_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn likes_and_shares_are_independent_sets() {
        let pool = db::memory_pool().await;
        let (chirp_id, me) = seeded_chirp(&pool).await;

        toggle_like(&pool, &chirp_id, &me).await.unwrap();
        assert!(toggle_share(&pool, &chirp_id, &me).await.unwrap());
        assert!(!toggle_like(&pool, &chirp_id, &me).await.unwrap());

        let (shares,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chirp_shares WHERE chirp_id=?")
                .bind(&chirp_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(shares, 1);
    }
}
