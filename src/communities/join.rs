use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{auth, res, AppResult};

/// Idempotent membership add. The admin role is only ever seeded at
/// creation; joiners always come in as plain members.
pub async fn join_community(db_pool: &SqlitePool, community_id: &str, profile_id: &str) -> AppResult<()> {
    sqlx::query("INSERT OR IGNORE INTO community_members (community_id,profile_id,role) VALUES (?,?,'member')")
        .bind(community_id)
        .bind(profile_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn leave_community(db_pool: &SqlitePool, community_id: &str, profile_id: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM community_members WHERE community_id=? AND profile_id=?")
        .bind(community_id)
        .bind(profile_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

async fn membership(
    db_pool: &SqlitePool,
    session: &Session,
    slug: &str,
    joining: bool,
) -> AppResult<Response> {
    let Some(me) = auth::current_profile(db_pool, session).await? else {
        return Ok(Redirect::to(&format!("/login?return_url=/g/{slug}")).into_response());
    };
    if let Some(gate) = auth::onboarding_gate(&me) {
        return Ok(gate.into_response());
    }

    let found: Option<(String,)> = sqlx::query_as("SELECT uuid FROM communities WHERE slug=?")
        .bind(slug)
        .fetch_optional(db_pool)
        .await?;
    let Some((community_id,)) = found else {
        return res::sorry("community");
    };

    if joining {
        join_community(db_pool, &community_id, &me.uuid).await?;
    } else {
        leave_community(db_pool, &community_id, &me.uuid).await?;
    }

    Ok(Redirect::to(&format!("/g/{slug}")).into_response())
}

#[debug_handler]
pub(crate) async fn join(
    Path(slug): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    membership(&db_pool, &session, &slug, true).await
}

#[debug_handler]
pub(crate) async fn leave(
    Path(slug): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    membership(&db_pool, &session, &slug, false).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth, communities, db};

    async fn seeded(pool: &SqlitePool) -> (String, String) {
        let admin = auth::resolve_profile(pool, "ext:admin").await.unwrap();
        communities::create_community(pool, &admin.uuid, "Rustaceans", "rust", "")
            .await
            .unwrap()
            .unwrap();
        let (community_id,): (String,) = sqlx::query_as("SELECT uuid FROM communities WHERE slug='rust'")
            .fetch_one(pool)
            .await
            .unwrap();
        let joiner = auth::resolve_profile(pool, "ext:b").await.unwrap();
        (community_id, joiner.uuid)
    }

    #[tokio::test]
    async fn joining_twice_leaves_one_membership() {
        let pool = db::memory_pool().await;
        let (community_id, joiner) = seeded(&pool).await;

        join_community(&pool, &community_id, &joiner).await.unwrap();
        join_community(&pool, &community_id, &joiner).await.unwrap();

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM community_members WHERE community_id=? AND profile_id=?")
                .bind(&community_id)
                .bind(&joiner)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn rejoining_does_not_promote() {
        let pool = db::memory_pool().await;
        let (community_id, joiner) = seeded(&pool).await;

        join_community(&pool, &community_id, &joiner).await.unwrap();
        leave_community(&pool, &community_id, &joiner).await.unwrap();
        join_community(&pool, &community_id, &joiner).await.unwrap();

        let (role,): (String,) =
            sqlx::query_as("SELECT role FROM community_members WHERE community_id=? AND profile_id=?")
                .bind(&community_id)
                .bind(&joiner)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(role, "member");
    }
}
