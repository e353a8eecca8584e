use axum::{debug_handler, extract::{Path, State}, response::{Html, IntoResponse, Response}};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{auth, chirps, db::{Chirp, Profile}, include_res, res, AppResult};

use super::follow;

#[debug_handler]
pub(crate) async fn profile(
    Path(profile_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile): Option<Profile> = sqlx::query_as("SELECT * FROM profiles WHERE uuid=?")
        .bind(profile_id.to_string())
        .fetch_optional(&db_pool)
        .await?
    else {
        return res::sorry("profile");
    };

    let (follower_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM follows WHERE followee_id=?")
            .bind(&profile.uuid)
            .fetch_one(&db_pool)
            .await?;
    let (following_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM follows WHERE follower_id=?")
            .bind(&profile.uuid)
            .fetch_one(&db_pool)
            .await?;

    let follow_action = match auth::current_profile(&db_pool, &session).await? {
        Some(me) if me.uuid != profile.uuid => {
            if follow::is_following(&db_pool, &me.uuid, &profile.uuid).await? {
                format!(
                    "<form method=\"post\" action=\"/p/{}/unfollow\"><button>Unfollow</button></form>",
                    profile.uuid
                )
            } else {
                format!(
                    "<form method=\"post\" action=\"/p/{}/follow\"><button>Follow</button></form>",
                    profile.uuid
                )
            }
        }
        _ => String::new(),
    };

    let own_chirps: Vec<Chirp> =
        sqlx::query_as("SELECT * FROM chirps WHERE author_id=? ORDER BY created_at DESC")
            .bind(&profile.uuid)
            .fetch_all(&db_pool)
            .await?;
    let mut chirp_items = String::new();
    for chirp in &own_chirps {
        chirp_items += &chirps::chirp_to_html(&db_pool, chirp).await?;
    }

    Ok(Html(
        include_res!(str, "/pages/profiles/profile.html")
            .replace("{id}", &profile.uuid)
            .replace("{handle}", &res::escape(&profile.handle))
            .replace("{alias}", &res::escape(&profile.alias))
            .replace("{bio}", &res::escape(&profile.bio))
            .replace("{location}", &res::escape(&profile.location))
            .replace("{website}", &res::escape(&profile.website))
            .replace("{follower_count}", &follower_count.to_string())
            .replace("{following_count}", &following_count.to_string())
            .replace("{follow_action}", &follow_action)
            .replace("{chirps}", &chirp_items)
    ).into_response())
}

fn profile_items(profiles: &[Profile]) -> String {
    let mut items = String::new();
    for profile in profiles {
        items += &include_res!(str, "/pages/profiles/item.html")
            .replace("{id}", &profile.uuid)
            .replace("{handle}", &res::escape(&profile.handle))
            .replace("{alias}", &res::escape(&profile.alias));
    }
    items
}

#[debug_handler]
pub(crate) async fn followers_page(
    Path(profile_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let followers = follow::followers(&db_pool, &profile_id.to_string()).await?;

    Ok(Html(
        include_res!(str, "/pages/profiles/list.html")
            .replace("{title}", "Followers")
            .replace("{profiles}", &profile_items(&followers))
    ).into_response())
}

#[debug_handler]
pub(crate) async fn following_page(
    Path(profile_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let following = follow::following(&db_pool, &profile_id.to_string()).await?;

    Ok(Html(
        include_res!(str, "/pages/profiles/list.html")
            .replace("{title}", "Following")
            .replace("{profiles}", &profile_items(&following))
    ).into_response())
}
