use axum::{debug_handler, extract::{Path, State}, response::{Html, IntoResponse, Response}};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{auth, chirps, db::{Chirp, Community}, include_res, res, AppResult};

#[debug_handler]
pub(crate) async fn community(
    Path(slug): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(community): Option<Community> = sqlx::query_as("SELECT * FROM communities WHERE slug=?")
        .bind(&slug)
        .fetch_optional(&db_pool)
        .await?
    else {
        return res::sorry("community");
    };

    let members: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT p.uuid,p.handle,m.role FROM profiles p
         JOIN community_members m ON m.profile_id = p.uuid
         WHERE m.community_id=?",
    )
    .bind(&community.uuid)
    .fetch_all(&db_pool)
    .await?;

    let mut member_items = String::new();
    for (uuid, handle, role) in &members {
        member_items += &format!(
            "<li><a href=\"/p/{uuid}\">@{}</a> ({role})</li>\n",
            res::escape(handle)
        );
    }

    let membership_action = match auth::current_profile(&db_pool, &session).await? {
        Some(me) => {
            if members.iter().any(|(uuid, _, _)| *uuid == me.uuid) {
                format!("<form method=\"post\" action=\"/g/{slug}/leave\"><button>Leave</button></form>")
            } else {
                format!("<form method=\"post\" action=\"/g/{slug}/join\"><button>Join</button></form>")
            }
        }
        None => String::new(),
    };

    let community_chirps: Vec<Chirp> = sqlx::query_as(
        "SELECT * FROM chirps WHERE community_id=? AND parent_id IS NULL ORDER BY created_at DESC",
    )
    .bind(&community.uuid)
    .fetch_all(&db_pool)
    .await?;

    let mut chirp_items = String::new();
    for chirp in &community_chirps {
        chirp_items += &chirps::chirp_to_html(&db_pool, chirp).await?;
    }

    Ok(Html(
        include_res!(str, "/pages/communities/community.html")
            .replace("{slug}", &community.slug)
            .replace("{name}", &res::escape(&community.name))
            .replace("{description}", &res::escape(&community.description))
            .replace("{membership_action}", &membership_action)
            .replace("{members}", &member_items)
            .replace("{chirps}", &chirp_items)
    ).into_response())
}
