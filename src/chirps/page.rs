use axum::{debug_handler, extract::{Path, State}, response::{Html, IntoResponse, Response}};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db::Chirp, include_res, res, AppResult};

/// Renders one chirp as a feed/thread item. Body text goes through
/// markdown; everything interpolated from the store is escaped.
pub async fn chirp_to_html(db_pool: &SqlitePool, chirp: &Chirp) -> AppResult<String> {
    let (handle, alias): (String, String) =
        sqlx::query_as("SELECT handle,alias FROM profiles WHERE uuid=?")
            .bind(&chirp.author_id)
            .fetch_optional(db_pool)
            .await?
            .unwrap_or(("?".to_owned(), "Anonymous".to_owned()));

    let (likes,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chirp_likes WHERE chirp_id=?")
        .bind(&chirp.uuid)
        .fetch_one(db_pool)
        .await?;
    let (shares,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chirp_shares WHERE chirp_id=?")
        .bind(&chirp.uuid)
        .fetch_one(db_pool)
        .await?;
    let (replies,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chirps WHERE parent_id=?")
        .bind(&chirp.uuid)
        .fetch_one(db_pool)
        .await?;

    let mut body_html = String::new();
    pulldown_cmark::html::push_html(
        &mut body_html,
        pulldown_cmark::Parser::new(&res::escape(&chirp.body)),
    );

    let mut attachments = String::new();
    let rows: Vec<(String, String, Option<String>)> =
        sqlx::query_as("SELECT kind,url,filename FROM chirp_attachments WHERE chirp_id=?")
            .bind(&chirp.uuid)
            .fetch_all(db_pool)
            .await?;
    for (kind, url, filename) in rows {
        attachments += &format!(
            "<li class=\"attachment {kind}\"><a href=\"{}\">{}</a></li>\n",
            res::escape(&url),
            res::escape(filename.as_deref().unwrap_or(&url)),
        );
    }

    let community = match &chirp.community_id {
        Some(community_id) => {
            let (slug, name): (String, String) =
                sqlx::query_as("SELECT slug,name FROM communities WHERE uuid=?")
                    .bind(community_id)
                    .fetch_one(db_pool)
                    .await?;
            format!("<a href=\"/g/{slug}\">{}</a>", res::escape(&name))
        }
        None => String::new(),
    };

    Ok(include_res!(str, "/pages/chirps/item.html")
        .replace("{id}", &chirp.uuid)
        .replace("{author_id}", &chirp.author_id)
        .replace("{handle}", &res::escape(&handle))
        .replace("{alias}", &res::escape(&alias))
        .replace("{body}", &body_html)
        .replace("{community}", &community)
        .replace("{attachments}", &attachments)
        .replace("{likes}", &likes.to_string())
        .replace("{shares}", &shares.to_string())
        .replace("{replies}", &replies.to_string()))
}

#[debug_handler]
pub(crate) async fn chirp(
    Path(chirp_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let Some(chirp): Option<Chirp> = sqlx::query_as("SELECT * FROM chirps WHERE uuid=?")
        .bind(chirp_id.to_string())
        .fetch_optional(&db_pool)
        .await?
    else {
        return res::sorry("chirp");
    };

    let parent_link = match &chirp.parent_id {
        Some(parent_id) => format!("<a href=\"/c/{parent_id}\">in reply to</a>"),
        None => String::new(),
    };

    // children are derived from parent_id, never a stored list
    let replies: Vec<Chirp> =
        sqlx::query_as("SELECT * FROM chirps WHERE parent_id=? ORDER BY created_at ASC")
            .bind(&chirp.uuid)
            .fetch_all(&db_pool)
            .await?;

    let mut reply_items = String::new();
    for reply in &replies {
        reply_items += &chirp_to_html(&db_pool, reply).await?;
    }

    let body = include_res!(str, "/pages/chirps/thread.html")
        .replace("{chirp}", &chirp_to_html(&db_pool, &chirp).await?)
        .replace("{id}", &chirp.uuid)
        .replace("{parent_link}", &parent_link)
        .replace("{replies}", &reply_items);

    Ok(Html(body).into_response())
}
