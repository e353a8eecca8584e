use axum::{debug_handler, extract::{Path, State}, response::{Html, IntoResponse, Response}};
use sqlx::SqlitePool;

use crate::{db::Chirp, include_res, res, AppResult};

use super::page;

#[debug_handler]
pub async fn tag_page(
    Path(tag): Path<String>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let tag = tag.trim_start_matches('#').to_lowercase();

    let chirps: Vec<Chirp> = sqlx::query_as(
        "SELECT c.* FROM chirps c
         JOIN chirp_hashtags h ON h.chirp_id = c.uuid
         WHERE h.tag=? ORDER BY c.created_at DESC",
    )
    .bind(&tag)
    .fetch_all(&db_pool)
    .await?;

    let mut items = String::new();
    for chirp in &chirps {
        items += &page::chirp_to_html(&db_pool, chirp).await?;
    }

    Ok(Html(
        include_res!(str, "/pages/chirps/tag.html")
            .replace("{tag}", &res::escape(&tag))
            .replace("{chirps}", &items)
    ).into_response())
}
