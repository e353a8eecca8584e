use axum::{debug_handler, extract::State, response::{Html, IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{auth, include_res, validate::ValidationErrors, AppResult};

#[derive(Debug, Deserialize)]
pub(crate) struct NewCommunityForm {
    name: String,
    slug: String,
    #[serde(default)]
    description: String,
}

#[debug_handler]
pub(crate) async fn new_community_page(session: Session, State(db_pool): State<SqlitePool>) -> AppResult<Response> {
    let Some(me) = auth::current_profile(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login?return_url=/g/new").into_response());
    };
    if let Some(gate) = auth::onboarding_gate(&me) {
        return Ok(gate.into_response());
    }

    Ok(Html(include_res!(str, "/pages/communities/new.html")).into_response())
}

#[debug_handler]
pub(crate) async fn new_community(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<NewCommunityForm>,
) -> AppResult<Response> {
    let Some(me) = auth::current_profile(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login?return_url=/g/new").into_response());
    };
    if let Some(gate) = auth::onboarding_gate(&me) {
        return Ok(gate.into_response());
    }

    match create_community(&db_pool, &me.uuid, &form.name, &form.slug, &form.description).await? {
        Ok(slug) => Ok(Redirect::to(&format!("/g/{slug}")).into_response()),
        Err(errors) => Ok(errors.into_response()),
    }
}

/// Creates a community with its creator seeded as admin. Shape problems
/// (bad name/slug, slug already taken) come back as the inner `Err`.
pub async fn create_community(
    db_pool: &SqlitePool,
    creator_id: &str,
    name: &str,
    slug: &str,
    description: &str,
) -> AppResult<Result<String, ValidationErrors>> {
    let name = name.trim();
    let slug = slug.trim().to_lowercase();

    let mut errors = ValidationErrors::default();
    if name.is_empty() {
        errors.0.push(("name", "must not be empty".to_owned()));
    }
    if slug.is_empty() || !slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        errors.0.push(("slug", "letters, digits, - and _ only".to_owned()));
    }
    if !errors.is_empty() {
        return Ok(Err(errors));
    }

    let taken: Option<(String,)> = sqlx::query_as("SELECT uuid FROM communities WHERE slug=?")
        .bind(&slug)
        .fetch_optional(db_pool)
        .await?;
    if taken.is_some() {
        errors.0.push(("slug", format!("{slug} is already taken")));
        return Ok(Err(errors));
    }

    let uuid = Uuid::now_v7().to_string();
    sqlx::query("INSERT INTO communities (uuid,slug,name,description,creator_id) VALUES (?,?,?,?,?)")
        .bind(&uuid)
        .bind(&slug)
        .bind(name)
        .bind(description.trim())
        .bind(creator_id)
        .execute(db_pool)
        .await?;

    sqlx::query("INSERT OR IGNORE INTO community_members (community_id,profile_id,role) VALUES (?,?,'admin')")
        .bind(&uuid)
        .bind(creator_id)
        .execute(db_pool)
        .await?;

    tracing::info!("community g/{slug} created by {creator_id}");
    Ok(Ok(slug))
}
