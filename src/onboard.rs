use axum::{debug_handler, extract::State, response::{Html, IntoResponse, Redirect, Response}, routing::get, Form, Router};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{auth, include_res, res, validate::ValidationErrors, AppResult, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/onboard", get(onboard_page).post(onboard))
}

#[derive(Debug, Deserialize)]
pub struct OnboardForm {
    pub handle: String,
    pub alias: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub date_of_birth: String,
}

#[debug_handler]
pub(crate) async fn onboard_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = auth::current_profile(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login?return_url=/onboard").into_response());
    };

    Ok(Html(
        include_res!(str, "/pages/onboard.html")
            .replace("{handle}", &res::escape(&profile.handle))
            .replace("{alias}", &res::escape(&profile.alias))
            .replace("{bio}", &res::escape(&profile.bio))
            .replace("{avatar_url}", &res::escape(&profile.avatar_url))
            .replace("{email}", &res::escape(&profile.email))
            .replace("{website}", &res::escape(&profile.website))
            .replace("{location}", &res::escape(&profile.location))
            .replace("{date_of_birth}", &res::escape(&profile.date_of_birth))
    ).into_response())
}

#[debug_handler]
pub(crate) async fn onboard(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<OnboardForm>,
) -> AppResult<Response> {
    let Some(profile) = auth::current_profile(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login?return_url=/onboard").into_response());
    };

    match complete_profile(&db_pool, &profile.uuid, form).await? {
        Ok(()) => Ok(Redirect::to("/").into_response()),
        Err(errors) => Ok(errors.into_response()),
    }
}

/// Completes a profile and flips `onboarded`. Shape problems (missing
/// handle or display name, handle already taken) come back as the inner
/// `Err` so the caller can surface them field-by-field.
pub async fn complete_profile(
    db_pool: &SqlitePool,
    profile_uuid: &str,
    form: OnboardForm,
) -> AppResult<Result<(), ValidationErrors>> {
    let handle = form.handle.trim().trim_start_matches('@').to_owned();
    let alias = form.alias.trim().to_owned();

    let mut errors = ValidationErrors::default();
    if handle.is_empty() {
        errors.0.push(("handle", "must not be empty".to_owned()));
    }
    if alias.is_empty() {
        errors.0.push(("alias", "must not be empty".to_owned()));
    }
    if !errors.is_empty() {
        return Ok(Err(errors));
    }

    let taken: Option<(String,)> =
        sqlx::query_as("SELECT uuid FROM profiles WHERE handle=? AND uuid!=?")
            .bind(&handle)
            .bind(profile_uuid)
            .fetch_optional(db_pool)
            .await?;
    if taken.is_some() {
        errors.0.push(("handle", format!("@{handle} is already taken")));
        return Ok(Err(errors));
    }

    sqlx::query(
        "UPDATE profiles SET handle=?, alias=?, bio=?, avatar_url=?, email=?, website=?, location=?, date_of_birth=?, onboarded=TRUE WHERE uuid=?",
    )
    .bind(&handle)
    .bind(&alias)
    .bind(form.bio.trim())
    .bind(form.avatar_url.trim())
    .bind(form.email.trim())
    .bind(form.website.trim())
    .bind(form.location.trim())
    .bind(form.date_of_birth.trim())
    .bind(profile_uuid)
    .execute(db_pool)
    .await?;

    tracing::info!("onboarded @{handle}");
    Ok(Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth, db};

    fn form(handle: &str, alias: &str) -> OnboardForm {
        OnboardForm {
            handle: handle.to_owned(),
            alias: alias.to_owned(),
            bio: String::new(),
            avatar_url: String::new(),
            email: String::new(),
            website: String::new(),
            location: String::new(),
            date_of_birth: String::new(),
        }
    }

    #[tokio::test]
    async fn onboarding_flips_the_flag() {
        let pool = db::memory_pool().await;
        let profile = auth::resolve_profile(&pool, "ext:1").await.unwrap();
        assert!(!profile.onboarded);

        complete_profile(&pool, &profile.uuid, form("bob", "Bob"))
            .await
            .unwrap()
            .unwrap();

        let profile = auth::resolve_profile(&pool, "ext:1").await.unwrap();
        assert!(profile.onboarded);
        assert_eq!(profile.handle, "bob");
    }

    #[tokio::test]
    async fn missing_handle_or_alias_is_a_validation_error() {
        let pool = db::memory_pool().await;
        let profile = auth::resolve_profile(&pool, "ext:1").await.unwrap();

        let errors = complete_profile(&pool, &profile.uuid, form("  ", "Bob"))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(errors.0[0].0, "handle");

        let errors = complete_profile(&pool, &profile.uuid, form("bob", ""))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(errors.0[0].0, "alias");

        let profile = auth::resolve_profile(&pool, "ext:1").await.unwrap();
        assert!(!profile.onboarded);
    }

    #[tokio::test]
    async fn taken_handle_is_a_validation_error_naming_the_handle() {
        let pool = db::memory_pool().await;
        let bob = auth::resolve_profile(&pool, "ext:1").await.unwrap();
        complete_profile(&pool, &bob.uuid, form("bob", "Bob"))
            .await
            .unwrap()
            .unwrap();

        let eve = auth::resolve_profile(&pool, "ext:2").await.unwrap();
        let errors = complete_profile(&pool, &eve.uuid, form("bob", "Eve"))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(errors.0[0].0, "handle");
        assert!(errors.0[0].1.contains("taken"));
    }

    #[tokio::test]
    async fn date_of_birth_round_trips() {
        let pool = db::memory_pool().await;
        let profile = auth::resolve_profile(&pool, "ext:1").await.unwrap();

        let mut f = form("bob", "Bob");
        f.date_of_birth = "1990-04-01".to_owned();
        complete_profile(&pool, &profile.uuid, f).await.unwrap().unwrap();

        let profile = auth::resolve_profile(&pool, "ext:1").await.unwrap();
        assert_eq!(profile.date_of_birth, "1990-04-01");
    }
}
