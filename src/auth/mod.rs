mod clients;
mod lockin;
mod login;
mod logout;

use axum::{response::Redirect, routing::get, Router};
use rand::seq::IndexedRandom;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{db::Profile, session::USER_ID, AppResult, AppState};

pub use clients::Clients;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login::login_page))
        .route("/login/{provider}", get(login::login))
        .route("/lockin/{provider}", get(lockin::lockin))
        .route("/logout", get(logout::logout))
}

/// Content creation is gated on a completed profile; callers bounce to the
/// onboarding form instead of getting an error.
pub fn onboarding_gate(profile: &Profile) -> Option<Redirect> {
    (!profile.onboarded).then(|| Redirect::to("/onboard"))
}

/// The signed-in caller's profile, or None when there's no session user.
/// Absence is not an error; handlers decide whether to redirect or refuse.
pub(crate) async fn current_profile(
    db_pool: &SqlitePool,
    session: &Session,
) -> AppResult<Option<Profile>> {
    let Some(auth_id) = session.get::<String>(USER_ID).await? else {
        return Ok(None);
    };

    Ok(Some(resolve_profile(db_pool, &auth_id).await?))
}

/// Upsert-on-first-contact: an auth id we've never seen gets a fresh,
/// not-yet-onboarded profile with a generated handle and alias.
pub(crate) async fn resolve_profile(db_pool: &SqlitePool, auth_id: &str) -> AppResult<Profile> {
    let existing: Option<Profile> = sqlx::query_as("SELECT * FROM profiles WHERE auth_id=?")
        .bind(auth_id)
        .fetch_optional(db_pool)
        .await?;
    if let Some(profile) = existing {
        return Ok(profile);
    }

    let uuid = Uuid::now_v7();
    let handle = "user".to_owned() + &uuid.simple().to_string();

    let adjectives = [
        "Quick", "Lazy", "Mysterious", "Jolly", "Brave", "Silent", "Witty", "Fierce",
        "Clever", "Gentle", "Wild", "Calm", "Bold", "Shy", "Proud", "Happy", "Sad",
        "Eager", "Fancy", "Rusty", "Golden", "Silver", "Bright", "Dark", "Lucky",
    ];
    let nouns = [
        "Fox", "Bear", "Eagle", "Wolf", "Dragon", "Tiger", "Lion", "Owl", "Rabbit",
        "Falcon", "Hawk", "Shark", "Panda", "Kitten", "Puppy", "Phoenix", "Griffin",
        "Unicorn", "Turtle", "Dolphin", "Whale", "Elephant", "Giraffe", "Zebra",
    ];
    let alias = format!(
        "{} {}",
        adjectives.choose(&mut rand::rng()).unwrap(),
        nouns.choose(&mut rand::rng()).unwrap()
    );

    tracing::info!("adding @{handle}#{auth_id}, {alias}");
    sqlx::query("INSERT INTO profiles (uuid,auth_id,handle,alias) VALUES (?,?,?,?)")
        .bind(uuid.to_string())
        .bind(auth_id)
        .bind(&handle)
        .bind(&alias)
        .execute(db_pool)
        .await?;

    Ok(sqlx::query_as("SELECT * FROM profiles WHERE auth_id=?")
        .bind(auth_id)
        .fetch_one(db_pool)
        .await?)
}

#[cfg(test)]
mod tests {
    use crate::db;

    #[tokio::test]
    async fn gate_redirects_until_onboarded() {
        let pool = db::memory_pool().await;
        let profile = super::resolve_profile(&pool, "ext:abc").await.unwrap();
        assert!(super::onboarding_gate(&profile).is_some());

        sqlx::query("UPDATE profiles SET onboarded=TRUE WHERE uuid=?")
            .bind(&profile.uuid)
            .execute(&pool)
            .await
            .unwrap();
        let profile = super::resolve_profile(&pool, "ext:abc").await.unwrap();
        assert!(super::onboarding_gate(&profile).is_none());
    }

    #[tokio::test]
    async fn first_contact_creates_a_not_onboarded_profile() {
        let pool = db::memory_pool().await;
        let profile = super::resolve_profile(&pool, "ext:abc").await.unwrap();
        assert_eq!(profile.auth_id, "ext:abc");
        assert!(!profile.onboarded);
        assert!(profile.handle.starts_with("user"));
    }

    #[tokio::test]
    async fn resolving_twice_reuses_the_same_profile() {
        let pool = db::memory_pool().await;
        let first = super::resolve_profile(&pool, "ext:abc").await.unwrap();
        let second = super::resolve_profile(&pool, "ext:abc").await.unwrap();
        assert_eq!(first.uuid, second.uuid);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
