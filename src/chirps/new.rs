use axum::{debug_handler, extract::{Query, State}, response::{Html, IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{auth, db, include_res, res, validate::{self, AttachmentSubmission, ChirpSubmission, ValidChirp}, AppResult};

// parent rides along as a string: browsers submit hidden fields even when
// empty, which must mean "no parent" rather than a deserialization error
#[derive(Deserialize)]
pub(crate) struct NewChirpQuery {
    parent: Option<String>,
    community: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewChirpForm {
    chirp: String,
    parent: Option<String>,
    community: Option<String>,

    // one out-of-band upload per compose; the model itself takes many
    attachment_kind: Option<String>,
    attachment_url: Option<String>,
    attachment_filename: Option<String>,
}

#[debug_handler]
pub(crate) async fn new_chirp_page(
    Query(NewChirpQuery { parent, community }): Query<NewChirpQuery>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = auth::current_profile(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login?return_url=/c/new").into_response());
    };
    if let Some(gate) = auth::onboarding_gate(&me) {
        return Ok(gate.into_response());
    }

    Ok(Html(
        include_res!(str, "/pages/chirps/new.html")
            .replace("{parent}", &res::escape(&parent.unwrap_or_default()))
            .replace("{community}", &res::escape(&community.unwrap_or_default()))
    ).into_response())
}

#[debug_handler]
pub(crate) async fn new_chirp(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<NewChirpForm>,
) -> AppResult<Response> {
    let Some(me) = auth::current_profile(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login?return_url=/c/new").into_response());
    };
    if let Some(gate) = auth::onboarding_gate(&me) {
        return Ok(gate.into_response());
    }

    let (hashtags, mentions) = validate::extract_entities(&form.chirp);
    let mut attachments = Vec::new();
    if let (Some(kind), Some(url)) = (form.attachment_kind, form.attachment_url) {
        if !kind.is_empty() || !url.is_empty() {
            attachments.push(AttachmentSubmission {
                kind,
                url,
                filename: form.attachment_filename,
                size: None,
            });
        }
    }

    let chirp = match validate::validate(ChirpSubmission {
        body: form.chirp,
        hashtags,
        mentions,
        attachments,
    }) {
        Ok(chirp) => chirp,
        Err(errors) => return Ok(errors.into_response()),
    };

    let community_id = match form.community.filter(|c| !c.is_empty()) {
        Some(slug) => {
            let found: Option<(String,)> =
                sqlx::query_as("SELECT uuid FROM communities WHERE slug=?")
                    .bind(&slug)
                    .fetch_optional(&db_pool)
                    .await?;
            let Some((uuid,)) = found else {
                return res::sorry("community");
            };
            Some(uuid)
        }
        None => None,
    };

    let parent_id = match form.parent.filter(|p| !p.is_empty()) {
        Some(parent) => {
            let found: Option<(String,)> =
                sqlx::query_as("SELECT uuid FROM chirps WHERE uuid=?")
                    .bind(&parent)
                    .fetch_optional(&db_pool)
                    .await?;
            let Some((uuid,)) = found else {
                return res::sorry("chirp");
            };
            Some(uuid)
        }
        None => None,
    };

    let uuid = create_chirp(&db_pool, &me.uuid, community_id.as_deref(), parent_id.as_deref(), chirp).await?;

    Ok(Redirect::to(&format!("/c/{uuid}")).into_response())
}

/// Persists a validated chirp and its side entities. Mentions resolve
/// against profiles at creation time; handles that resolve to nobody are
/// dropped. Returns the new chirp's id.
pub async fn create_chirp(
    db_pool: &SqlitePool,
    author_id: &str,
    community_id: Option<&str>,
    parent_id: Option<&str>,
    chirp: ValidChirp,
) -> AppResult<String> {
    let uuid = Uuid::now_v7().to_string();

    sqlx::query("INSERT INTO chirps (uuid,author_id,community_id,parent_id,body,created_at) VALUES (?,?,?,?,?,?)")
        .bind(&uuid)
        .bind(author_id)
        .bind(community_id)
        .bind(parent_id)
        .bind(&chirp.body)
        .bind(db::now())
        .execute(db_pool)
        .await?;

    for tag in &chirp.hashtags {
        sqlx::query("INSERT OR IGNORE INTO chirp_hashtags (chirp_id,tag) VALUES (?,?)")
            .bind(&uuid)
            .bind(tag)
            .execute(db_pool)
            .await?;
    }

    for handle in &chirp.mentions {
        let target: Option<(String,)> =
            sqlx::query_as("SELECT uuid FROM profiles WHERE handle=?")
                .bind(handle)
                .fetch_optional(db_pool)
                .await?;
        let Some((profile_id,)) = target else {
            tracing::debug!("mention @{handle} resolves to nobody, dropping");
            continue;
        };
        // handle is denormalized as it read at creation time
        sqlx::query("INSERT OR IGNORE INTO chirp_mentions (chirp_id,profile_id,handle) VALUES (?,?,?)")
            .bind(&uuid)
            .bind(&profile_id)
            .bind(handle)
            .execute(db_pool)
            .await?;
    }

    for att in &chirp.attachments {
        sqlx::query("INSERT INTO chirp_attachments (chirp_id,kind,url,filename,size) VALUES (?,?,?,?,?)")
            .bind(&uuid)
            .bind(att.kind.as_str())
            .bind(&att.url)
            .bind(&att.filename)
            .bind(att.size)
            .execute(db_pool)
            .await?;
    }

    tracing::info!("chirp {uuid} by {author_id}");
    Ok(uuid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth, db, validate};

    async fn onboarded_profile(pool: &SqlitePool, auth_id: &str, handle: &str) -> String {
        let profile = auth::resolve_profile(pool, auth_id).await.unwrap();
        sqlx::query("UPDATE profiles SET handle=?, onboarded=TRUE WHERE uuid=?")
            .bind(handle)
            .bind(&profile.uuid)
            .execute(pool)
            .await
            .unwrap();
        profile.uuid
    }

    fn valid(body: &str) -> ValidChirp {
        validate::validate(ChirpSubmission {
            body: body.to_owned(),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn compose_form_accepts_empty_hidden_fields() {
        use axum::extract::FromRequest;

        // a top-level chirp posted from the compose page: the hidden
        // parent field is present but empty
        let req = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(axum::body::Body::from(
                "chirp=Hello+world&parent=&community=&attachment_kind=&attachment_url=&attachment_filename=",
            ))
            .unwrap();

        let axum::Form(form) = axum::Form::<NewChirpForm>::from_request(req, &())
            .await
            .expect("empty hidden fields must deserialize");
        assert_eq!(form.chirp, "Hello world");
        assert_eq!(form.parent.filter(|p| !p.is_empty()), None);
        assert_eq!(form.community.filter(|c| !c.is_empty()), None);
    }

    #[tokio::test]
    async fn chirp_gets_a_server_timestamp() {
        let pool = db::memory_pool().await;
        let author = onboarded_profile(&pool, "ext:a", "alice").await;

        let before = db::now();
        let uuid = create_chirp(&pool, &author, None, None, valid("Hello world")).await.unwrap();

        let (created_at,): (i64,) =
            sqlx::query_as("SELECT created_at FROM chirps WHERE uuid=?")
                .bind(&uuid)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(created_at >= before);
    }

    #[tokio::test]
    async fn reply_appears_exactly_once_among_parent_children() {
        let pool = db::memory_pool().await;
        let author = onboarded_profile(&pool, "ext:a", "alice").await;

        let parent = create_chirp(&pool, &author, None, None, valid("parent post")).await.unwrap();
        let reply = create_chirp(&pool, &author, None, Some(&parent), valid("a reply")).await.unwrap();

        let children: Vec<(String,)> =
            sqlx::query_as("SELECT uuid FROM chirps WHERE parent_id=?")
                .bind(&parent)
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(children, vec![(reply,)]);
    }

    #[tokio::test]
    async fn mention_stores_target_and_denormalized_handle() {
        let pool = db::memory_pool().await;
        let author = onboarded_profile(&pool, "ext:a", "alice").await;
        let bob = onboarded_profile(&pool, "ext:b", "bob").await;

        let chirp = validate::validate(ChirpSubmission {
            body: "hey @bob".to_owned(),
            mentions: vec!["bob".to_owned()],
            ..Default::default()
        })
        .unwrap();
        let uuid = create_chirp(&pool, &author, None, None, chirp).await.unwrap();

        let (profile_id, handle): (String, String) =
            sqlx::query_as("SELECT profile_id,handle FROM chirp_mentions WHERE chirp_id=?")
                .bind(&uuid)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(profile_id, bob);
        assert_eq!(handle, "bob");
    }

    #[tokio::test]
    async fn unresolvable_mention_is_dropped() {
        let pool = db::memory_pool().await;
        let author = onboarded_profile(&pool, "ext:a", "alice").await;

        let chirp = validate::validate(ChirpSubmission {
            body: "hey @nobody".to_owned(),
            mentions: vec!["nobody".to_owned()],
            ..Default::default()
        })
        .unwrap();
        let uuid = create_chirp(&pool, &author, None, None, chirp).await.unwrap();

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chirp_mentions WHERE chirp_id=?")
                .bind(&uuid)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn hashtags_land_in_the_side_table() {
        let pool = db::memory_pool().await;
        let author = onboarded_profile(&pool, "ext:a", "alice").await;

        let chirp = validate::validate(ChirpSubmission {
            body: "all about #Rust".to_owned(),
            hashtags: vec!["Rust".to_owned()],
            ..Default::default()
        })
        .unwrap();
        let uuid = create_chirp(&pool, &author, None, None, chirp).await.unwrap();

        let (tag,): (String,) =
            sqlx::query_as("SELECT tag FROM chirp_hashtags WHERE chirp_id=?")
                .bind(&uuid)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(tag, "rust");
    }
}
