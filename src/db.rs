use sqlx::SqlitePool;

use crate::AppResult;

/// A user profile, created lazily on first sign-in and completed during
/// onboarding. `auth_id` is the external provider's stable id.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Profile {
    pub uuid: String,
    pub auth_id: String,

    pub handle: String,
    pub alias: String,
    pub bio: String,
    pub avatar_url: String,

    pub email: String,
    pub website: String,
    pub location: String,
    pub date_of_birth: String,

    pub onboarded: bool,

    // unique: uuid
    // unique: auth_id
    // unique: handle
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Chirp {
    pub uuid: String,
    pub author_id: String,
    pub community_id: Option<String>,
    pub parent_id: Option<String>,

    pub body: String,
    pub created_at: i64,

    // unique: uuid
    // children are derived: SELECT ... WHERE parent_id=?
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Community {
    pub uuid: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub creator_id: String,

    // unique: uuid
    // unique: slug
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    File,
    Audio,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        use AttachmentKind::*;
        match self {
            Image => "image",
            File => "file",
            Audio => "audio",
        }
    }

    pub fn parse(s: &str) -> Option<AttachmentKind> {
        use AttachmentKind::*;
        match s {
            "image" => Some(Image),
            "file" => Some(File),
            "audio" => Some(Audio),
            _ => None,
        }
    }
}

/// Schema bootstrap. Idempotent, so it runs on every boot and in tests
/// against `sqlite::memory:`.
pub async fn init(db_pool: &SqlitePool) -> AppResult<()> {
    sqlx::raw_sql(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            uuid TEXT PRIMARY KEY,
            auth_id TEXT NOT NULL UNIQUE,
            handle TEXT NOT NULL UNIQUE,
            alias TEXT NOT NULL,
            bio TEXT NOT NULL DEFAULT '',
            avatar_url TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '',
            website TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            date_of_birth TEXT NOT NULL DEFAULT '',
            onboarded BOOLEAN NOT NULL DEFAULT FALSE
        );

        CREATE TABLE IF NOT EXISTS chirps (
            uuid TEXT PRIMARY KEY,
            author_id TEXT NOT NULL REFERENCES profiles(uuid),
            community_id TEXT REFERENCES communities(uuid),
            parent_id TEXT REFERENCES chirps(uuid),
            body TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chirp_likes (
            chirp_id TEXT NOT NULL REFERENCES chirps(uuid),
            profile_id TEXT NOT NULL REFERENCES profiles(uuid),
            PRIMARY KEY (chirp_id, profile_id)
        );

        CREATE TABLE IF NOT EXISTS chirp_shares (
            chirp_id TEXT NOT NULL REFERENCES chirps(uuid),
            profile_id TEXT NOT NULL REFERENCES profiles(uuid),
            PRIMARY KEY (chirp_id, profile_id)
        );

        CREATE TABLE IF NOT EXISTS chirp_hashtags (
            chirp_id TEXT NOT NULL REFERENCES chirps(uuid),
            tag TEXT NOT NULL,
            PRIMARY KEY (chirp_id, tag)
        );

        CREATE TABLE IF NOT EXISTS chirp_mentions (
            chirp_id TEXT NOT NULL REFERENCES chirps(uuid),
            profile_id TEXT NOT NULL REFERENCES profiles(uuid),
            handle TEXT NOT NULL,
            PRIMARY KEY (chirp_id, profile_id)
        );

        CREATE TABLE IF NOT EXISTS chirp_attachments (
            chirp_id TEXT NOT NULL REFERENCES chirps(uuid),
            kind TEXT NOT NULL,
            url TEXT NOT NULL,
            filename TEXT,
            size INTEGER
        );

        CREATE TABLE IF NOT EXISTS communities (
            uuid TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            creator_id TEXT NOT NULL REFERENCES profiles(uuid)
        );

        CREATE TABLE IF NOT EXISTS community_members (
            community_id TEXT NOT NULL REFERENCES communities(uuid),
            profile_id TEXT NOT NULL REFERENCES profiles(uuid),
            role TEXT NOT NULL DEFAULT 'member',
            PRIMARY KEY (community_id, profile_id)
        );

        CREATE TABLE IF NOT EXISTS follows (
            follower_id TEXT NOT NULL REFERENCES profiles(uuid),
            followee_id TEXT NOT NULL REFERENCES profiles(uuid),
            created_at INTEGER NOT NULL,
            PRIMARY KEY (follower_id, followee_id)
        );
        "#,
    )
    .execute(db_pool)
    .await?;

    Ok(())
}

pub fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    use sqlx::sqlite::SqlitePoolOptions;

    // one connection, or each checkout would see a fresh :memory: db
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init(&pool).await.unwrap();
    pool
}
