use axum::{routing::get, Router};
use chirp::{activity, auth, chirps, communities, db, index, onboard, profiles, AppState};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::cors::CorsLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "chirp=info".into()))
        .init();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(30)));

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(dotenv::var("DATABASE_URL")?.as_str())
        .await?;
    db::init(&db_pool).await.map_err(|e| e.0)?;

    let base_url = dotenv::var("BASE_URL").unwrap_or("http://localhost:8080".to_owned());
    let client_secret = std::fs::read_to_string(dotenv::var("CLIENT_SECRET_FILE")?)?;
    let clients = auth::Clients::from_json(serde_json::from_str(&client_secret)?, &base_url)
        .map_err(|e| e.0)?;

    let app_state = AppState { db_pool, clients };

    let app = Router::new()
        .route("/", get(index::index))
        .route("/activity", get(activity::activity))
        .route("/tags/{tag}", get(chirps::tag_page))

        .merge(auth::router())
        .merge(onboard::router())
        .nest("/c", chirps::router())
        .nest("/p", profiles::router())
        .nest("/g", communities::router())

        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive());

    let bind_addr = dotenv::var("BIND_ADDR").unwrap_or("0.0.0.0:8080".to_owned());
    tracing::info!("listening on {bind_addr}");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
