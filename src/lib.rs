pub mod activity;
pub mod appresult;
pub mod auth;
pub mod chirps;
pub mod communities;
pub mod db;
pub mod index;
pub mod onboard;
pub mod profiles;
pub mod res;
pub mod session;
pub mod validate;

use axum::extract::FromRef;
use serde_json::Value;
use sqlx::SqlitePool;

pub use appresult::{AppError, AppResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub clients: auth::Clients,
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> AppResult<String>;
    fn get_obj_field(&self, field: &str) -> AppResult<&Value>;
}

impl GetField for serde_json::Value {
    fn get_str_field(&self, field: &str) -> AppResult<String> {
        Ok(
            self.get(field)
            .ok_or(anyhow::anyhow!("expected {field} in {self}"))?
            .as_str()
            .ok_or(anyhow::anyhow!("expected {field} in {self} to be string"))?
            .to_owned()
        )
    }

    fn get_obj_field(&self, field: &str) -> AppResult<&Value> {
        Ok(
            self.get(field)
            .ok_or(anyhow::anyhow!("expected {field} in {self}"))?
        )
    }
}
