use axum::response::{Html, IntoResponse, Response};

use crate::AppResult;

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Soft refusal page. Covers both "doesn't exist" and "you can't see it",
/// without telling the caller which one it was.
pub fn sorry(what: &str) -> AppResult<Response> {
    Ok(Html(
        include_res!(str, "/pages/sorry.html")
            .replace("{what}", what)
    ).into_response())
}

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
