//! Lookup page.

use crate::state::AppState;
use axum::{response::Html, routing::get, Router};

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Creates the index router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// Serves a single-page form that queries `/order/{order_uid}`.
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
