//! Landing endpoint

use axum::{routing::get, Router};

/// GET / - never touches the database
async fn index() -> &'static str {
    "Hello, world!"
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/", get(index))
}
