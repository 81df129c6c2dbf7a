//! User endpoints

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::db::UserRepo;
use crate::http::error::ApiError;
use crate::http::extractors::DbConn;
use crate::models::{Nickname, User};
use crate::state::AppState;

/// Create user request
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
}

/// Which fail-fast helper serves a lookup
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LookupMethod {
    /// Repository on the scoped connection
    #[default]
    Model,
    /// `first_or_not_found` on the scoped connection
    Conn,
    /// `first_or_not_found` on the bound engine
    Bind,
}

#[derive(Deserialize)]
pub struct LookupParams {
    #[serde(default)]
    pub method: LookupMethod,
}

/// GET /users/{uid}
async fn get_user(
    State(state): State<AppState>,
    conn: DbConn,
    Path(uid): Path<i64>,
    Query(params): Query<LookupParams>,
) -> Result<Json<User>, ApiError> {
    let user = match params.method {
        LookupMethod::Model => UserRepo::new(&conn).get_or_not_found(uid).await?,
        LookupMethod::Conn => conn.first_or_not_found(User::by_id(uid)).await?,
        LookupMethod::Bind => state.db().first_or_not_found(User::by_id(uid)).await?,
    };
    Ok(Json(user))
}

/// POST /users
async fn add_user(
    conn: DbConn,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let nickname = req.name.as_deref().map(Nickname::new).transpose()?;
    let user = UserRepo::new(&conn).create(nickname.as_ref()).await?;

    Ok(Json(user))
}

/// User routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(add_user))
        .route("/users/{uid}", get(get_user))
}
