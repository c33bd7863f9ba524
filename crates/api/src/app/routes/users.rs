use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    response::{IntoResponse, Response},
};

use shopgate_auth::{AuthFailure, AuthenticatedIdentity};
use shopgate_core::UserId;

use crate::app::dto::{PageQuery, UserResponse};
use crate::app::{errors, services::AppServices};

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Query(page): Query<PageQuery>,
) -> Response {
    let (offset, limit) = page.bounds();
    match services.users.list(offset, limit).await {
        Ok(users) => Json(users.iter().map(UserResponse::from).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::store_error(e),
    }
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<AuthenticatedIdentity>,
) -> Response {
    match services.users.get_by_id(identity.user_id()).await {
        Ok(Some(user)) => Json(UserResponse::from(&user)).into_response(),
        // Valid credential for an account that no longer exists.
        Ok(None) => errors::reject(AuthFailure::UserNotFound),
        Err(e) => errors::store_error(e),
    }
}

pub async fn get(
    Extension(services): Extension<Arc<AppServices>>,
    Path(raw_id): Path<String>,
) -> Response {
    let id: UserId = match raw_id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error(e),
    };

    match services.users.get_by_id(id).await {
        Ok(Some(user)) => Json(UserResponse::from(&user)).into_response(),
        Ok(None) => errors::not_found("user not found"),
        Err(e) => errors::store_error(e),
    }
}
