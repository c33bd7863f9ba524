//! Admin routes for user management.
//!
//! Mounted behind `Authenticate -> AuthorizeRole("admin")`; handlers can
//! assume the caller's stored role is `admin` at the time of the check.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    response::{IntoResponse, Response},
};

use shopgate_auth::{AuthenticatedIdentity, Role};
use shopgate_core::UserId;

use crate::app::dto::{PageQuery, UpdateRoleRequest, UserResponse};
use crate::app::routes::users;
use crate::app::{errors, services::AppServices};

pub async fn list_users(
    services: Extension<Arc<AppServices>>,
    page: Query<PageQuery>,
) -> Response {
    users::list(services, page).await
}

/// Change a user's stored role. Outstanding credentials keep their embedded
/// role, but the role gate sees the new one on the next request.
pub async fn update_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<AuthenticatedIdentity>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> Response {
    let id: UserId = match raw_id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error(e),
    };
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::bad_request(rejection.body_text()),
    };
    let role = match Role::parse_assignable(&req.role) {
        Ok(role) => role,
        Err(e) => return errors::domain_error(e),
    };

    match services.users.update_role(id, role, services.clock.now()).await {
        Ok(Some(user)) => {
            tracing::info!(actor = %actor.user_id(), user_id = %user.id, role = %user.role, "role changed");
            Json(UserResponse::from(&user)).into_response()
        }
        Ok(None) => errors::not_found("user not found"),
        Err(e) => errors::store_error(e),
    }
}
