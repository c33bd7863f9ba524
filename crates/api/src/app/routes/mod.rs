use axum::{
    Router,
    routing::{get, post, put},
};

use shopgate_auth::Role;

use crate::pipeline::{Gates, Pipeline, PipelineError};

pub mod admin;
pub mod auth;
pub mod sessions;
pub mod system;
pub mod users;

/// All routes, each group behind its own stage pipeline.
pub fn router(gates: &Gates) -> Result<Router, PipelineError> {
    let public = Pipeline::new().handle(
        Router::new()
            .route("/health", get(system::health))
            .route("/auth/login", post(auth::login))
            .route("/auth/register", post(auth::register))
            .route(
                "/api/sessions",
                post(sessions::create).delete(sessions::delete),
            ),
        gates,
    )?;

    let session = Pipeline::new()
        .authenticate_session()
        .handle(Router::new().route("/api/sessions", get(sessions::current)), gates)?;

    let authenticated = Pipeline::new().authenticate().handle(
        Router::new()
            .route("/whoami", get(system::whoami))
            .route("/users", get(users::list))
            .route("/users/me", get(users::me))
            .route("/users/:id", get(users::get)),
        gates,
    )?;

    let admin = Pipeline::new()
        .authenticate()
        .authorize_role(Role::ADMIN)
        .handle(
            Router::new()
                .route("/admin/users", get(admin::list_users))
                .route("/admin/users/:id/role", put(admin::update_role)),
            gates,
        )?;

    Ok(public.merge(session).merge(authenticated).merge(admin))
}
