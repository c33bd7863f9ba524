use axum::{Json, extract::Extension, response::IntoResponse};
use serde_json::json;

use shopgate_auth::AuthenticatedIdentity;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Identity exactly as carried by the credential. The role here is the
/// issuance-time role, not necessarily the stored one.
pub async fn whoami(Extension(identity): Extension<AuthenticatedIdentity>) -> impl IntoResponse {
    Json(json!({
        "user_id": identity.user_id(),
        "role": identity.role().as_str(),
    }))
}
