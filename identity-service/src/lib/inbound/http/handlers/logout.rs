use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiSuccess;
use crate::credential::ports::AuthenticationServicePort;
use crate::inbound::http::router::AppState;
use crate::session::models::SessionKey;

/// Idempotent: logging out an unknown or anonymous session also succeeds.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
) -> ApiSuccess<LogoutResponseData> {
    state.auth_service.logout(&session).await;

    ApiSuccess::new(StatusCode::OK, LogoutResponseData { logged_out: true })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoutResponseData {
    pub logged_out: bool,
}
