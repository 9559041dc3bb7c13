use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::IdentityData;
use crate::credential::ports::AuthenticationServicePort;
use crate::inbound::http::router::AppState;
use crate::session::models::SessionKey;

pub async fn current_user(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
) -> Result<ApiSuccess<IdentityData>, ApiError> {
    let identity = state
        .auth_service
        .current_user(&session)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    Ok(ApiSuccess::new(StatusCode::OK, (&identity).into()))
}
