use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::IdentityData;
use crate::credential::models::LoginCommand;
use crate::credential::ports::AuthenticationServicePort;
use crate::inbound::http::router::AppState;
use crate::session::models::SessionKey;

pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
    Json(body): Json<LoginRequestBody>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    let command = LoginCommand::new(body.email, body.password)?;

    let outcome = state.auth_service.login(&session, command).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        LoginResponseData {
            user: (&outcome.identity).into(),
            token: outcome.token,
            expires_at: outcome.expires_at,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequestBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub user: IdentityData,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
