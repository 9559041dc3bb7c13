use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::credential::errors::CredentialError;
use crate::credential::models::ChangePasswordCommand;
use crate::credential::models::NewPassword;
use crate::credential::ports::AuthenticationServicePort;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn change_password(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(body): Json<ChangePasswordRequestBody>,
) -> Result<ApiSuccess<PasswordChangedData>, ApiError> {
    if body.current_password.is_empty() {
        return Err(ApiError::BadRequest(
            "Current password is required".to_string(),
        ));
    }

    let new_password =
        NewPassword::new(body.new_password, &body.confirm_password).map_err(CredentialError::from)?;

    state
        .auth_service
        .change_password(
            &caller.user_id,
            ChangePasswordCommand {
                current_password: body.current_password,
                new_password,
            },
        )
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        PasswordChangedData { changed: true },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangePasswordRequestBody {
    #[serde(default)]
    current_password: String,
    #[serde(default)]
    new_password: String,
    #[serde(default)]
    confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordChangedData {
    pub changed: bool,
}
