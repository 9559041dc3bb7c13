use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::credential::errors::CredentialError;
use crate::credential::models::CredentialRecord;
use crate::credential::models::EmailAddress;
use crate::credential::models::NewPassword;
use crate::credential::models::RegisterCommand;
use crate::credential::ports::AuthenticationServicePort;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequestBody>,
) -> Result<ApiSuccess<RegisteredUserData>, ApiError> {
    let command = body.try_into_domain()?;

    let record = state.auth_service.register(command).await?;

    Ok(ApiSuccess::new(StatusCode::CREATED, (&record).into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequestBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm_password: String,
    display_name: Option<String>,
    #[serde(default)]
    accept_terms: bool,
}

impl RegisterRequestBody {
    fn try_into_domain(self) -> Result<RegisterCommand, ApiError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(CredentialError::MissingCredentials.into());
        }

        if !self.accept_terms {
            return Err(ApiError::UnprocessableEntity(
                "Terms and conditions must be accepted".to_string(),
            ));
        }

        let email = EmailAddress::new(&self.email).map_err(CredentialError::from)?;
        let password =
            NewPassword::new(self.password, &self.confirm_password).map_err(CredentialError::from)?;

        Ok(RegisterCommand {
            email,
            password,
            display_name: self.display_name,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredUserData {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<&CredentialRecord> for RegisteredUserData {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            id: record.user_id.to_string(),
            email: record.email.as_str().to_string(),
            display_name: record.display_name.clone(),
            role: record.role.clone(),
            created_at: record.created_at,
        }
    }
}
