use auth::Identity;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::credential::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;
use crate::session::models::SessionKey;

/// Header carrying the session id between client and server
pub static SESSION_HEADER: HeaderName = HeaderName::from_static("x-session-id");

/// Extension type to store the authenticated caller in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub identity: Identity,
}

/// Middleware that attaches a `SessionKey` to every request.
///
/// Requests without an `X-Session-Id` header start a new session; the id in
/// use is always echoed back in the response header.
pub async fn session_scope(mut req: Request, next: Next) -> Result<Response, Response> {
    let session = match req.headers().get(&SESSION_HEADER) {
        None => {
            let session = SessionKey::new();
            tracing::debug!(session = %session, "Starting new session");
            session
        }
        Some(value) => {
            let raw = value.to_str().map_err(|_| invalid_session_header())?;
            SessionKey::from_string(raw).map_err(|e| {
                tracing::debug!(error = %e, "Rejected session header");
                invalid_session_header()
            })?
        }
    };

    req.extensions_mut().insert(session);

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&session.to_string()) {
        response.headers_mut().insert(SESSION_HEADER.clone(), value);
    }

    Ok(response)
}

fn invalid_session_header() -> Response {
    ApiError::BadRequest("Invalid X-Session-Id header".to_string()).into_response()
}

/// Middleware that validates bearer tokens and adds the caller to request extensions
pub async fn require_authentication(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req)?;

    let claims = state.authenticator.validator().decode(token).map_err(|e| {
        tracing::warn!(error = %e, "Bearer token rejected");
        ApiError::Unauthorized("Invalid or expired token".to_string()).into_response()
    })?;

    let user_id = UserId::from_string(&claims.sub).map_err(|e| {
        tracing::warn!(error = %e, "Bearer token subject is not a user id");
        ApiError::Unauthorized("Invalid token format".to_string()).into_response()
    })?;

    req.extensions_mut().insert(AuthenticatedUser {
        user_id,
        identity: Identity::from_claims(claims),
    });

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, Response> {
    let auth_header = req.headers().get(header::AUTHORIZATION).ok_or_else(|| {
        ApiError::Unauthorized("Missing Authorization header".to_string()).into_response()
    })?;

    let auth_str = auth_header.to_str().map_err(|_| {
        ApiError::Unauthorized("Invalid Authorization header".to_string()).into_response()
    })?;

    auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthorized(
            "Invalid Authorization header format. Expected: Bearer <token>".to_string(),
        )
        .into_response()
    })
}
