use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::change_password::change_password;
use super::handlers::current_user::current_user;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::register::register;
use super::middleware::require_authentication;
use super::middleware::session_scope;
use crate::domain::credential::service::AuthenticationService;
use crate::outbound::repositories::credential::InMemoryCredentialRepository;
use crate::outbound::stores::memory::InMemorySessionTokenStore;

pub type IdentityAuthService =
    AuthenticationService<InMemoryCredentialRepository, InMemorySessionTokenStore>;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<IdentityAuthService>,
    pub authenticator: Arc<Authenticator>,
}

pub fn create_router(
    auth_service: Arc<IdentityAuthService>,
    authenticator: Arc<Authenticator>,
) -> Router {
    let state = AppState {
        auth_service,
        authenticator,
    };

    let public_routes = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(current_user));

    let protected_routes = Router::new()
        .route("/api/auth/password", post(change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_authentication,
        ));

    // Headers are left out of the span: they carry bearer tokens
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(session_scope))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
