use std::sync::Arc;

use auth::Authenticator;
use identity_service::config::Config;
use identity_service::credential::service::AuthenticationService;
use identity_service::inbound::http::router::create_router;
use identity_service::repositories::InMemoryCredentialRepository;
use identity_service::session::state::spawn_idle_pruner;
use identity_service::session::state::SessionAuthState;
use identity_service::stores::InMemorySessionTokenStore;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const MIN_SECRET_LENGTH: usize = 32;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "identity_service=debug,auth=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        jwt_issuer = %config.jwt.issuer,
        jwt_audience = %config.jwt.audience,
        token_lifetime_hours = config.jwt.expiration_hours,
        password_iterations = config.password.iterations,
        store_timeout_ms = config.session.store_timeout_ms,
        idle_timeout_secs = config.session.idle_timeout_secs,
        "Configuration loaded"
    );

    if config.jwt.secret.len() < MIN_SECRET_LENGTH {
        tracing::warn!(
            length = config.jwt.secret.len(),
            minimum = MIN_SECRET_LENGTH,
            "JWT signing secret is shorter than recommended"
        );
    }

    let authenticator = Arc::new(
        Authenticator::new(config.jwt.secret.as_bytes(), config.token_options()?)
            .with_password_iterations(config.password_iterations()),
    );

    let session_store = Arc::new(InMemorySessionTokenStore::new());
    let sessions = Arc::new(SessionAuthState::new(
        session_store,
        authenticator.validator(),
        config.session_settings(),
    ));
    let _pruner = spawn_idle_pruner(&sessions, config.sweep_interval());

    let credential_repository = Arc::new(InMemoryCredentialRepository::new());
    let auth_service = Arc::new(AuthenticationService::new(
        credential_repository,
        Arc::clone(&authenticator),
        sessions,
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service, authenticator);

    if let Err(e) = axum::serve(http_listener, http_application).await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    tracing::info!("Server exited successfully");
    Ok(())
}
