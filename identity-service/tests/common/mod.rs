use std::sync::Arc;

use auth::Authenticator;
use auth::TokenOptions;
use identity_service::credential::service::AuthenticationService;
use identity_service::inbound::http::router::create_router;
use identity_service::repositories::InMemoryCredentialRepository;
use identity_service::session::models::SessionKey;
use identity_service::session::state::SessionAuthState;
use identity_service::session::state::SessionSettings;
use identity_service::stores::InMemorySessionTokenStore;
use serde_json::json;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const SESSION_HEADER: &str = "x-session-id";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub session_store: Arc<InMemorySessionTokenStore>,
    pub sessions: Arc<SessionAuthState<InMemorySessionTokenStore>>,
    pub authenticator: Arc<Authenticator>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let authenticator = Arc::new(Authenticator::new(TEST_SECRET, TokenOptions::default()));

        let session_store = Arc::new(InMemorySessionTokenStore::new());
        let sessions = Arc::new(SessionAuthState::new(
            Arc::clone(&session_store),
            authenticator.validator(),
            SessionSettings::default(),
        ));

        let auth_service = Arc::new(AuthenticationService::new(
            Arc::new(InMemoryCredentialRepository::new()),
            Arc::clone(&authenticator),
            Arc::clone(&sessions),
        ));

        let router = create_router(auth_service, Arc::clone(&authenticator));

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::new(),
            session_store,
            sessions,
            authenticator,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request within a session
    pub fn get_in_session(&self, path: &str, session: &SessionKey) -> reqwest::RequestBuilder {
        self.get(path).header(SESSION_HEADER, session.to_string())
    }

    /// Helper to make POST request within a session
    pub fn post_in_session(&self, path: &str, session: &SessionKey) -> reqwest::RequestBuilder {
        self.post(path).header(SESSION_HEADER, session.to_string())
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Register an account, panicking on failure
    pub async fn register(&self, email: &str, password: &str) -> serde_json::Value {
        let response = self
            .post("/api/auth/register")
            .json(&json!({
                "email": email,
                "password": password,
                "confirm_password": password,
                "accept_terms": true
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }

    /// Log in within a session and return the issued token
    pub async fn login(&self, session: &SessionKey, email: &str, password: &str) -> String {
        let response = self
            .post_in_session("/api/auth/login", session)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }
}
