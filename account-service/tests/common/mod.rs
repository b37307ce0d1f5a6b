use std::sync::Arc;

use account_service::account::models::PasswordPolicy;
use account_service::account::service::AccountService;
use account_service::inbound::http::router::create_router;
use account_service::repositories::InMemoryAccountRepository;
use auth::Authenticator;
use auth::HashCost;
use auth::JwtHandler;
use reqwest::StatusCode;
use serde_json::json;
use serde_json::Value;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Header the service reads session tokens from
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub jwt_handler: JwtHandler,
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

        // Minimal Argon2 cost keeps the suite fast
        let authenticator = Authenticator::new(TEST_SECRET)
            .with_hash_cost(HashCost {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            })
            .expect("Failed to configure hash cost");

        let account_service = Arc::new(AccountService::new(
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(authenticator),
            PasswordPolicy::default(),
        ));

        let router = create_router(account_service);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::new(),
            jwt_handler: JwtHandler::new(TEST_SECRET),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make PUT request
    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.put(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with the session token header
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).header(TOKEN_HEADER, token)
    }

    /// Helper to make POST request with the session token header
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).header(TOKEN_HEADER, token)
    }

    /// Helper to make PUT request with the session token header
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.put(path).header(TOKEN_HEADER, token)
    }

    /// Register an account and return its session token
    pub async fn register(&self, username: &str, email: &str, password: &str) -> String {
        let response = self
            .post("/api/auth/register")
            .json(&json!({
                "username": username,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::CREATED);

        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }
}
