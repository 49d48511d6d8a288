use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use shared_config::{AppConfig, StoreBackend};
use shared_models::auth::User;

use crate::jwt::{build_claims, issue_token};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_api_key: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_api_key: "test-api-key".to_string(),
            openai_api_key: None,
            openai_base_url: "http://localhost:1".to_string(),
        }
    }
}

impl TestConfig {
    /// Points the Supabase store at a mock server.
    pub fn with_supabase(mut self, url: &str) -> Self {
        self.supabase_url = url.to_string();
        self
    }

    /// Enables the language model against a mock server.
    pub fn with_openai(mut self, url: &str, api_key: &str) -> Self {
        self.openai_base_url = url.to_string();
        self.openai_api_key = Some(api_key.to_string());
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            store_backend: StoreBackend::Memory,
            supabase_url: self.supabase_url.clone(),
            supabase_api_key: self.supabase_api_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            openai_api_key: self.openai_api_key.clone(),
            openai_base_url: self.openai_base_url.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "doctor".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn receptionist(email: &str) -> Self {
        Self::new(email, "receptionist")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let claims = build_claims(
            &user.id,
            Some(&user.email),
            Some(&user.role),
            exp_hours.unwrap_or(24),
        );
        issue_token(&claims, secret).expect("test secret must not be empty")
    }

    /// `Authorization` header value for a fresh doctor token.
    pub fn bearer_header(config: &AppConfig) -> String {
        let user = TestUser::doctor("doctor@clinic.com");
        format!("Bearer {}", Self::create_test_token(&user, &config.jwt_secret, Some(1)))
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}
