use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

const DEV_JWT_SECRET: &str = "clinic-development-secret-change-me";

/// Which record store backs the cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Supabase,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "supabase" | "postgrest" => Ok(StoreBackend::Supabase),
            other => Err(format!("Unknown store backend '{}': expected memory or supabase", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub store_backend: StoreBackend,
    pub supabase_url: String,
    pub supabase_api_key: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub login_email: String,
    pub login_password: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_transcription_model: String,
    pub queue_enqueue_max_attempts: u32,
    pub queue_average_consult_minutes: u32,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            store_backend: StoreBackend::Memory,
            supabase_url: String::new(),
            supabase_api_key: String::new(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            login_email: "doctor@clinic.com".to_string(),
            login_password: "admin".to_string(),
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            openai_transcription_model: "whisper-1".to_string(),
            queue_enqueue_max_attempts: 3,
            queue_average_consult_minutes: 10,
            cors_allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            port: parse_var("PORT", defaults.port),
            store_backend: parse_var("STORE_BACKEND", defaults.store_backend),
            supabase_url: env::var("SUPABASE_URL").unwrap_or_default(),
            supabase_api_key: env::var("SUPABASE_API_KEY").unwrap_or_default(),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using the development secret");
                    defaults.jwt_secret.clone()
                }),
            token_ttl_hours: parse_var("TOKEN_TTL_HOURS", defaults.token_ttl_hours),
            login_email: env::var("CLINIC_LOGIN_EMAIL").unwrap_or(defaults.login_email),
            login_password: env::var("CLINIC_LOGIN_PASSWORD")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_LOGIN_PASSWORD not set, using default credentials");
                    defaults.login_password.clone()
                }),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|key| !key.is_empty()),
            openai_base_url: env::var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_transcription_model: env::var("OPENAI_TRANSCRIPTION_MODEL")
                .unwrap_or(defaults.openai_transcription_model),
            queue_enqueue_max_attempts: parse_var(
                "QUEUE_ENQUEUE_MAX_ATTEMPTS",
                defaults.queue_enqueue_max_attempts,
            )
            .max(1),
            queue_average_consult_minutes: parse_var(
                "QUEUE_AVERAGE_CONSULT_MINUTES",
                defaults.queue_average_consult_minutes,
            ),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_allowed_origins),
        };

        if config.store_backend == StoreBackend::Supabase && !config.is_supabase_configured() {
            warn!("STORE_BACKEND=supabase but SUPABASE_URL or SUPABASE_API_KEY is missing");
        }

        if config.openai_api_key.is_none() {
            warn!("OPENAI_API_KEY not set, AI assistant will use rule-based fallbacks");
        }

        config
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_api_key.is_empty()
    }

    pub fn is_ai_configured(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Ignoring invalid {}={:?}: {}", name, raw, e);
            default
        }),
        Err(_) => default,
    }
}
