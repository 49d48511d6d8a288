pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::AssistantError;
pub use models::*;
pub use router::{ai_routes, ai_routes_with_service};
pub use services::{AssistantService, LanguageModel, OpenAiClient};
