pub mod assistant;
pub mod llm;
pub mod openai;
pub mod rules;

pub use assistant::AssistantService;
pub use llm::LanguageModel;
pub use openai::OpenAiClient;
