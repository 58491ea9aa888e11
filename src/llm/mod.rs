pub mod openai_like;
pub mod provider;
pub mod types;

pub use openai_like::OpenAiLikeProvider;
pub use provider::LlmProvider;
pub use types::{ChatMessage, ChatRequest};
