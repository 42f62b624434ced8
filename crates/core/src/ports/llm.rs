//! LLM port: the single text-completion call both C5 (summary generation)
//! and C8 (context assembly) depend on.

use async_trait::async_trait;
use tsic_domain::Result;

/// One message in a chat-style completion request.
#[derive(Debug, Clone)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

/// Message role, mirroring the common chat-completion shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmRole {
    System,
    User,
    Assistant,
}

/// Chat-completion boundary. Concrete implementations in `tsic-infra`
/// enforce the 60s deadline from the concurrency model.
#[async_trait]
pub trait LlmPort: Send + Sync {
    /// Run one completion over `messages`, returning the raw text response.
    async fn complete(&self, messages: Vec<LlmMessage>) -> Result<String>;
}
