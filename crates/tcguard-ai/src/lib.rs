//! LLM layer: the [`ModelClient`] seam, a Gemini HTTP client, prompt
//! construction, and the services built on them.

pub mod analysis;
pub mod chat;
pub mod gemini;
pub mod model;
pub mod negotiation;
pub mod prompt;

pub use analysis::{AnalysisError, AnalysisOutcome, AnalysisService, AnalysisSource};
pub use chat::{ChatError, ChatRequest, ChatResponse, ChatService, HistoryEntry};
pub use gemini::GeminiClient;
pub use model::{ChatTurn, ModelClient, ModelConfig, ModelError, ModelRequest};
pub use negotiation::{EmailDraft, NegotiationError, NegotiationService};
