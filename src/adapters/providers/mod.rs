//! Chat-completion provider adapters.

pub mod anthropic;
pub mod gemini;
pub mod guarded;
mod http;
pub mod openai;
pub mod router;
pub mod scripted;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use guarded::GuardedProvider;
pub use openai::OpenAiProvider;
pub use router::{ProviderKind, ProviderRouter};
pub use scripted::{RecordedCall, ScriptedProvider, ScriptedResponse};
