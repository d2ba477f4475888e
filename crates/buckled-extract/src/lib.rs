//! Buckled Extract: turns free text and uploaded service documents into
//! `ExtractedServiceData` records via an OpenAI-compatible chat-completion
//! collaborator, with local normalization and heuristic fallbacks.

pub mod backend;
pub mod client;
pub mod config;
pub mod decode;
pub mod normalize;
pub mod prompts;
pub mod rate_limit;
pub mod records;
pub mod upload;

pub use backend::{BackendError, CompletionBackend, CompletionRequest, OpenRouterBackend};
pub use client::ExtractionClient;
pub use config::{ExtractionConfig, ExtractionConfigResponse, ExtractionConfigUpdate};
pub use normalize::{normalize, Normalized};
pub use rate_limit::RateLimiter;
pub use upload::{UploadedDocument, ALLOWED_MIME_TYPES};
