//! Brand discovery, contact finding, and email drafting backed by a
//! generative search model.

pub mod client;
pub mod error;
pub mod gemini;
pub(crate) mod parse;
pub(crate) mod prompts;
pub(crate) mod types;

pub use client::{ContactResult, DiscoveryClient, DiscoveryResult, LookupResult};
pub use error::DiscoveryError;
pub use gemini::GeminiClient;
