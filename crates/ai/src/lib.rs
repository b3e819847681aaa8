//! `tinkerscout-ai`
//!
//! **Responsibility:** the boundary to the external intelligence provider.
//!
//! - `client`: the `IntelligenceClient` seam and its error type
//! - `gemini`: the production client (Gemini `generateContent`)
//! - `parser`: structural validation of the untrusted reply
//! - `prompt`: the instruction payload per scan variant
//!
//! Nothing here touches storage or notifications.

pub mod client;
pub mod gemini;
pub mod parser;
pub mod prompt;

pub use client::{IntelligenceClient, UpstreamError};
pub use gemini::{GeminiClient, GeminiConfig};
pub use parser::{parse_batch, strip_code_fences, MalformedResponseError};
pub use prompt::{ScanVariant, UnknownVariant};
