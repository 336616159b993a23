//! # sage-core
//!
//! Provider-agnostic access to the language model that backs PortfolioSage,
//! plus the pieces needed to get *structured* answers out of it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       sage-core                               │
//! │  ┌──────────────┐  ┌────────────────┐  ┌──────────────────┐  │
//! │  │   Messages   │──│  LlmProvider   │──│  OutputSchema +  │  │
//! │  │ (system/user)│  │   (Strategy)   │  │  JSON extraction │  │
//! │  └──────────────┘  └────────────────┘  └──────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait lets the advisor run against Ollama, an
//! OpenAI-compatible endpoint, or the in-memory [`ScriptedProvider`] without
//! changing the calling code.

pub mod error;
pub mod message;
pub mod mock;
pub mod provider;
pub mod schema;

pub use error::{CoreError, Result};
pub use message::{Message, Role};
pub use mock::ScriptedProvider;
pub use provider::{Completion, GenerationOptions, LlmProvider, ResponseFormat};
pub use schema::{FieldSchema, FieldType, OutputSchema};
