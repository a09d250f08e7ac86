//! # advisor-core
//!
//! Provider-agnostic language-model abstraction for the coin advisor.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      coin-resolver                           │
//! │  ┌──────────────────┐            ┌────────────────────────┐  │
//! │  │ page extraction  │──prompt───▶│                        │  │
//! │  └──────────────────┘            │      LlmProvider       │  │
//! │  ┌──────────────────┐            │      (Strategy)        │  │
//! │  │ mention extract  │──prompt───▶│                        │  │
//! │  └──────────────────┘            └───────────┬────────────┘  │
//! └──────────────────────────────────────────────┼───────────────┘
//!                          advisory chat ────────┘
//! ```
//!
//! The `LlmProvider` trait lets the extraction steps and the advisory chat
//! run against Ollama, Gemini, or a scripted test double without changes.

pub mod provider;
pub mod message;
pub mod error;

pub use error::{LlmError, Result};
pub use message::{Conversation, Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider};
