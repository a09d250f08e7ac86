//! # coin-resolver
//!
//! Turns a free-text question about a cryptocurrency into one USD price
//! quote, or an explicit "unresolved".
//!
//! ## Pipeline
//!
//! ```text
//! ┌────────────┐   ┌──────────────────────────────────────────────────┐
//! │   query    │──▶│ classify                                         │
//! └────────────┘   └───────┬──────────┬──────────┬─────────┬─────────┬┘
//!                          │          │          │         │         │
//!                    pair link   contract   $TOK/QUOTE    URL    bare text
//!                          │          │          │         │         │
//!                          ▼          ▼          ▼         ▼         ▼
//!                   DEX by pair  DEX tokens  DEX search  aggregator  LLM mentions
//!                               → explorers              id, else    → aggregator
//!                               → aggregator             page        → DEX
//!                                                        extraction  → web search
//! ```
//!
//! Every source may fail. Failures are logged and the next source in the
//! chain is tried; the only failure a caller ever sees is
//! [`Resolution::Unresolved`].
//!
//! ## Example
//!
//! ```no_run
//! # async fn demo(llm: std::sync::Arc<dyn advisor_core::LlmProvider>) -> coin_resolver::Result<()> {
//! use coin_resolver::{ResolutionPipeline, ResolverConfig};
//!
//! let pipeline = ResolutionPipeline::new(&ResolverConfig::from_env(), llm, None)?;
//! if let Some(quote) = pipeline.resolve("what about $bitcoin?").await.quote() {
//!     println!("{}", quote.summary());
//! }
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod orchestrator;
pub mod prompts;
pub mod resolver;
pub mod retry;
pub mod test_support;
pub mod tracking;

pub use classify::classify;
pub use config::{Endpoints, ExplorerChain, ResolverConfig};
pub use error::{ResolveError, Result};
pub use model::{AddressFamily, CoinQuote, ReferenceDescriptor, ReferenceKind};
pub use orchestrator::{Resolution, ResolutionPipeline, Stage, UNRESOLVED_MESSAGE};
pub use retry::RetryPolicy;
pub use tracking::{MemorySearchTracker, SearchTracker, SearchedCoin};
