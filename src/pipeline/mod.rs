//! Order intake pipeline.
//!
//! Every inbound order flows through:
//! 1. Duplicate check: in-memory set, then the durable store if configured
//! 2. `KeywordFilter::matches()`: keyword gate (no LLM)
//! 3. Reply generation: LLM call, fallback text on any failure
//! 4. Recording: the order id is marked processed
//!
//! Each stage may end the pipeline early; nothing is retried.

pub mod processor;
pub mod rules;
pub mod types;

pub use processor::OrderProcessor;
pub use rules::KeywordFilter;
pub use types::{Order, OrderResponse, OrderStatus, Outcome};
