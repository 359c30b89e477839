//! Code Agent: keyword-gated LLM replies to freelance orders.

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod server;
pub mod store;
