//! Shared types for the order intake pipeline.

use serde::{Deserialize, Serialize};

// ── Inbound order ───────────────────────────────────────────────────

/// A freelance task offered to the agent.
///
/// `link` and `contact` are carried through to storage but never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier, used as the deduplication key.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub link: String,
    pub description: String,
    #[serde(default)]
    pub contact: String,
}

impl Order {
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            link: String::new(),
            description: description.into(),
            contact: String::new(),
        }
    }
}

// ── Outcome ─────────────────────────────────────────────────────────

/// Terminal state of one pass through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The order was already handled (or is being handled right now).
    Duplicate,
    /// No configured keyword appears in the order.
    Irrelevant,
    /// A reply was produced, either generated or the fallback text.
    Replied { reply: String },
}

impl Outcome {
    pub fn status(&self) -> OrderStatus {
        match self {
            Outcome::Duplicate => OrderStatus::Duplicate,
            Outcome::Irrelevant => OrderStatus::Irrelevant,
            Outcome::Replied { .. } => OrderStatus::Ok,
        }
    }

    pub fn reply(&self) -> Option<&str> {
        match self {
            Outcome::Replied { reply } => Some(reply),
            _ => None,
        }
    }
}

/// Wire status of an order response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Duplicate,
    Irrelevant,
    Ok,
}

// ── Wire response ───────────────────────────────────────────────────

/// Body returned by `POST /handle_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub response: String,
}

impl OrderResponse {
    /// Only replied orders name the agent that answered.
    pub fn from_outcome(outcome: Outcome, agent: &str) -> Self {
        match outcome {
            Outcome::Replied { reply } => Self {
                status: OrderStatus::Ok,
                agent: Some(agent.to_string()),
                response: reply,
            },
            other => Self {
                status: other.status(),
                agent: None,
                response: String::new(),
            },
        }
    }
}
