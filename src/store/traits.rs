//! `OrderStore` trait: the deduplication and recording interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DatabaseError;
use crate::pipeline::types::Order;

/// Status stored with an order once a reply has been attached.
pub const STATUS_RESPONDED: &str = "responded";

/// An order row as persisted by a durable backend.
#[derive(Debug, Clone)]
pub struct StoredOrder {
    pub id: String,
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub contact: Option<String>,
    pub response: Option<String>,
    pub status: Option<String>,
    /// `None` for rows written by a collector that does not stamp times.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A stored reply counts only if it has visible text.
pub fn is_answered(response: Option<&str>) -> bool {
    response.is_some_and(|r| !r.trim().is_empty())
}

/// Backend-agnostic record of which orders have been answered.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// True if the order already has a reply recorded.
    async fn contains(&self, order_id: &str) -> Result<bool, DatabaseError>;

    /// Mark the order answered with `reply`.
    async fn insert(&self, order: &Order, reply: &str) -> Result<(), DatabaseError>;
}
