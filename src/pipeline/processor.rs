//! Order processor: runs one order through dedup, relevance, generation
//! and recording.
//!
//! Stages short-circuit in order: a known order stops at the duplicate check,
//! an off-topic order stops at the keyword filter. Generation and storage
//! failures never reach the caller: the fallback reply stands in for a failed
//! generation and storage errors are logged.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::llm::ReplyGenerator;
use crate::llm::prompts::fallback_reply;
use crate::pipeline::rules::KeywordFilter;
use crate::pipeline::types::{Order, Outcome};
use crate::store::{InFlight, MemoryStore, OrderStore};

/// The order intake pipeline. Shared across requests behind an `Arc`.
pub struct OrderProcessor {
    filter: KeywordFilter,
    generator: Arc<dyn ReplyGenerator>,
    processed: Arc<MemoryStore>,
    durable: Option<Arc<dyn OrderStore>>,
    in_flight: InFlight,
    fallback: String,
}

impl OrderProcessor {
    /// Create a processor with in-memory deduplication only.
    pub fn new(filter: KeywordFilter, generator: Arc<dyn ReplyGenerator>, contact: &str) -> Self {
        Self {
            filter,
            generator,
            processed: Arc::new(MemoryStore::new()),
            durable: None,
            in_flight: InFlight::new(),
            fallback: fallback_reply(contact),
        }
    }

    /// Use an existing in-memory record set.
    pub fn with_processed(mut self, processed: Arc<MemoryStore>) -> Self {
        self.processed = processed;
        self
    }

    /// Also deduplicate against and record into a durable store.
    pub fn with_durable_store(mut self, store: Arc<dyn OrderStore>) -> Self {
        self.durable = Some(store);
        self
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn processed(&self) -> &Arc<MemoryStore> {
        &self.processed
    }

    /// Handle one order end to end.
    pub async fn handle(&self, order: &Order) -> Outcome {
        info!(order_id = %order.id, title = %order.title, "Order received");

        if self.is_duplicate(&order.id).await {
            info!(order_id = %order.id, "Duplicate order skipped");
            return Outcome::Duplicate;
        }

        if !self.filter.matches(order) {
            info!(order_id = %order.id, title = %order.title, "Irrelevant order skipped");
            return Outcome::Irrelevant;
        }

        // Held until the reply is recorded so a concurrent copy sees a duplicate.
        let Some(_claim) = self.in_flight.claim(&order.id) else {
            info!(order_id = %order.id, "Order already in flight, skipped");
            return Outcome::Duplicate;
        };
        if self.processed.is_processed(&order.id) {
            info!(order_id = %order.id, "Order finished by a concurrent request, skipped");
            return Outcome::Duplicate;
        }

        let reply = self.generate_reply(order).await;
        self.record_processed(order, &reply).await;

        info!(order_id = %order.id, "Reply produced");
        Outcome::Replied { reply }
    }

    /// Memory first, then the durable store. A failing durable lookup counts
    /// as "not seen".
    pub async fn is_duplicate(&self, order_id: &str) -> bool {
        if self.processed.is_processed(order_id) || self.in_flight.contains(order_id) {
            return true;
        }

        let Some(store) = &self.durable else {
            return false;
        };
        match store.contains(order_id).await {
            Ok(seen) => seen,
            Err(e) => {
                warn!(
                    order_id = order_id,
                    store = store.name(),
                    error = %e,
                    "Duplicate lookup failed, treating order as new"
                );
                false
            }
        }
    }

    /// Generated text, or the fallback reply on any generation error.
    pub async fn generate_reply(&self, order: &Order) -> String {
        match self.generator.generate(&order.description).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(
                    order_id = %order.id,
                    model = self.generator.model_name(),
                    error = %e,
                    "Reply generation failed, using fallback"
                );
                self.fallback.clone()
            }
        }
    }

    /// Mark the order processed in memory, then persist best-effort.
    pub async fn record_processed(&self, order: &Order, reply: &str) {
        self.processed.mark_processed(&order.id);

        if let Some(store) = &self.durable {
            if let Err(e) = store.insert(order, reply).await {
                warn!(
                    order_id = %order.id,
                    store = store.name(),
                    error = %e,
                    "Failed to persist order reply"
                );
            }
        }
    }
}
