//! Persistence layer: records of answered orders.

pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use memory::{InFlight, InFlightGuard, MemoryStore};
pub use traits::{OrderStore, StoredOrder};
