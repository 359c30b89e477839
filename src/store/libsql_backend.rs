//! libSQL backend: durable `OrderStore` implementation.
//!
//! Works against a hosted libSQL database (URL + auth token), a local file,
//! or an in-memory database for tests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::DatabaseError;
use crate::pipeline::types::Order;
use crate::store::migrations;
use crate::store::traits::{OrderStore, STATUS_RESPONDED, StoredOrder, is_answered};

/// Column list shared by every SELECT; order matches `row_to_order`.
const ORDER_COLUMNS: &str =
    "id, title, description, link, contact, response, status, created_at, updated_at";

/// libSQL order store.
///
/// `libsql::Connection` is `Send + Sync`; one connection serves all requests.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open the store described by `config`.
    pub async fn open(config: &StoreConfig) -> Result<Self, DatabaseError> {
        match config {
            StoreConfig::Remote { url, auth_token } => Self::new_remote(url, auth_token).await,
            StoreConfig::Local { path } => Self::new_local(path).await,
        }
    }

    /// Connect to a hosted database and run migrations.
    pub async fn new_remote(url: &str, auth_token: &SecretString) -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_remote(url.to_string(), auth_token.expose_secret().to_string())
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open remote database: {e}")))?;

        let backend = Self::from_database(db).await?;
        info!(url = url, "Remote order store connected");
        Ok(backend)
    }

    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db).await?;
        info!(path = %path.display(), "Local order store opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Look up an order row by id.
    pub async fn get_order(&self, order_id: &str) -> Result<Option<StoredOrder>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
                params![order_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_order: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let order = row_to_order(&row)
                    .map_err(|e| DatabaseError::Query(format!("row parse: {e}")))?;
                Ok(Some(order))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_order: {e}"))),
        }
    }

    /// Attach a reply and status to an order, creating the row if needed.
    ///
    /// Updates every row with the id, inserting one only on a miss. Adopted
    /// collector tables may lack a unique constraint on `id`.
    pub async fn save_response(
        &self,
        order: &Order,
        reply: &str,
        status: &str,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let updated = self
            .conn()
            .execute(
                "UPDATE orders SET response = ?2, status = ?3, updated_at = ?4 WHERE id = ?1",
                params![order.id.as_str(), reply, status, now.as_str()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_response: {e}")))?;

        if updated == 0 {
            self.conn()
                .execute(
                    "INSERT INTO orders (id, title, description, link, contact, response, status,
                        created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                    params![
                        order.id.as_str(),
                        order.title.as_str(),
                        order.description.as_str(),
                        opt_text(&order.link),
                        opt_text(&order.contact),
                        reply,
                        status,
                        now.as_str(),
                    ],
                )
                .await
                .map_err(|e| DatabaseError::Query(format!("save_response: {e}")))?;
        }

        debug!(order_id = %order.id, status = status, "Order response saved");
        Ok(())
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ndt.and_utc());
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|ndt| ndt.and_utc())
}

/// Empty strings are stored as NULL.
fn opt_text(s: &str) -> libsql::Value {
    if s.is_empty() {
        libsql::Value::Null
    } else {
        libsql::Value::Text(s.to_string())
    }
}

/// Map a libsql Row to a StoredOrder (column order: ORDER_COLUMNS).
fn row_to_order(row: &libsql::Row) -> Result<StoredOrder, libsql::Error> {
    Ok(StoredOrder {
        id: row.get(0)?,
        title: row.get::<String>(1).unwrap_or_default(),
        description: row.get::<String>(2).unwrap_or_default(),
        link: row.get(3).ok(),
        contact: row.get(4).ok(),
        response: row.get(5).ok(),
        status: row.get(6).ok(),
        created_at: row.get::<String>(7).ok().and_then(|s| parse_datetime(&s)),
        updated_at: row.get::<String>(8).ok().and_then(|s| parse_datetime(&s)),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl OrderStore for LibSqlBackend {
    fn name(&self) -> &'static str {
        "libsql"
    }

    async fn contains(&self, order_id: &str) -> Result<bool, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT response FROM orders WHERE id = ?1", params![order_id])
            .await
            .map_err(|e| DatabaseError::Query(format!("contains: {e}")))?;

        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("contains: {e}")))?
        {
            let response: Option<String> = row.get(0).ok();
            if is_answered(response.as_deref()) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn insert(&self, order: &Order, reply: &str) -> Result<(), DatabaseError> {
        self.save_response(order, reply, STATUS_RESPONDED).await
    }
}
