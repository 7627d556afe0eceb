//! # SQLite database methods
//!
//! Low-level queries, written as free functions that take a `&mut SqliteConnection`. The caller decides whether that
//! connection comes straight from the pool or is an open transaction; the functions don't care.
//!
//! Timestamps are always bound explicitly as UTC so that every row written by the engine uses the same format.
use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod customers;
pub mod orders;
pub mod tokens;
pub mod transactions;
pub mod users;
pub mod widgets;

pub const SQLITE_DB_URL: &str = "sqlite://data/widget_store.db?mode=rwc";

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    info!("🗃️ Connected to {url} with up to {max_connections} connections");
    Ok(pool)
}
