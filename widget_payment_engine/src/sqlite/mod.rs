//! SQLite backend for the widget payment engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::{SqliteDatabase, CUSTOMER_WRITE_TIMEOUT, READ_TIMEOUT, SALE_WRITE_TIMEOUT};
