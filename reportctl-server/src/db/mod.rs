//! Database layer - connection pool, schema and repositories
//!
//! - One shared SqlitePool, foreign keys enforced on every connection
//! - Schema is created idempotently, never altered
//! - Rely on DB constraints, map violations to DbError
//! - Transactions for multi-step deletes

pub mod pool;
pub mod repos;
pub mod schema;

pub use pool::{create_pool, ping};
pub use repos::*;
