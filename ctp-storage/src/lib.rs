//! Relational store for the Cognitive Triangulation Pipeline: SQLite
//! schema, migrations, PRAGMA tuning, and a connection pool, behind
//! `ctp_core::traits::PipelineStorage`.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod pragmas;
pub mod queries;
pub mod schema;

pub use engine::SqliteStorage;
pub use pool::ConnectionPool;
