//! Storage layer: repository ports and their Postgres implementations.

pub mod infrastructure;
pub mod ports;
pub mod postgres;

pub use postgres::PostgresDatabase;
