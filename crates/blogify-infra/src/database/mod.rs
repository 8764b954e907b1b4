//! Database adapters: SeaORM/Postgres repositories and the in-memory
//! fallback used when no database is configured (and as the substrate for
//! service-level tests).

mod connections;
pub mod entity;
mod memory;
mod postgres;

pub use connections::{DatabaseConfig, connect};
pub use memory::{MemoryPostRepository, MemoryUserRepository};
pub use postgres::{PostgresPostRepository, PostgresUserRepository};

#[cfg(test)]
mod tests;
