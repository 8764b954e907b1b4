//! # Blogify Infrastructure
//!
//! Concrete implementations of the ports defined in `blogify-core`:
//! SeaORM/Postgres repositories (with an in-memory fallback), the JWT token
//! service, and the Argon2 password service.

pub mod auth;
pub mod database;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::{
    DatabaseConfig, MemoryPostRepository, MemoryUserRepository, PostgresPostRepository,
    PostgresUserRepository, connect,
};
