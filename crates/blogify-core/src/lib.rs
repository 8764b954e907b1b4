//! # Blogify Core
//!
//! The domain layer of the Blogify backend.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, the access-control rules, and the accounts/content services over
//! repository ports.

pub mod access;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use access::Identity;
pub use error::DomainError;
