//! # Blogify Shared
//!
//! Shared types between frontend and backend: request/response DTOs and the
//! standard API envelope.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
