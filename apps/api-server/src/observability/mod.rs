//! Observability module - request IDs for tracing correlation.

mod request_id;

pub use request_id::RequestIdMiddleware;
