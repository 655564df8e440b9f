//! Blog backend library: domain model, persistence adapters and the HTML
//! page handlers.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

pub use middleware::Trace;
