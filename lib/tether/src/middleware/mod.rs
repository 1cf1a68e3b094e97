//! Tower middleware layers for the tether HTTP transport.
//!
//! Layers wrap the [`HyperClient`](crate::HyperClient) service and see every
//! synthesized request, including its [`CallId`](tether_core::CallId)
//! extension.
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `middleware-logging` | `.with_logging()` helper (default) |
//! | `middleware-concurrency` | `.with_concurrency_limit()` helper |
//!
//! # Example
//!
//! ```ignore
//! use tether::HyperClient;
//! use tether::middleware::LoggingLayer;
//!
//! let client = HyperClient::builder()
//!     .layer(LoggingLayer::debug())
//!     .build();
//! ```

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

pub use tower::limit::ConcurrencyLimitLayer;
pub use tower::{Layer, ServiceBuilder};
