//! Tower middleware for the sprig transport.
//!
//! Layers wrap [`crate::HyperClient`]'s inner service and see every request
//! after the before-send hooks ran and before the on-response hooks run.
//! Add them with [`crate::HyperClientBuilder::layer`]; the first added is
//! the outermost.
//!
//! - [`LoggingLayer`] - logs requests and their outcome using `tracing`
//!
//! ```ignore
//! use sprig::HyperClient;
//! use sprig::middleware::LoggingLayer;
//!
//! let client = HyperClient::builder()
//!     .layer(LoggingLayer::debug())
//!     .build()?;
//! ```

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

pub use tower::{Layer, ServiceBuilder};
