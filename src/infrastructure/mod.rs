//! Infrastructure Layer
//!
//! Implementations of external concerns:
//! - Chat transport
//! - Prometheus metrics

pub mod metrics;
pub mod transport;
