//! Per-transport carriers and entry points.
//!
//! Each transport is feature-gated:
//!
//! - `amqp` - AMQP 1.0 message annotations
//! - `sns` - SNS publish inputs and delivered notification events
//! - `sqs` - SQS send inputs and delivered queue events
//! - `lambda` - Lambda invocation client context
//!
//! Enable features via Cargo.toml:
//!
//! ```toml
//! [dependencies]
//! spanctx = { version = "0.1", default-features = false, features = ["sqs", "lambda"] }
//! ```

#[cfg(feature = "amqp")]
pub mod amqp;

#[cfg(feature = "sns")]
pub mod sns;

#[cfg(feature = "sqs")]
pub mod sqs;

#[cfg(feature = "lambda")]
pub mod lambda;
