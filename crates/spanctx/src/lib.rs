//! Trace context propagation across message queues, pub/sub topics and
//! Lambda invocations.
//!
//! HTTP services propagate trace context in headers. Queues, topics and
//! function invocations have no headers, but each offers some place to hang
//! metadata: AMQP annotations, SNS and SQS message attributes, and the Lambda
//! client context. This crate adapts each of those to one carrier contract
//! ([`TextMapReader`] / [`TextMapWriter`]) and hands the carrier to a
//! caller-supplied [`Tracer`].
//!
//! # Usage
//!
//! ```ignore
//! use spanctx::JaegerTracer;
//! use spanctx::transports::sqs::{extract_from_sqs_event, inject_into_sqs_message};
//!
//! let tracer = JaegerTracer::new();
//!
//! // Producer
//! inject_into_sqs_message(&tracer, Some(&span_context), &mut send_input)?;
//!
//! // Consumer
//! if let Some(parent) = extract_from_sqs_event(&tracer, &sqs_event)? {
//!     // start a child span of `parent`
//! }
//! ```
//!
//! # Carriers
//!
//! | Transport | Inject | Extract |
//! |-----------|--------|---------|
//! | AMQP 1.0 | message annotations | message annotations |
//! | SNS | `PublishInput` attributes, tagged `String` | first record's `MessageAttributes` |
//! | SQS | `SendMessageInput` attributes, tagged `String` | first record's `messageAttributes` |
//! | Lambda | base64 `ClientContext`, synchronous only | `Context::client_context.custom` |
//!
//! Injection without a span context is a no-op. Extraction from a message
//! without trace context returns `Ok(None)`.
//!
//! # Features
//!
//! - `amqp`, `sns`, `sqs`, `lambda` - one per transport (all enabled by default)
//! - `full` - All transports

mod carrier;
mod error;
mod tracer;

pub mod config;
pub mod jaeger;
pub mod otel;
pub mod transports;

pub use carrier::{EntryVisitor, Format, TextMapReader, TextMapWriter};
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use jaeger::{JaegerSpanContext, JaegerTracer, TraceId};
pub use otel::{OtelSpanContext, OtelTracer};
pub use tracer::{SpanContext, Tracer};

#[cfg(feature = "lambda")]
pub use transports::lambda::ClientContextCodec;
