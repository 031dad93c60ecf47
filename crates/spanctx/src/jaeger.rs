//! Jaeger span context and text-map tracer.
//!
//! The Jaeger wire form of a span context is a single string:
//!
//! ```text
//! {trace-id}:{span-id}:{parent-id}:{flags}
//! ```
//!
//! carried under the `uber-trace-id` key, with each baggage item under its
//! own `uberctx-{key}` entry.

use crate::carrier::{Format, TextMapReader, TextMapWriter};
use crate::config::{Config, HeadersConfig};
use crate::error::{Error, Result};
use crate::tracer::{SpanContext, Tracer};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Carrier key holding the serialised span context.
pub const TRACE_CONTEXT_HEADER_NAME: &str = "uber-trace-id";

/// Prefix of carrier keys holding baggage items.
pub const TRACE_BAGGAGE_HEADER_PREFIX: &str = "uberctx-";

const FLAG_SAMPLED: u8 = 0x01;
const FLAG_DEBUG: u8 = 0x02;

/// Errors produced when parsing a serialised span context.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSpanContextError {
    /// The serialised context is empty.
    #[error("cannot convert empty string to span context")]
    Empty,
    /// The serialised context does not have exactly four fields.
    #[error("malformed span context: expected 4 fields, found {0}")]
    FieldCount(usize),
    /// The trace id is not 1 to 32 hex digits.
    #[error("malformed trace id: {0:?}")]
    TraceId(String),
    /// The span id is not 1 to 16 hex digits.
    #[error("malformed span id: {0:?}")]
    SpanId(String),
    /// The parent id is not 1 to 16 hex digits.
    #[error("malformed parent id: {0:?}")]
    ParentId(String),
    /// The flags are not a hex byte.
    #[error("malformed flags: {0:?}")]
    Flags(String),
}

/// 128-bit Jaeger trace identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TraceId {
    /// Upper 64 bits, zero for 64-bit trace ids.
    pub high: u64,
    /// Lower 64 bits.
    pub low: u64,
}

impl TraceId {
    /// Creates a trace id from its two halves.
    pub fn new(high: u64, low: u64) -> Self {
        Self { high, low }
    }

    /// Returns whether the trace id is non-zero.
    pub fn is_valid(&self) -> bool {
        self.high != 0 || self.low != 0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.high == 0 {
            write!(f, "{:016x}", self.low)
        } else {
            write!(f, "{:016x}{:016x}", self.high, self.low)
        }
    }
}

impl FromStr for TraceId {
    type Err = ParseSpanContextError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || ParseSpanContextError::TraceId(s.to_string());
        if s.is_empty() || s.len() > 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let split = s.len().saturating_sub(16);
        let (high, low) = s.split_at(split);
        let high = if high.is_empty() {
            0
        } else {
            parse_hex_u64(high).ok_or_else(invalid)?
        };
        let low = parse_hex_u64(low).ok_or_else(invalid)?;

        Ok(Self { high, low })
    }
}

/// Span context of the Jaeger tracer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JaegerSpanContext {
    trace_id: TraceId,
    span_id: u64,
    parent_id: u64,
    flags: u8,
    baggage: HashMap<String, String>,
}

impl JaegerSpanContext {
    /// Creates a span context.
    pub fn new(
        trace_id: TraceId,
        span_id: u64,
        parent_id: u64,
        sampled: bool,
        baggage: HashMap<String, String>,
    ) -> Self {
        Self {
            trace_id,
            span_id,
            parent_id,
            flags: if sampled { FLAG_SAMPLED } else { 0 },
            baggage,
        }
    }

    /// Returns the trace id.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// Returns the span id.
    pub fn span_id(&self) -> u64 {
        self.span_id
    }

    /// Returns the parent span id, zero for a root span.
    pub fn parent_id(&self) -> u64 {
        self.parent_id
    }

    /// Returns the raw flag byte.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Returns whether the debug flag is set.
    pub fn is_debug(&self) -> bool {
        self.flags & FLAG_DEBUG != 0
    }

    /// Returns the baggage items.
    pub fn baggage(&self) -> &HashMap<String, String> {
        &self.baggage
    }

    /// Returns a copy of this context with an extra baggage item.
    #[must_use]
    pub fn with_baggage_item(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.baggage.insert(key.into(), value.into());
        self
    }

    /// Returns whether the trace and span ids are non-zero.
    pub fn is_valid(&self) -> bool {
        self.trace_id.is_valid() && self.span_id != 0
    }

    /// Replaces the baggage, keeping ids and flags.
    pub(crate) fn with_baggage(mut self, baggage: HashMap<String, String>) -> Self {
        self.baggage = baggage;
        self
    }
}

impl fmt::Display for JaegerSpanContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:016x}:{:016x}:{:x}",
            self.trace_id, self.span_id, self.parent_id, self.flags
        )
    }
}

impl FromStr for JaegerSpanContext {
    type Err = ParseSpanContextError;

    /// Parses the `{trace-id}:{span-id}:{parent-id}:{flags}` form.
    ///
    /// The parsed context carries no baggage.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseSpanContextError::Empty);
        }

        let parts: Vec<&str> = s.split(':').collect();
        let [trace_id, span_id, parent_id, flags] = parts.as_slice() else {
            return Err(ParseSpanContextError::FieldCount(parts.len()));
        };

        let trace_id = trace_id.parse::<TraceId>()?;
        let span_id = parse_hex_u64(span_id)
            .ok_or_else(|| ParseSpanContextError::SpanId(span_id.to_string()))?;
        let parent_id = parse_hex_u64(parent_id)
            .ok_or_else(|| ParseSpanContextError::ParentId(parent_id.to_string()))?;
        let flags = parse_hex_u8(flags)
            .ok_or_else(|| ParseSpanContextError::Flags(flags.to_string()))?;

        Ok(Self {
            trace_id,
            span_id,
            parent_id,
            flags,
            baggage: HashMap::new(),
        })
    }
}

impl SpanContext for JaegerSpanContext {
    fn is_sampled(&self) -> bool {
        self.flags & FLAG_SAMPLED != 0
    }

    fn for_each_baggage_item(&self, visitor: &mut dyn FnMut(&str, &str) -> bool) {
        for (key, value) in &self.baggage {
            if !visitor(key, value) {
                break;
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Jaeger tracer for the [`Format::TextMap`] propagation format.
#[derive(Debug, Clone, Default)]
pub struct JaegerTracer {
    headers: HeadersConfig,
}

impl JaegerTracer {
    /// Creates a tracer using the standard Jaeger header names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracer using custom header names.
    ///
    /// Names are lowercased, since extraction matches carrier keys
    /// case-insensitively.
    pub fn with_headers(headers: HeadersConfig) -> Self {
        Self {
            headers: HeadersConfig {
                trace_context_header_name: headers.trace_context_header_name.to_lowercase(),
                trace_baggage_header_prefix: headers.trace_baggage_header_prefix.to_lowercase(),
            },
        }
    }

    /// Creates a tracer from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::with_headers(config.headers.clone())
    }
}

impl Tracer for JaegerTracer {
    fn inject(
        &self,
        span_context: &dyn SpanContext,
        format: Format,
        carrier: &mut dyn TextMapWriter,
    ) -> Result<()> {
        let Format::TextMap = format;
        let jaeger = span_context
            .as_any()
            .downcast_ref::<JaegerSpanContext>()
            .ok_or(Error::UnsupportedSpanContext)?;

        carrier.set(
            &self.headers.trace_context_header_name,
            &jaeger.to_string(),
        )?;
        for (key, value) in &jaeger.baggage {
            let prefixed = format!("{}{}", self.headers.trace_baggage_header_prefix, key);
            carrier.set(&prefixed, value)?;
        }
        Ok(())
    }

    fn extract(
        &self,
        format: Format,
        carrier: &dyn TextMapReader,
    ) -> Result<Option<Box<dyn SpanContext>>> {
        let Format::TextMap = format;
        let mut context: Option<JaegerSpanContext> = None;
        let mut baggage = HashMap::new();

        carrier.for_each_string_entry(&mut |key, value| {
            let key = key.to_lowercase();
            if key == self.headers.trace_context_header_name {
                context = Some(value.parse()?);
            } else if let Some(item) = key.strip_prefix(&self.headers.trace_baggage_header_prefix)
            {
                baggage.insert(item.to_string(), value.to_string());
            }
            Ok(())
        })?;

        match context {
            Some(context) => Ok(Some(Box::new(context.with_baggage(baggage)))),
            None => {
                if !baggage.is_empty() {
                    tracing::debug!(
                        items = baggage.len(),
                        "Baggage found without trace context, ignoring"
                    );
                }
                Ok(None)
            }
        }
    }
}

/// Parses 1 to 16 hex digits into a u64.
fn parse_hex_u64(s: &str) -> Option<u64> {
    if s.is_empty() || s.len() > 16 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(s, 16).ok()
}

/// Parses 1 or 2 hex digits into a u8.
fn parse_hex_u8(s: &str) -> Option<u8> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(s, 16).ok()
}
