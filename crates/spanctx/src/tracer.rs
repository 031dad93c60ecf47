//! Tracer and span context abstractions.
//!
//! The tracer that serialises a span context into a carrier is supplied by the
//! caller as an explicit handle. The composition root owns its lifecycle; this
//! crate only borrows it for the duration of one call.

use crate::carrier::{Format, TextMapReader, TextMapWriter};
use crate::error::Result;
use std::any::Any;
use std::fmt;

/// A propagated trace context.
///
/// Only the sampling decision and baggage are visible through this trait.
/// Identifiers are implementation specific; callers that need them downcast
/// through [`SpanContext::as_any`].
pub trait SpanContext: fmt::Debug + Send + Sync + 'static {
    /// Returns whether the trace is sampled.
    fn is_sampled(&self) -> bool;

    /// Calls `visitor` for each baggage item until it returns `false`.
    fn for_each_baggage_item(&self, visitor: &mut dyn FnMut(&str, &str) -> bool);

    /// Returns `self` as [`Any`] for downcasting to the concrete implementation.
    fn as_any(&self) -> &dyn Any;
}

/// Injects and extracts span contexts through carriers.
pub trait Tracer {
    /// Writes `span_context` into `carrier` using `format`.
    fn inject(
        &self,
        span_context: &dyn SpanContext,
        format: Format,
        carrier: &mut dyn TextMapWriter,
    ) -> Result<()>;

    /// Reconstructs a span context from `carrier`.
    ///
    /// Returns `Ok(None)` when the carrier holds no trace context.
    fn extract(
        &self,
        format: Format,
        carrier: &dyn TextMapReader,
    ) -> Result<Option<Box<dyn SpanContext>>>;
}

impl<T: Tracer + ?Sized> Tracer for &T {
    fn inject(
        &self,
        span_context: &dyn SpanContext,
        format: Format,
        carrier: &mut dyn TextMapWriter,
    ) -> Result<()> {
        (**self).inject(span_context, format, carrier)
    }

    fn extract(
        &self,
        format: Format,
        carrier: &dyn TextMapReader,
    ) -> Result<Option<Box<dyn SpanContext>>> {
        (**self).extract(format, carrier)
    }
}

impl<T: Tracer + ?Sized> Tracer for std::sync::Arc<T> {
    fn inject(
        &self,
        span_context: &dyn SpanContext,
        format: Format,
        carrier: &mut dyn TextMapWriter,
    ) -> Result<()> {
        (**self).inject(span_context, format, carrier)
    }

    fn extract(
        &self,
        format: Format,
        carrier: &dyn TextMapReader,
    ) -> Result<Option<Box<dyn SpanContext>>> {
        (**self).extract(format, carrier)
    }
}
