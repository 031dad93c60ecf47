//! OpenTelemetry bridge.
//!
//! Lets any OpenTelemetry [`TextMapPropagator`] act as a [`Tracer`] so the
//! transport entry points work unchanged for OpenTelemetry producers and
//! consumers. Carriers are adapted to OpenTelemetry's [`Injector`] and
//! [`Extractor`] traits.

use crate::carrier::{Format, TextMapReader, TextMapWriter, collect_entries};
use crate::error::{Error, Result};
use crate::tracer::{SpanContext, Tracer};
use opentelemetry::Context;
use opentelemetry::baggage::BaggageExt;
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use std::any::Any;
use std::collections::HashMap;

/// An OpenTelemetry [`Context`] carrying a remote or local span.
#[derive(Debug, Clone)]
pub struct OtelSpanContext(pub Context);

impl OtelSpanContext {
    /// Wraps an OpenTelemetry context.
    pub fn new(cx: Context) -> Self {
        Self(cx)
    }

    /// Returns the wrapped context.
    pub fn context(&self) -> &Context {
        &self.0
    }
}

impl SpanContext for OtelSpanContext {
    fn is_sampled(&self) -> bool {
        self.0.span().span_context().is_sampled()
    }

    fn for_each_baggage_item(&self, visitor: &mut dyn FnMut(&str, &str) -> bool) {
        for (key, (value, _)) in self.0.baggage().iter() {
            let value = value.to_string();
            if !visitor(key.as_str(), &value) {
                break;
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// [`Tracer`] backed by an OpenTelemetry propagator.
///
/// # Example
///
/// ```ignore
/// use opentelemetry_sdk::propagation::TraceContextPropagator;
/// use spanctx::otel::OtelTracer;
///
/// let tracer = OtelTracer::new(TraceContextPropagator::new());
/// ```
#[derive(Debug, Clone)]
pub struct OtelTracer<P> {
    propagator: P,
}

impl<P: TextMapPropagator> OtelTracer<P> {
    /// Creates a tracer delegating to `propagator`.
    pub fn new(propagator: P) -> Self {
        Self { propagator }
    }
}

impl<P: TextMapPropagator> Tracer for OtelTracer<P> {
    fn inject(
        &self,
        span_context: &dyn SpanContext,
        format: Format,
        carrier: &mut dyn TextMapWriter,
    ) -> Result<()> {
        let Format::TextMap = format;
        let otel = span_context
            .as_any()
            .downcast_ref::<OtelSpanContext>()
            .ok_or(Error::UnsupportedSpanContext)?;

        let mut injector = WriterInjector {
            carrier,
            error: None,
        };
        self.propagator.inject_context(&otel.0, &mut injector);

        match injector.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn extract(
        &self,
        format: Format,
        carrier: &dyn TextMapReader,
    ) -> Result<Option<Box<dyn SpanContext>>> {
        let Format::TextMap = format;
        let extractor = EntriesExtractor::from_reader(carrier)?;
        let cx = self
            .propagator
            .extract_with_context(&Context::new(), &extractor);

        if cx.span().span_context().is_valid() {
            Ok(Some(Box::new(OtelSpanContext(cx))))
        } else {
            Ok(None)
        }
    }
}

/// Adapter writing OpenTelemetry injections into a carrier.
///
/// OpenTelemetry's `Injector::set` cannot fail, so the first carrier error is
/// held back and reported once injection finishes.
struct WriterInjector<'a> {
    carrier: &'a mut dyn TextMapWriter,
    error: Option<Error>,
}

impl Injector for WriterInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.carrier.set(key, &value) {
            self.error = Some(err);
        }
    }
}

/// Adapter exposing a carrier's string entries to OpenTelemetry.
///
/// Keys are lower-cased so lookups match regardless of producer casing.
struct EntriesExtractor(HashMap<String, String>);

impl EntriesExtractor {
    fn from_reader(carrier: &dyn TextMapReader) -> Result<Self> {
        let entries = collect_entries(carrier)?
            .into_iter()
            .map(|(key, value)| (key.to_lowercase(), value))
            .collect();
        Ok(Self(entries))
    }
}

impl Extractor for EntriesExtractor {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&key.to_lowercase()).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }
}
