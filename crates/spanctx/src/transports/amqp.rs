//! AMQP 1.0 message annotations.
//!
//! Annotation values are dynamically typed, so no type tag is written. String
//! values are stored verbatim and enumeration skips every other value kind.

use crate::carrier::{EntryVisitor, Format, TextMapReader, TextMapWriter};
use crate::error::Result;
use crate::tracer::{SpanContext, Tracer};
use fe2o3_amqp_types::messaging::Message;
use fe2o3_amqp_types::messaging::annotations::{Annotations, OwnedKey};
use fe2o3_amqp_types::primitives::{Symbol, Value};

/// Read-write carrier over an outgoing message's annotations.
pub struct AmqpAnnotationsInjectCarrier<'a>(&'a mut Annotations);

impl<'a> AmqpAnnotationsInjectCarrier<'a> {
    /// Wraps an annotation map.
    pub fn new(annotations: &'a mut Annotations) -> Self {
        Self(annotations)
    }
}

impl TextMapWriter for AmqpAnnotationsInjectCarrier<'_> {
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = OwnedKey::from(Symbol::new(key));
        self.0.insert(key, Value::String(value.to_string()));
        Ok(())
    }
}

impl TextMapReader for AmqpAnnotationsInjectCarrier<'_> {
    fn for_each_string_entry(&self, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        for_each_string_annotation(&*self.0, visitor)
    }
}

/// Read-only carrier over a delivered message's annotations.
pub struct AmqpAnnotationsExtractCarrier<'a>(&'a Annotations);

impl<'a> AmqpAnnotationsExtractCarrier<'a> {
    /// Wraps an annotation map.
    pub fn new(annotations: &'a Annotations) -> Self {
        Self(annotations)
    }
}

impl TextMapReader for AmqpAnnotationsExtractCarrier<'_> {
    fn for_each_string_entry(&self, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        for_each_string_annotation(self.0, visitor)
    }
}

/// Visits annotations with a symbol key and a string value.
fn for_each_string_annotation(
    annotations: &Annotations,
    visitor: &mut EntryVisitor<'_>,
) -> Result<()> {
    for (key, value) in annotations.iter() {
        if let (OwnedKey::Symbol(symbol), Value::String(value)) = (key, value) {
            visitor(symbol.as_str(), value)?;
        }
    }
    Ok(())
}

/// Injects `span_context` into an outgoing message's annotations.
///
/// Does nothing when there is no span context. Allocates the annotation map if
/// the message has none.
pub fn inject_into_amqp_message<T, B>(
    tracer: &T,
    span_context: Option<&dyn SpanContext>,
    message: &mut Message<B>,
) -> Result<()>
where
    T: Tracer + ?Sized,
{
    let Some(span_context) = span_context else {
        tracing::debug!("No span context, skipping AMQP injection");
        return Ok(());
    };

    let annotations = message
        .message_annotations
        .get_or_insert_with(Default::default);
    let mut carrier = AmqpAnnotationsInjectCarrier(annotations);
    tracer.inject(span_context, Format::TextMap, &mut carrier)
}

/// Extracts a span context from a delivered message's annotations.
pub fn extract_from_amqp_message<T, B>(
    tracer: &T,
    message: &Message<B>,
) -> Result<Option<Box<dyn SpanContext>>>
where
    T: Tracer + ?Sized,
{
    let Some(annotations) = &message.message_annotations else {
        tracing::debug!("AMQP message has no annotations");
        return Ok(None);
    };

    let carrier = AmqpAnnotationsExtractCarrier(annotations);
    tracer.extract(Format::TextMap, &carrier)
}
