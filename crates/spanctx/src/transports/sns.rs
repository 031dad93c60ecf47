//! SNS publish inputs and delivered notification events.
//!
//! Outgoing attributes are typed: every attribute written carries
//! `DataType = "String"` so subscribers know how to read it. Delivered events
//! reach a Lambda as JSON, and attributes show up in one of two shapes
//! depending on how the event was decoded:
//!
//! ```json
//! { "MessageAttributes": { "uber-trace-id": "1:2:0:1" } }
//! { "MessageAttributes": { "uber-trace-id": { "Type": "String", "Value": "1:2:0:1" } } }
//! ```
//!
//! Both are accepted.

use crate::carrier::{EntryVisitor, Format, TextMapReader, TextMapWriter};
use crate::error::{Error, Result};
use crate::tracer::{SpanContext, Tracer};
use aws_lambda_events::sns::{MessageAttribute, SnsEvent};
use aws_sdk_sns::operation::publish::PublishInput;
use aws_sdk_sns::types::MessageAttributeValue;
use serde_json::{Map, Value};
use std::collections::HashMap;

const STRING_DATA_TYPE: &str = "String";

/// Read-write carrier over an outgoing publish request's attributes.
pub struct SnsAttributeInjectCarrier<'a>(&'a mut HashMap<String, MessageAttributeValue>);

impl<'a> SnsAttributeInjectCarrier<'a> {
    /// Wraps an attribute map.
    pub fn new(attributes: &'a mut HashMap<String, MessageAttributeValue>) -> Self {
        Self(attributes)
    }
}

impl TextMapWriter for SnsAttributeInjectCarrier<'_> {
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(attribute) = self.0.get_mut(key) {
            attribute.data_type = STRING_DATA_TYPE.to_string();
            attribute.string_value = Some(value.to_string());
            return Ok(());
        }

        let attribute = MessageAttributeValue::builder()
            .data_type(STRING_DATA_TYPE)
            .string_value(value)
            .build()
            .map_err(|err| Error::Attribute(Box::new(err)))?;
        self.0.insert(key.to_string(), attribute);
        Ok(())
    }
}

impl TextMapReader for SnsAttributeInjectCarrier<'_> {
    fn for_each_string_entry(&self, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        for (key, attribute) in self.0.iter() {
            if attribute.data_type != STRING_DATA_TYPE {
                continue;
            }
            if let Some(value) = attribute.string_value.as_deref() {
                visitor(key, value)?;
            }
        }
        Ok(())
    }
}

/// One delivered message attribute, in whichever shape it was decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeliveredAttribute<'a> {
    /// Already unwrapped to its string value.
    Flat(&'a str),
    /// Nested `{ "Type": ..., "Value": ... }` object.
    Typed { data_type: &'a str, value: &'a str },
    /// Anything else: numbers, binary, lists, malformed objects.
    Other,
}

impl<'a> DeliveredAttribute<'a> {
    fn classify(value: &'a Value) -> Self {
        match value {
            Value::String(s) => DeliveredAttribute::Flat(s),
            Value::Object(object) => {
                match (
                    object.get("Type").and_then(Value::as_str),
                    object.get("Value").and_then(Value::as_str),
                ) {
                    (Some(data_type), Some(value)) => {
                        DeliveredAttribute::Typed { data_type, value }
                    }
                    _ => DeliveredAttribute::Other,
                }
            }
            _ => DeliveredAttribute::Other,
        }
    }

    fn string_value(self) -> Option<&'a str> {
        match self {
            DeliveredAttribute::Flat(value) => Some(value),
            DeliveredAttribute::Typed { data_type, value } if data_type == STRING_DATA_TYPE => {
                Some(value)
            }
            _ => None,
        }
    }
}

/// Read-only carrier over the raw JSON attributes of a delivered notification.
pub struct SnsEventAttributeCarrier<'a>(&'a Map<String, Value>);

impl<'a> SnsEventAttributeCarrier<'a> {
    /// Wraps a decoded `MessageAttributes` object.
    pub fn new(attributes: &'a Map<String, Value>) -> Self {
        Self(attributes)
    }
}

impl TextMapReader for SnsEventAttributeCarrier<'_> {
    fn for_each_string_entry(&self, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        for (key, value) in self.0 {
            if let Some(value) = DeliveredAttribute::classify(value).string_value() {
                visitor(key, value)?;
            }
        }
        Ok(())
    }
}

/// Read-only carrier over the typed attributes of an [`SnsEvent`] record.
pub struct SnsRecordAttributeCarrier<'a>(&'a HashMap<String, MessageAttribute>);

impl<'a> SnsRecordAttributeCarrier<'a> {
    /// Wraps a record's message attributes.
    pub fn new(attributes: &'a HashMap<String, MessageAttribute>) -> Self {
        Self(attributes)
    }
}

impl TextMapReader for SnsRecordAttributeCarrier<'_> {
    fn for_each_string_entry(&self, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        for (key, attribute) in self.0 {
            if attribute.data_type == STRING_DATA_TYPE {
                visitor(key, &attribute.value)?;
            }
        }
        Ok(())
    }
}

/// Injects `span_context` into a publish request's message attributes.
///
/// Does nothing when there is no span context. Allocates the attribute map if
/// the request has none.
pub fn inject_into_sns_publish<T>(
    tracer: &T,
    span_context: Option<&dyn SpanContext>,
    input: &mut PublishInput,
) -> Result<()>
where
    T: Tracer + ?Sized,
{
    let Some(span_context) = span_context else {
        tracing::debug!("No span context, skipping SNS injection");
        return Ok(());
    };

    let attributes = input.message_attributes.get_or_insert_with(HashMap::new);
    let mut carrier = SnsAttributeInjectCarrier(attributes);
    tracer.inject(span_context, Format::TextMap, &mut carrier)
}

/// Extracts a span context from the first record of a raw SNS event.
///
/// `event` is the notification payload as decoded JSON, i.e.
/// `{"Records": [{"Sns": {"MessageAttributes": {...}}}]}`.
pub fn extract_from_sns_event<T>(
    tracer: &T,
    event: &Value,
) -> Result<Option<Box<dyn SpanContext>>>
where
    T: Tracer + ?Sized,
{
    let Some(attributes) = event["Records"][0]["Sns"]["MessageAttributes"].as_object() else {
        tracing::debug!("SNS event has no message attributes");
        return Ok(None);
    };

    let carrier = SnsEventAttributeCarrier(attributes);
    tracer.extract(Format::TextMap, &carrier)
}

/// Extracts a span context from the first record of a typed [`SnsEvent`].
pub fn extract_from_sns_lambda_event<T>(
    tracer: &T,
    event: &SnsEvent,
) -> Result<Option<Box<dyn SpanContext>>>
where
    T: Tracer + ?Sized,
{
    let Some(record) = event.records.first() else {
        tracing::debug!("SNS event has no records");
        return Ok(None);
    };

    let carrier = SnsRecordAttributeCarrier(&record.sns.message_attributes);
    tracer.extract(Format::TextMap, &carrier)
}
