//! SQS send requests and delivered queue events.

use crate::carrier::{EntryVisitor, Format, TextMapReader, TextMapWriter};
use crate::error::{Error, Result};
use crate::tracer::{SpanContext, Tracer};
use aws_lambda_events::sqs::{SqsEvent, SqsMessageAttribute};
use aws_sdk_sqs::operation::send_message::SendMessageInput;
use aws_sdk_sqs::types::MessageAttributeValue;
use std::collections::HashMap;

const STRING_DATA_TYPE: &str = "String";

/// Read-write carrier over an outgoing message's attributes.
///
/// Written attributes are tagged `DataType = "String"`.
pub struct SqsAttributeInjectCarrier<'a>(&'a mut HashMap<String, MessageAttributeValue>);

impl<'a> SqsAttributeInjectCarrier<'a> {
    /// Wraps an attribute map.
    pub fn new(attributes: &'a mut HashMap<String, MessageAttributeValue>) -> Self {
        Self(attributes)
    }
}

impl TextMapWriter for SqsAttributeInjectCarrier<'_> {
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

impl TextMapReader for SqsAttributeInjectCarrier<'_> {
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

/// Read-only carrier over a delivered message's attributes.
pub struct SqsEventAttributeCarrier<'a>(&'a HashMap<String, SqsMessageAttribute>);

impl<'a> SqsEventAttributeCarrier<'a> {
    /// Wraps a record's message attributes.
    pub fn new(attributes: &'a HashMap<String, SqsMessageAttribute>) -> Self {
        Self(attributes)
    }
}

impl TextMapReader for SqsEventAttributeCarrier<'_> {
    fn for_each_string_entry(&self, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        for (key, attribute) in self.0 {
            if attribute.data_type.as_deref() != Some(STRING_DATA_TYPE) {
                continue;
            }
            if let Some(value) = attribute.string_value.as_deref() {
                visitor(key, value)?;
            }
        }
        Ok(())
    }
}

/// Injects `span_context` into a send request's message attributes.
///
/// Does nothing when there is no span context. Allocates the attribute map if
/// the request has none.
pub fn inject_into_sqs_message<T>(
    tracer: &T,
    span_context: Option<&dyn SpanContext>,
    input: &mut SendMessageInput,
) -> Result<()>
where
    T: Tracer + ?Sized,
{
    let Some(span_context) = span_context else {
        tracing::debug!("No span context, skipping SQS injection");
        return Ok(());
    };

    let attributes = input.message_attributes.get_or_insert_with(HashMap::new);
    let mut carrier = SqsAttributeInjectCarrier(attributes);
    tracer.inject(span_context, Format::TextMap, &mut carrier)
}

/// Extracts a span context from the first record of an [`SqsEvent`].
pub fn extract_from_sqs_event<T>(
    tracer: &T,
    event: &SqsEvent,
) -> Result<Option<Box<dyn SpanContext>>>
where
    T: Tracer + ?Sized,
{
    let Some(record) = event.records.first() else {
        tracing::debug!("SQS event has no records");
        return Ok(None);
    };

    let carrier = SqsEventAttributeCarrier(&record.message_attributes);
    tracer.extract(Format::TextMap, &carrier)
}
