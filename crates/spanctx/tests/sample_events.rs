//! Integration tests using real-world Lambda sample events.
//!
//! These tests verify that the extraction carriers handle events in the
//! format AWS Lambda delivers them, with Jaeger trace context added to the
//! message attributes by an instrumented producer.

use aws_lambda_events::sns::SnsEvent;
use aws_lambda_events::sqs::SqsEvent;
use spanctx::transports::sns::{extract_from_sns_event, extract_from_sns_lambda_event};
use spanctx::transports::sqs::extract_from_sqs_event;
use spanctx::{JaegerSpanContext, JaegerTracer, SpanContext, TraceId};

const TRACE_CONTEXT: &str = "5759e988bd862e3fe1be46a994272793:53995c3f42cd8ad8:0000000000000000:1";

/// SQS event with a Jaeger trace context and a numeric attribute.
const SQS_EVENT: &str = r#"{
  "Records": [
    {
      "messageId": "059f36b4-87a3-44ab-83d2-661975830a7d",
      "receiptHandle": "AQEBwJnKyrHigUMZj6rYigCgxlaS3SLy0a",
      "body": "test",
      "attributes": {
        "ApproximateReceiveCount": "1",
        "SentTimestamp": "1545082649183",
        "SenderId": "AIDAIENQZJOLO23YVJ4VO",
        "ApproximateFirstReceiveTimestamp": "1545082649185"
      },
      "messageAttributes": {
        "uber-trace-id": {
          "stringValue": "5759e988bd862e3fe1be46a994272793:53995c3f42cd8ad8:0000000000000000:1",
          "stringListValues": [],
          "binaryListValues": [],
          "dataType": "String"
        },
        "uberctx-tenant": {
          "stringValue": "acme",
          "stringListValues": [],
          "binaryListValues": [],
          "dataType": "String"
        },
        "uberctx-retries": {
          "stringValue": "3",
          "stringListValues": [],
          "binaryListValues": [],
          "dataType": "Number"
        }
      },
      "md5OfBody": "098f6bcd4621d373cade4e832627b4f6",
      "eventSource": "aws:sqs",
      "eventSourceARN": "arn:aws:sqs:us-east-2:123456789012:my-queue",
      "awsRegion": "us-east-2"
    }
  ]
}"#;

/// SQS event without any message attributes.
const SQS_EVENT_UNTRACED: &str = r#"{
  "Records": [
    {
      "messageId": "2e1424d4-f796-459a-8184-9c92662be6da",
      "receiptHandle": "AQEBzWwaftRI0KuVm4tP+/7q1rGgNqicHq",
      "body": "Test message.",
      "attributes": {
        "ApproximateReceiveCount": "1",
        "SentTimestamp": "1545082650636",
        "SenderId": "AIDAIENQZJOLO23YVJ4VO",
        "ApproximateFirstReceiveTimestamp": "1545082650649"
      },
      "messageAttributes": {},
      "md5OfBody": "e4e68fb7bd0e697a0ae8f1bb342846b3",
      "eventSource": "aws:sqs",
      "eventSourceARN": "arn:aws:sqs:us-east-2:123456789012:my-queue",
      "awsRegion": "us-east-2"
    }
  ]
}"#;

/// SNS event with typed `{Type, Value}` attributes.
const SNS_EVENT: &str = r#"{
  "Records": [
    {
      "EventVersion": "1.0",
      "EventSubscriptionArn": "arn:aws:sns:us-east-2:123456789012:sns-lambda:21be56ed-a058-49f5-8c98-aedd2564c486",
      "EventSource": "aws:sns",
      "Sns": {
        "SignatureVersion": "1",
        "Timestamp": "2019-01-02T12:45:07.000Z",
        "Signature": "tcc6faL2yUC6dgZdmrwh1Y4cGa/ebXEkAi6RibDsvpi+tE/1+82j...65r==",
        "SigningCertUrl": "https://sns.us-east-2.amazonaws.com/SimpleNotificationService-ac565b8b1a6c5d002d285f9598aa1d9b.pem",
        "MessageId": "95df01b4-ee98-5cb9-9903-4c221d41eb5e",
        "Message": "Hello from SNS!",
        "MessageAttributes": {
          "uber-trace-id": {
            "Type": "String",
            "Value": "5759e988bd862e3fe1be46a994272793:53995c3f42cd8ad8:0000000000000000:1"
          },
          "uberctx-tenant": {
            "Type": "String",
            "Value": "acme"
          },
          "TestBinary": {
            "Type": "Binary",
            "Value": "TestBinary"
          }
        },
        "Type": "Notification",
        "UnsubscribeUrl": "https://sns.us-east-2.amazonaws.com/?Action=Unsubscribe&amp;SubscriptionArn=arn:aws:sns:us-east-2:123456789012:test-lambda:21be56ed-a058-49f5-8c98-aedd2564c486",
        "TopicArn": "arn:aws:sns:us-east-2:123456789012:sns-lambda",
        "Subject": "TestInvoke"
      }
    }
  ]
}"#;

/// SNS event as produced by a decoder that unwraps attribute values.
const SNS_EVENT_FLAT_ATTRIBUTES: &str = r#"{
  "Records": [
    {
      "EventSource": "aws:sns",
      "Sns": {
        "MessageId": "95df01b4-ee98-5cb9-9903-4c221d41eb5e",
        "Message": "Hello from SNS!",
        "MessageAttributes": {
          "uber-trace-id": "5759e988bd862e3fe1be46a994272793:53995c3f42cd8ad8:0000000000000000:1",
          "uberctx-tenant": "acme",
          "retries": 3
        },
        "TopicArn": "arn:aws:sns:us-east-2:123456789012:sns-lambda"
      }
    }
  ]
}"#;

fn expected_context() -> JaegerSpanContext {
    TRACE_CONTEXT
        .parse::<JaegerSpanContext>()
        .unwrap()
        .with_baggage_item("tenant", "acme")
}

fn as_jaeger(ctx: &dyn SpanContext) -> &JaegerSpanContext {
    ctx.as_any().downcast_ref::<JaegerSpanContext>().unwrap()
}

#[test]
fn test_sqs_sample_event() {
    let event: SqsEvent = serde_json::from_str(SQS_EVENT).unwrap();
    let tracer = JaegerTracer::new();

    let extracted = extract_from_sqs_event(&tracer, &event).unwrap().unwrap();
    let extracted = as_jaeger(extracted.as_ref());

    assert_eq!(extracted, &expected_context());
    assert_eq!(
        extracted.trace_id(),
        TraceId::new(0x5759e988bd862e3f, 0xe1be46a994272793)
    );
    assert!(extracted.is_sampled());
    // The Number-typed baggage attribute is skipped
    assert!(!extracted.baggage().contains_key("retries"));
}

#[test]
fn test_sqs_sample_event_untraced() {
    let event: SqsEvent = serde_json::from_str(SQS_EVENT_UNTRACED).unwrap();
    let tracer = JaegerTracer::new();

    assert!(extract_from_sqs_event(&tracer, &event).unwrap().is_none());
}

#[test]
fn test_sns_sample_event_typed() {
    let event: SnsEvent = serde_json::from_str(SNS_EVENT).unwrap();
    let tracer = JaegerTracer::new();

    let extracted = extract_from_sns_lambda_event(&tracer, &event)
        .unwrap()
        .unwrap();

    assert_eq!(as_jaeger(extracted.as_ref()), &expected_context());
}

#[test]
fn test_sns_sample_event_raw_nested_shape() {
    let event: serde_json::Value = serde_json::from_str(SNS_EVENT).unwrap();
    let tracer = JaegerTracer::new();

    let extracted = extract_from_sns_event(&tracer, &event).unwrap().unwrap();

    assert_eq!(as_jaeger(extracted.as_ref()), &expected_context());
}

#[test]
fn test_sns_sample_event_raw_flat_shape() {
    let event: serde_json::Value = serde_json::from_str(SNS_EVENT_FLAT_ATTRIBUTES).unwrap();
    let tracer = JaegerTracer::new();

    let extracted = extract_from_sns_event(&tracer, &event).unwrap().unwrap();

    assert_eq!(as_jaeger(extracted.as_ref()), &expected_context());
}

#[test]
fn test_sns_event_with_malformed_trace_context() {
    let event = serde_json::json!({
        "Records": [{"Sns": {"MessageAttributes": {"uber-trace-id": "not-a-context"}}}]
    });
    let tracer = JaegerTracer::new();

    let result = extract_from_sns_event(&tracer, &event);
    assert!(matches!(result, Err(spanctx::Error::ParseSpanContext(_))));
}
