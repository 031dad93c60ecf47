//! Lambda invocation client context.
//!
//! Lambda has no attribute map on an invocation. The only channel from caller
//! to callee is the `ClientContext` field: a base64-encoded JSON document of at
//! most 3583 bytes, delivered only to synchronous (`RequestResponse`)
//! invocations. The span context is written into its `custom` object:
//!
//! ```json
//! {"custom": {"uber-trace-id": "{trace}:{span}:{parent}:{flags}", "uberctx-user": "alice"}}
//! ```
//!
//! On the receiving side the Lambda runtime decodes the document and exposes
//! `custom` through [`lambda_runtime::Context::client_context`].

use crate::config::{Config, MAX_CLIENT_CONTEXT_BYTES};
use crate::error::{Error, Result};
use crate::jaeger::{
    JaegerSpanContext, TRACE_BAGGAGE_HEADER_PREFIX, TRACE_CONTEXT_HEADER_NAME,
};
use crate::tracer::SpanContext;
use aws_sdk_lambda::operation::invoke::InvokeInput;
use aws_sdk_lambda::types::InvocationType;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use lambda_runtime::Context as LambdaContext;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Wire form of the client context document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ClientContextPayload {
    #[serde(default)]
    custom: BTreeMap<String, String>,
}

/// Encodes span contexts into, and decodes them out of, Lambda client contexts.
///
/// Keys are always the stock `uber-trace-id` and `uberctx-` names, whatever
/// the configured carrier headers say.
#[derive(Debug, Clone)]
pub struct ClientContextCodec {
    max_encoded_bytes: usize,
}

impl Default for ClientContextCodec {
    fn default() -> Self {
        Self {
            max_encoded_bytes: MAX_CLIENT_CONTEXT_BYTES,
        }
    }
}

impl ClientContextCodec {
    /// Creates a codec with the standard key names and size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a codec from loaded configuration.
    ///
    /// The configured limit can only lower the ceiling; values above
    /// [`MAX_CLIENT_CONTEXT_BYTES`] are clamped.
    pub fn from_config(config: &Config) -> Self {
        let configured = config.lambda.max_client_context_bytes;
        if configured > MAX_CLIENT_CONTEXT_BYTES {
            tracing::warn!(
                configured,
                limit = MAX_CLIENT_CONTEXT_BYTES,
                "Client context limit above Lambda maximum, clamping"
            );
        }
        Self {
            max_encoded_bytes: configured.min(MAX_CLIENT_CONTEXT_BYTES),
        }
    }

    /// Returns the maximum encoded length.
    pub fn max_encoded_bytes(&self) -> usize {
        self.max_encoded_bytes
    }

    /// Encodes `span_context` into a base64 client context.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedSpanContext`] if `span_context` is not a
    ///   [`JaegerSpanContext`]
    /// - [`Error::TooMuchBaggage`] if the encoded form exceeds the size limit
    pub fn encode(&self, span_context: &dyn SpanContext) -> Result<String> {
        let jaeger = span_context
            .as_any()
            .downcast_ref::<JaegerSpanContext>()
            .ok_or(Error::UnsupportedSpanContext)?;

        let mut payload = ClientContextPayload::default();
        payload
            .custom
            .insert(TRACE_CONTEXT_HEADER_NAME.to_string(), jaeger.to_string());
        jaeger.for_each_baggage_item(&mut |key, value| {
            payload.custom.insert(
                format!("{TRACE_BAGGAGE_HEADER_PREFIX}{key}"),
                value.to_string(),
            );
            true
        });

        let json = serde_json::to_vec(&payload)?;
        let encoded = STANDARD.encode(json);
        if encoded.len() > self.max_encoded_bytes {
            tracing::warn!(
                encoded_len = encoded.len(),
                limit = self.max_encoded_bytes,
                "Client context too large, not propagating span context"
            );
            return Err(Error::TooMuchBaggage {
                encoded_len: encoded.len(),
                limit: self.max_encoded_bytes,
            });
        }

        Ok(encoded)
    }

    /// Decodes a base64 client context into its `custom` fields.
    pub fn decode_blob(&self, blob: &str) -> Result<HashMap<String, String>> {
        let json = STANDARD.decode(blob)?;
        let payload: ClientContextPayload = serde_json::from_slice(&json)?;
        Ok(payload.custom.into_iter().collect())
    }

    /// Attaches `span_context` to a synchronous invocation request.
    ///
    /// Does nothing when there is no span context. On error the request is
    /// left unchanged.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedInvocationType`] unless the invocation type is
    ///   unset or `RequestResponse`
    /// - any error of [`encode`](Self::encode)
    pub fn inject_into_invoke_input(
        &self,
        span_context: Option<&dyn SpanContext>,
        input: &mut InvokeInput,
    ) -> Result<()> {
        let Some(span_context) = span_context else {
            tracing::debug!("No span context, skipping Lambda injection");
            return Ok(());
        };

        if let Some(invocation_type) = input.invocation_type()
            && !is_request_response(invocation_type)
        {
            return Err(Error::UnsupportedInvocationType(
                invocation_type.as_str().to_string(),
            ));
        }

        input.client_context = Some(self.encode(span_context)?);
        Ok(())
    }

    /// Rebuilds a span context from decoded `custom` fields.
    ///
    /// Returns `Ok(None)` when there are no custom fields. Keys carrying the
    /// baggage prefix become baggage items; all other keys are ignored.
    ///
    /// Keys are matched case-sensitively, unlike [`JaegerTracer`] extraction,
    /// because the client context is JSON written by a codec, not a header map.
    ///
    /// [`JaegerTracer`]: crate::jaeger::JaegerTracer
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseSpanContext`] if the trace context entry is
    /// missing or malformed while other custom fields are present.
    pub fn decode_custom_fields(
        &self,
        custom: &HashMap<String, String>,
    ) -> Result<Option<JaegerSpanContext>> {
        if custom.is_empty() {
            return Ok(None);
        }

        let serialized = custom
            .get(TRACE_CONTEXT_HEADER_NAME)
            .map(String::as_str)
            .unwrap_or_default();
        let parsed: JaegerSpanContext = serialized.parse()?;

        let baggage = custom
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(TRACE_BAGGAGE_HEADER_PREFIX)
                    .map(|item| (item.to_string(), value.clone()))
            })
            .collect();

        Ok(Some(JaegerSpanContext::new(
            parsed.trace_id(),
            parsed.span_id(),
            parsed.parent_id(),
            parsed.is_sampled(),
            baggage,
        )))
    }

    /// Rebuilds the caller's span context from the invocation's Lambda context.
    ///
    /// Returns `Ok(None)` for untraced invocations.
    pub fn extract_from_lambda_context(
        &self,
        ctx: Option<&LambdaContext>,
    ) -> Result<Option<JaegerSpanContext>> {
        let Some(client_context) = ctx.and_then(|ctx| ctx.client_context.as_ref()) else {
            tracing::debug!("Invocation has no client context");
            return Ok(None);
        };

        self.decode_custom_fields(&client_context.custom)
    }
}

/// Attaches `span_context` to `input` with the default codec.
///
/// See [`ClientContextCodec::inject_into_invoke_input`].
pub fn inject_into_invoke_input(
    span_context: Option<&dyn SpanContext>,
    input: &mut InvokeInput,
) -> Result<()> {
    ClientContextCodec::default().inject_into_invoke_input(span_context, input)
}

/// Rebuilds the caller's span context with the default codec.
///
/// See [`ClientContextCodec::extract_from_lambda_context`].
pub fn extract_from_lambda_context(
    ctx: Option<&LambdaContext>,
) -> Result<Option<JaegerSpanContext>> {
    ClientContextCodec::default().extract_from_lambda_context(ctx)
}

/// `RequestResponse` is the default, so an empty type counts as one.
fn is_request_response(invocation_type: &InvocationType) -> bool {
    matches!(invocation_type, InvocationType::RequestResponse)
        || invocation_type.as_str().is_empty()
}
