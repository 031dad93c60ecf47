//! Fuzz target for Jaeger span context parsing.
//!
//! Run with: `cargo +nightly fuzz run fuzz_span_context`

#![no_main]

use libfuzzer_sys::fuzz_target;
use spanctx::JaegerSpanContext;

fuzz_target!(|data: &str| {
    if let Ok(ctx) = data.parse::<JaegerSpanContext>() {
        let reparsed: JaegerSpanContext = ctx.to_string().parse().unwrap();
        assert_eq!(reparsed, ctx);
    }
});
