//! Fuzz target for Lambda client context decoding.
//!
//! Run with: `cargo +nightly fuzz run fuzz_client_context`

#![no_main]

use libfuzzer_sys::fuzz_target;
use spanctx::ClientContextCodec;

fuzz_target!(|data: &str| {
    let codec = ClientContextCodec::new();
    if let Ok(custom) = codec.decode_blob(data) {
        let _ = codec.decode_custom_fields(&custom);
    }
});
