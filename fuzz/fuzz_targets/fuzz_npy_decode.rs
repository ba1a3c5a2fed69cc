#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Cached payloads come from disk and, on the client side, from the
    // network; decoding must either succeed or error, never panic.
    if let Ok(payload) = specserver::spectrum::npy::decode(data) {
        let _ = payload.into_rows();
    }
});
