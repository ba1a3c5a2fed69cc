#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The identifier wire form arrives straight off the network; parsing
    // must fail gracefully, never panic.
    if let Ok(wire) = std::str::from_utf8(data) {
        if let Ok(tokens) = specserver::id::parse_id_list(wire) {
            // Exercise the downstream conversions too.
            for token in tokens {
                if let specserver::id::IdToken::Literal(t) = token {
                    let _ = t.to_packed();
                }
            }
        }
    }
});
