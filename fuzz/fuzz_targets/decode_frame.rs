#![no_main]

use codec::{decode_frame, encode_frame, WireLimits};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let limits = WireLimits::for_testing();
    let Ok(frame) = decode_frame(data, &limits) else {
        return;
    };
    assert!(frame.records.len() <= limits.max_records);

    // Anything accepted must survive re-encoding, or be rejected cleanly.
    let non_empty: Vec<_> = frame
        .records
        .into_iter()
        .filter(|record| !record.delta.normalized().is_empty())
        .collect();
    if let Ok(bytes) = encode_frame(&frame.header, &non_empty) {
        let again = decode_frame(&bytes, &WireLimits::default());
        assert!(again.is_ok());
    }
});
