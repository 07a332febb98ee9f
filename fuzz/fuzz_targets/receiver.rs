#![no_main]

use std::num::NonZeroUsize;

use codec::{FrameReceiver, WireLimits};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&history, data)) = data.split_first() else {
        return;
    };
    let history = NonZeroUsize::new(usize::from(history % 16) + 1).unwrap();
    let mut receiver = FrameReceiver::new(history, WireLimits::for_testing());

    // Length-prefixed chunks form a stream of frames, including repeats.
    let mut idx = 0usize;
    while idx < data.len() && idx < 4096 {
        let len = (data[idx] as usize % 120).saturating_add(1);
        idx += 1;
        let end = (idx + len).min(data.len());
        let chunk = &data[idx..end];
        idx = end;

        if let Ok(frame) = receiver.receive(chunk) {
            assert_eq!(frame.ack.acks().count(), 1 + frame.ack.resends.len());
            assert_eq!(frame.ack.set, frame.header.set);
            assert!(receiver.history().len() <= receiver.history().capacity());
        }
    }
});
