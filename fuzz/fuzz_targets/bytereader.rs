#![no_main]

use bytestream::ByteReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = ByteReader::new(data);
    let mut idx = 0usize;

    // Input bytes choose a bounded sequence of reads.
    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 7;
        idx += 1;

        let before = reader.remaining();
        let ok = match op {
            0 => reader.read_u8().is_ok(),
            1 => reader.read_u16().is_ok(),
            2 => reader.read_u32().is_ok(),
            3 => reader.read_f32().is_ok(),
            4 => reader.read_varu32().is_ok(),
            5 => reader.read_varu16().is_ok(),
            _ => {
                let len = usize::from(data[idx - 1] % 32);
                reader.read_bytes(len).is_ok()
            }
        };
        assert!(reader.remaining() <= before);
        assert_eq!(reader.position() + reader.remaining(), data.len());
        if !ok {
            break;
        }
    }
});
