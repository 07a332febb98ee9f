use bytestream::{ByteReader, ByteWriter};
use codec::{decode_record, encode_record};
use model::{Delta, DeltaBody, MobjDelta, MobjFlags, FAST_MOMENTUM_LIMIT};
use proptest::prelude::*;

fn roundtrip(mom: [f32; 3]) -> (Vec<u8>, MobjDelta) {
    let delta = Delta::mobj(1u32, MobjDelta::new().with_momentum(mom));
    let mut writer = ByteWriter::new();
    encode_record(&delta, None, &mut writer).unwrap();
    let bytes = writer.finish();

    let record = decode_record(&mut ByteReader::new(&bytes)).unwrap();
    match record.delta.body {
        DeltaBody::Mobj(mobj) => (bytes, mobj),
        other => panic!("unexpected body {other:?}"),
    }
}

// Record layout: type, id (2), flags word (2), [more byte], payload.
fn more_byte(bytes: &[u8]) -> Option<u8> {
    let word = u16::from_le_bytes([bytes[3], bytes[4]]);
    (word & 0x8000 != 0).then(|| bytes[5])
}

proptest! {
    #[test]
    fn slow_momentum_uses_8_8(mom in prop::array::uniform3(-126.99f32..126.99)) {
        let (bytes, decoded) = roundtrip(mom);
        prop_assert_eq!(more_byte(&bytes), None);
        for (orig, back) in mom.iter().zip(decoded.mom) {
            prop_assert!((orig - back).abs() <= 1.0 / 256.0);
        }
    }

    #[test]
    fn fast_momentum_uses_10_6(
        mut mom in prop::array::uniform3(-511.0f32..511.0),
        fast_axis in 0usize..3,
        fast_value in 127.0f32..511.0,
        negative in any::<bool>(),
    ) {
        mom[fast_axis] = if negative { -fast_value } else { fast_value };
        let (bytes, decoded) = roundtrip(mom);

        let more = more_byte(&bytes);
        prop_assert!(more.is_some_and(|m| m & 0x01 != 0), "FAST_MOM must be set");
        for (orig, back) in mom.iter().zip(decoded.mom) {
            prop_assert!((orig - back).abs() <= 1.0 / 64.0);
        }
        prop_assert!(decoded.mom.iter().any(|m| m.abs() >= FAST_MOMENTUM_LIMIT - 1.0 / 64.0));
    }

    #[test]
    fn decoded_flags_are_user_form(mom in prop::array::uniform3(-511.0f32..511.0)) {
        let (_, decoded) = roundtrip(mom);
        prop_assert_eq!(decoded.flags, MobjFlags::MOM);
    }
}
