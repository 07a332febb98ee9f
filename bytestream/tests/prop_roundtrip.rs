use bytestream::{varu32_len, ByteReader, ByteWriter};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
    VarU32(u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::U8),
        any::<i8>().prop_map(Op::I8),
        any::<u16>().prop_map(Op::U16),
        any::<i16>().prop_map(Op::I16),
        any::<u32>().prop_map(Op::U32),
        any::<i32>().prop_map(Op::I32),
        (-1.0e6f32..1.0e6f32).prop_map(Op::F32),
        any::<u32>().prop_map(Op::VarU32),
    ]
}

proptest! {
    #[test]
    fn prop_roundtrip_ops(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut writer = ByteWriter::new();
        for op in &ops {
            match op {
                Op::U8(v) => writer.write_u8(*v),
                Op::I8(v) => writer.write_i8(*v),
                Op::U16(v) => writer.write_u16(*v),
                Op::I16(v) => writer.write_i16(*v),
                Op::U32(v) => writer.write_u32(*v),
                Op::I32(v) => writer.write_i32(*v),
                Op::F32(v) => writer.write_f32(*v),
                Op::VarU32(v) => writer.write_varu32(*v),
            }
        }
        let bytes = writer.finish();

        let mut reader = ByteReader::new(&bytes);
        for op in &ops {
            match op {
                Op::U8(v) => prop_assert_eq!(reader.read_u8().unwrap(), *v),
                Op::I8(v) => prop_assert_eq!(reader.read_i8().unwrap(), *v),
                Op::U16(v) => prop_assert_eq!(reader.read_u16().unwrap(), *v),
                Op::I16(v) => prop_assert_eq!(reader.read_i16().unwrap(), *v),
                Op::U32(v) => prop_assert_eq!(reader.read_u32().unwrap(), *v),
                Op::I32(v) => prop_assert_eq!(reader.read_i32().unwrap(), *v),
                Op::F32(v) => prop_assert_eq!(reader.read_f32().unwrap().to_bits(), v.to_bits()),
                Op::VarU32(v) => prop_assert_eq!(reader.read_varu32().unwrap(), *v),
            }
        }
        prop_assert!(reader.is_empty());
    }

    #[test]
    fn prop_varint_len(value in any::<u32>()) {
        let mut writer = ByteWriter::new();
        writer.write_varu32(value);
        prop_assert_eq!(writer.len(), varu32_len(value));
    }

    #[test]
    fn prop_truncate_restores_prefix(prefix in prop::collection::vec(any::<u8>(), 0..32),
                                     tail in prop::collection::vec(any::<u8>(), 0..32)) {
        let mut writer = ByteWriter::new();
        writer.write_bytes(&prefix);
        let mark = writer.len();
        writer.write_bytes(&tail);
        writer.truncate(mark);
        prop_assert_eq!(writer.finish(), prefix);
    }

    #[test]
    fn prop_reader_never_panics(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut reader = ByteReader::new(&data);
        while !reader.is_empty() {
            if reader.read_varu32().is_err() {
                break;
            }
        }
    }
}
