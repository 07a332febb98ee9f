//! Numeric quantization helpers.
//!
//! Everything here is a pure, integer-exact mapping between engine values and
//! the fixed-width wire representations used by the delta codecs.

/// Momentum magnitude at which a delta switches to the 10.6 encoding.
pub const FAST_MOMENTUM_LIMIT: f32 = 127.0;

/// Fixed-point format used for every momentum component of one delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MomentumEncoding {
    /// 8 integer bits, 8 fraction bits. Range about ±128 units.
    Normal8_8,
    /// 10 integer bits, 6 fraction bits. Range about ±512 units.
    Fast10_6,
}

impl MomentumEncoding {
    /// Picks the encoding for a set of momentum components.
    ///
    /// The choice is all-or-nothing: one fast component makes every
    /// component use 10.6.
    pub fn choose(components: impl IntoIterator<Item = f32>) -> Self {
        if components
            .into_iter()
            .any(|m| m.abs() >= FAST_MOMENTUM_LIMIT)
        {
            Self::Fast10_6
        } else {
            Self::Normal8_8
        }
    }

    /// Units per 1.0.
    #[must_use]
    pub const fn scale(self) -> f32 {
        match self {
            Self::Normal8_8 => 256.0,
            Self::Fast10_6 => 64.0,
        }
    }

    /// Quantizes one component, saturating at the format's range.
    #[must_use]
    pub fn encode(self, value: f32) -> i16 {
        saturate_i16(value * self.scale())
    }

    /// Expands one quantized component.
    #[must_use]
    pub fn decode(self, raw: i16) -> f32 {
        f32::from(raw) / self.scale()
    }
}

/// Encodes a map coordinate as 16.8 fixed point (whole part, fraction byte).
#[must_use]
pub fn encode_coord(value: f32) -> (i16, u8) {
    const MAX: f32 = 8_388_607.0;
    const MIN: f32 = -8_388_608.0;
    let fixed = if value.is_nan() {
        0
    } else {
        #[allow(clippy::cast_possible_truncation)]
        let fixed = (value * 256.0).round().clamp(MIN, MAX) as i32;
        fixed
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let parts = ((fixed >> 8) as i16, (fixed & 0xFF) as u8);
    parts
}

/// Decodes a 16.8 fixed-point coordinate.
#[must_use]
pub fn decode_coord(whole: i16, frac: u8) -> f32 {
    let fixed = (i32::from(whole) << 8) | i32::from(frac);
    #[allow(clippy::cast_precision_loss)]
    let value = fixed as f32 / 256.0;
    value
}

/// Truncates a 32-bit binary angle to its high 16 bits.
#[must_use]
pub const fn angle_to_short(bam: u32) -> u16 {
    (bam >> 16) as u16
}

/// Expands a 16-bit angle back to a 32-bit binary angle.
#[must_use]
pub const fn short_to_angle(short: u16) -> u32 {
    (short as u32) << 16
}

/// Maps `0.0..=1.0` onto a byte, clamping out-of-range input.
#[must_use]
pub fn unit_to_byte(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let byte = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    byte
}

/// Inverse of [`unit_to_byte`].
#[must_use]
pub fn byte_to_unit(byte: u8) -> f32 {
    f32::from(byte) / 255.0
}

/// Quantizes a sound volume to one byte.
///
/// Volumes above 1.0 saturate to 255 and non-positive volumes encode as 0.
/// Everything in between maps onto `0..=127` by rounding half up, so volumes
/// below `0.5 / 127` become 0.
#[must_use]
pub fn quantize_volume(volume: f32) -> u8 {
    if volume > 1.0 {
        255
    } else if volume <= 0.0 || volume.is_nan() {
        0
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let byte = (volume * 127.0 + 0.5) as u8;
        byte
    }
}

/// Expands a quantized volume. 255 decodes to a volume above 1.0.
#[must_use]
pub fn dequantize_volume(byte: u8) -> f32 {
    f32::from(byte) / 127.0
}

/// Unsigned 8.8 fixed point, used for speeds and friction.
#[must_use]
pub fn encode_ufixed8_8(value: f32) -> u16 {
    if value.is_nan() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let raw = (value * 256.0).round().clamp(0.0, f32::from(u16::MAX)) as u16;
    raw
}

/// Inverse of [`encode_ufixed8_8`].
#[must_use]
pub fn decode_ufixed8_8(raw: u16) -> f32 {
    f32::from(raw) / 256.0
}

/// Rounds to the nearest integer, saturating at the `i16` range.
#[must_use]
pub fn saturate_i16(value: f32) -> i16 {
    if value.is_nan() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let raw = value
        .round()
        .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
    raw
}

/// Rounds to the nearest integer, saturating at the `u8` range.
#[must_use]
pub fn saturate_u8(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let raw = value.round().clamp(0.0, 255.0) as u8;
    raw
}

/// Rounds to the nearest integer, saturating at the `i8` range.
#[must_use]
pub fn saturate_i8(value: f32) -> i8 {
    if value.is_nan() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let raw = value
        .round()
        .clamp(f32::from(i8::MIN), f32::from(i8::MAX)) as i8;
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn momentum_threshold_is_inclusive() {
        assert_eq!(
            MomentumEncoding::choose([126.9, -3.0]),
            MomentumEncoding::Normal8_8
        );
        assert_eq!(
            MomentumEncoding::choose([0.0, 127.0]),
            MomentumEncoding::Fast10_6
        );
        assert_eq!(
            MomentumEncoding::choose([-200.0]),
            MomentumEncoding::Fast10_6
        );
        assert_eq!(MomentumEncoding::choose([]), MomentumEncoding::Normal8_8);
    }

    #[test]
    fn momentum_normal_precision() {
        let enc = MomentumEncoding::Normal8_8;
        let raw = enc.encode(1.5);
        assert_eq!(raw, 384);
        assert!((enc.decode(raw) - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn momentum_saturates() {
        assert_eq!(MomentumEncoding::Normal8_8.encode(1000.0), i16::MAX);
        assert_eq!(MomentumEncoding::Fast10_6.encode(-1000.0), i16::MIN);
    }

    #[test]
    fn coord_layout() {
        assert_eq!(encode_coord(1.5), (1, 0x80));
        assert_eq!(encode_coord(-1.5), (-2, 0x80));
        assert!((decode_coord(-2, 0x80) + 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn coord_roundtrip_within_precision() {
        for value in [0.0f32, 12.25, -3000.75, 32767.5, -32768.0] {
            let (whole, frac) = encode_coord(value);
            assert!((decode_coord(whole, frac) - value).abs() <= 1.0 / 512.0);
        }
    }

    #[test]
    fn angles_keep_high_bits() {
        assert_eq!(angle_to_short(0x4000_1234), 0x4000);
        assert_eq!(short_to_angle(0x4000), 0x4000_0000);
    }

    #[test]
    fn unit_bytes_clamp() {
        assert_eq!(unit_to_byte(-1.0), 0);
        assert_eq!(unit_to_byte(0.5), 128);
        assert_eq!(unit_to_byte(2.0), 255);
        assert_eq!(unit_to_byte(f32::NAN), 0);
    }

    #[test]
    fn volume_quantization() {
        assert_eq!(quantize_volume(1.5), 255);
        assert_eq!(quantize_volume(0.0), 0);
        assert_eq!(quantize_volume(-0.5), 0);
        assert_eq!(quantize_volume(1.0), 127);
        assert_eq!(quantize_volume(0.5), 64);
        assert_eq!(quantize_volume(0.001), 0);
    }

    #[test]
    fn ufixed_roundtrip() {
        assert_eq!(encode_ufixed8_8(0.90625), 232);
        assert!((decode_ufixed8_8(232) - 0.90625).abs() < f32::EPSILON);
        assert_eq!(encode_ufixed8_8(-1.0), 0);
    }

    #[test]
    fn saturating_casts() {
        assert_eq!(saturate_i16(1e9), i16::MAX);
        assert_eq!(saturate_u8(300.0), 255);
        assert_eq!(saturate_u8(-4.0), 0);
        assert_eq!(saturate_i8(-200.0), i8::MIN);
        assert_eq!(saturate_i8(3.4), 3);
    }
}
