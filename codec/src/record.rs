//! Per-type delta record bodies.
//!
//! Every record is a [`wire::RecordHeader`] followed by a type-specific body.
//! Bodies list their flag word first and then one payload per set flag, in
//! flag order. Encoding always writes the normalized form of a delta;
//! decoding returns the denormalized form, so a decoded delta compares equal
//! to what a producer would have built (up to quantization).

use bytestream::{ByteReader, ByteWriter};
use model::quant::{
    angle_to_short, byte_to_unit, decode_coord, decode_ufixed8_8, dequantize_volume,
    encode_coord, encode_ufixed8_8, quantize_volume, saturate_i16, saturate_i8, saturate_u8,
    short_to_angle, unit_to_byte,
};
use model::{
    Delta, DeltaBody, DeltaType, EntityId, MobjDelta, MobjFlags, MomentumEncoding, PlayerDelta,
    PlayerFlags, PolyDelta, PolyFlags, PolyRotation, PspriteDelta, PspriteFlags, SectorDelta,
    SectorFlags, SideDelta, SideFlags, SoundDelta, SoundEmitter, SoundFlags, ZPosition,
};
use wire::{decode_record_header, encode_record_header, RecordHeader, ResendTag};

use crate::error::{CodecError, CodecResult};

/// One decoded record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeltaRecord {
    /// Present when the record is a retransmission.
    pub resent: Option<ResendTag>,
    pub delta: Delta,
}

impl DeltaRecord {
    #[must_use]
    pub const fn new(delta: Delta) -> Self {
        Self {
            resent: None,
            delta,
        }
    }

    #[must_use]
    pub const fn resent(delta: Delta, tag: ResendTag) -> Self {
        Self {
            resent: Some(tag),
            delta,
        }
    }
}

/// Largest id each record type can carry.
#[must_use]
pub const fn max_id(delta_type: DeltaType) -> u32 {
    match delta_type {
        DeltaType::Mobj | DeltaType::NullMobj | DeltaType::MobjSound => u16::MAX as u32,
        DeltaType::Player => u8::MAX as u32,
        DeltaType::Sector
        | DeltaType::Side
        | DeltaType::Poly
        | DeltaType::Sound
        | DeltaType::SectorSound
        | DeltaType::PolySound => u32::MAX,
    }
}

/// Writes one delta record and returns the number of bytes written.
///
/// The delta is normalized first. Nothing is written when it is empty, its
/// id does not fit the record type, or a packed field is out of range.
pub fn encode_record(
    delta: &Delta,
    resent: Option<ResendTag>,
    writer: &mut ByteWriter,
) -> CodecResult<usize> {
    let delta_type = delta.delta_type();
    let max = max_id(delta_type);
    if delta.id.get() > max {
        return Err(CodecError::IdOutOfRange {
            delta_type,
            id: delta.id,
            max,
        });
    }

    let delta = delta.normalized();
    if delta.is_empty() {
        return Err(CodecError::EmptyDelta {
            delta_type,
            id: delta.id,
        });
    }

    check_packed_fields(&delta)?;

    let start = writer.len();
    let header = RecordHeader {
        delta_type,
        resent,
    };
    encode_record_header(&header, writer);

    let id = delta.id.get();
    match &delta.body {
        DeltaBody::Mobj(mobj) => encode_mobj(id, mobj, writer),
        DeltaBody::NullMobj => writer.write_u16(narrow_u16(id)),
        DeltaBody::Player(player) => encode_player(id, player, writer),
        DeltaBody::Sector(sector) => encode_sector(id, sector, writer),
        DeltaBody::Side(side) => encode_side(id, side, writer),
        DeltaBody::Poly(poly) => encode_poly(id, poly, writer),
        DeltaBody::Sound(sound) => encode_sound(id, sound, writer),
    }
    Ok(writer.len() - start)
}

/// Reads one delta record.
pub fn decode_record(reader: &mut ByteReader<'_>) -> CodecResult<DeltaRecord> {
    let header = decode_record_header(reader)?;
    let delta = match header.delta_type {
        DeltaType::Mobj => decode_mobj(reader)?,
        DeltaType::NullMobj => Delta::null_mobj(reader.read_u16()?),
        DeltaType::Player => decode_player(reader)?,
        DeltaType::Sector => decode_sector(reader)?,
        DeltaType::Side => decode_side(reader)?,
        DeltaType::Poly => decode_poly(reader)?,
        DeltaType::Sound => decode_sound(SoundEmitter::World, reader)?,
        DeltaType::MobjSound => decode_sound(SoundEmitter::Mobj, reader)?,
        DeltaType::SectorSound => decode_sound(SoundEmitter::Sector, reader)?,
        DeltaType::PolySound => decode_sound(SoundEmitter::Poly, reader)?,
    };
    Ok(DeltaRecord {
        resent: header.resent,
        delta: delta.denormalized(),
    })
}

/// Largest fade target; the wire byte stores `target + 1` so 0 means none.
pub const MAX_FADE_TARGET: u8 = u8::MAX - 1;

/// Extra light and fixed colormap share one byte, four bits each.
pub const MAX_LIGHT_NIBBLE: u8 = 0x0F;

fn check_packed_fields(delta: &Delta) -> CodecResult<()> {
    let out_of_range = |field, value: u8, max: u8| CodecError::FieldOutOfRange {
        delta_type: delta.delta_type(),
        id: delta.id,
        field,
        value: u32::from(value),
        max: u32::from(max),
    };
    match &delta.body {
        DeltaBody::Mobj(m) if m.flags.contains(MobjFlags::FADE_TARGET) => {
            if let Some(target) = m.fade_target.filter(|&t| t > MAX_FADE_TARGET) {
                return Err(out_of_range("fade_target", target, MAX_FADE_TARGET));
            }
        }
        DeltaBody::Player(p) if p.flags.contains(PlayerFlags::EXTRA_LIGHT) => {
            if p.extra_light > MAX_LIGHT_NIBBLE {
                return Err(out_of_range("extra_light", p.extra_light, MAX_LIGHT_NIBBLE));
            }
            if p.fixed_colormap > MAX_LIGHT_NIBBLE {
                return Err(out_of_range(
                    "fixed_colormap",
                    p.fixed_colormap,
                    MAX_LIGHT_NIBBLE,
                ));
            }
        }
        _ => {}
    }
    Ok(())
}

// Ids are range-checked in `encode_record` before any body is written.
#[allow(clippy::cast_possible_truncation)]
const fn narrow_u16(id: u32) -> u16 {
    id as u16
}

#[allow(clippy::cast_possible_truncation)]
const fn narrow_u8(id: u32) -> u8 {
    id as u8
}

fn write_rgb(writer: &mut ByteWriter, flags: u32, bits: &[u32], channels: &[f32]) {
    for (bit, value) in bits.iter().zip(channels) {
        if flags & bit != 0 {
            writer.write_u8(unit_to_byte(*value));
        }
    }
}

fn read_rgb(
    reader: &mut ByteReader<'_>,
    flags: u32,
    bits: &[u32],
    channels: &mut [f32],
) -> CodecResult<()> {
    for (bit, value) in bits.iter().zip(channels) {
        if flags & bit != 0 {
            *value = byte_to_unit(reader.read_u8()?);
        }
    }
    Ok(())
}

fn write_coord(writer: &mut ByteWriter, value: f32) {
    let (whole, frac) = encode_coord(value);
    writer.write_i16(whole);
    writer.write_u8(frac);
}

fn read_coord(reader: &mut ByteReader<'_>) -> CodecResult<f32> {
    let whole = reader.read_i16()?;
    let frac = reader.read_u8()?;
    Ok(decode_coord(whole, frac))
}

fn momentum_encoding(flags: MobjFlags) -> MomentumEncoding {
    if flags.contains(MobjFlags::FAST_MOM) {
        MomentumEncoding::Fast10_6
    } else {
        MomentumEncoding::Normal8_8
    }
}

const MOM_BITS: [MobjFlags; 3] = [MobjFlags::MOM_X, MobjFlags::MOM_Y, MobjFlags::MOM_Z];

fn encode_mobj(id: u32, m: &MobjDelta, w: &mut ByteWriter) {
    let f = m.flags;
    let (word, more) = f.to_wire();
    w.write_u16(narrow_u16(id));
    w.write_u16(word);
    if f.contains(MobjFlags::MORE_FLAGS) {
        w.write_u8(more);
    }

    if f.contains(MobjFlags::ORIGIN_X) {
        write_coord(w, m.x);
    }
    if f.contains(MobjFlags::ORIGIN_Y) {
        write_coord(w, m.y);
    }
    if f.contains(MobjFlags::ORIGIN_Z) {
        let z = match m.z {
            ZPosition::Literal(z) => z,
            ZPosition::OnFloor | ZPosition::OnCeiling => 0.0,
        };
        write_coord(w, z);
    }
    let enc = momentum_encoding(f);
    for (bit, mom) in MOM_BITS.into_iter().zip(m.mom) {
        if f.contains(bit) {
            w.write_i16(enc.encode(mom));
        }
    }
    if f.contains(MobjFlags::ANGLE) {
        w.write_u16(angle_to_short(m.angle));
    }
    if f.contains(MobjFlags::SELECTOR) {
        w.write_varu32(m.selector & 0x00FF_FFFF);
    }
    if f.contains(MobjFlags::SELSPEC) {
        w.write_u8(m.selector.to_be_bytes()[0]);
    }
    if f.contains(MobjFlags::STATE) {
        w.write_varu32(m.state.unwrap_or_default());
    }
    if f.contains(MobjFlags::FLAGS) {
        w.write_u32(m.render_flags);
    }
    if f.contains(MobjFlags::RADIUS) {
        w.write_u8(saturate_u8(m.radius));
    }
    if f.contains(MobjFlags::HEIGHT) {
        w.write_u8(saturate_u8(m.height));
    }
    if f.contains(MobjFlags::HEALTH) {
        w.write_i32(m.health);
    }
    if f.contains(MobjFlags::FLOORCLIP) {
        w.write_u8(saturate_u8(m.floor_clip));
    }
    if f.contains(MobjFlags::TRANSLUCENCY) {
        w.write_u8(m.translucency);
    }
    if f.contains(MobjFlags::FADE_TARGET) {
        w.write_u8(m.fade_target.map_or(0, |t| t + 1));
    }
    if f.contains(MobjFlags::TYPE) {
        w.write_u16(m.mobj_type);
    }
}

fn decode_mobj(r: &mut ByteReader<'_>) -> CodecResult<Delta> {
    let id = r.read_u16()?;
    let word = r.read_u16()?;
    let more = if word & narrow_u16(MobjFlags::MORE_FLAGS.raw()) != 0 {
        r.read_u8()?
    } else {
        0
    };
    let f = MobjFlags::from_wire(word, more);
    let mut m = MobjDelta {
        flags: f,
        ..MobjDelta::default()
    };

    if f.contains(MobjFlags::ORIGIN_X) {
        m.x = read_coord(r)?;
    }
    if f.contains(MobjFlags::ORIGIN_Y) {
        m.y = read_coord(r)?;
    }
    if f.contains(MobjFlags::ORIGIN_Z) {
        m.z = ZPosition::Literal(read_coord(r)?);
    }
    let enc = momentum_encoding(f);
    for (i, bit) in MOM_BITS.into_iter().enumerate() {
        if f.contains(bit) {
            m.mom[i] = enc.decode(r.read_i16()?);
        }
    }
    if f.contains(MobjFlags::ANGLE) {
        m.angle = short_to_angle(r.read_u16()?);
    }
    if f.contains(MobjFlags::SELECTOR) {
        m.selector = r.read_varu32()? & 0x00FF_FFFF;
    }
    if f.contains(MobjFlags::SELSPEC) {
        m.selector |= u32::from(r.read_u8()?) << 24;
    }
    if f.contains(MobjFlags::STATE) {
        m.state = Some(r.read_varu32()?);
    }
    if f.contains(MobjFlags::FLAGS) {
        m.render_flags = r.read_u32()?;
    }
    if f.contains(MobjFlags::RADIUS) {
        m.radius = f32::from(r.read_u8()?);
    }
    if f.contains(MobjFlags::HEIGHT) {
        m.height = f32::from(r.read_u8()?);
    }
    if f.contains(MobjFlags::HEALTH) {
        m.health = r.read_i32()?;
    }
    if f.contains(MobjFlags::FLOORCLIP) {
        m.floor_clip = f32::from(r.read_u8()?);
    }
    if f.contains(MobjFlags::TRANSLUCENCY) {
        m.translucency = r.read_u8()?;
    }
    if f.contains(MobjFlags::FADE_TARGET) {
        m.fade_target = r.read_u8()?.checked_sub(1);
    }
    if f.contains(MobjFlags::TYPE) {
        m.mobj_type = r.read_u16()?;
    }
    Ok(Delta::mobj(id, m))
}

fn encode_player(id: u32, p: &PlayerDelta, w: &mut ByteWriter) {
    let f = p.flags;
    w.write_u8(narrow_u8(id));
    w.write_u16(f.raw());

    if f.contains(PlayerFlags::MOBJ) {
        w.write_u16(p.mobj);
    }
    if f.contains(PlayerFlags::FORWARD_MOVE) {
        w.write_i8(p.forward_move);
    }
    if f.contains(PlayerFlags::SIDE_MOVE) {
        w.write_i8(p.side_move);
    }
    if f.contains(PlayerFlags::TURN_DELTA) {
        w.write_u16(angle_to_short(p.turn_delta));
    }
    if f.contains(PlayerFlags::FRICTION) {
        w.write_u16(encode_ufixed8_8(p.friction));
    }
    if f.contains(PlayerFlags::EXTRA_LIGHT) {
        w.write_u8(p.extra_light | (p.fixed_colormap << 4));
    }
    if f.contains(PlayerFlags::FILTER) {
        w.write_u32(p.filter);
    }
    if f.contains(PlayerFlags::CL_YAW) {
        w.write_u16(angle_to_short(p.yaw));
    }
    if f.contains(PlayerFlags::CL_PITCH) {
        w.write_i16(saturate_i16(p.pitch * 100.0));
    }
    if f.contains(PlayerFlags::PSPRITES) {
        for psp in &p.psprites {
            encode_psprite(psp, w);
        }
    }
}

fn encode_psprite(psp: &PspriteDelta, w: &mut ByteWriter) {
    let f = psp.flags;
    w.write_u8(f.raw());
    if f.contains(PspriteFlags::STATE_PTR) {
        w.write_varu32(psp.state.map_or(0, |s| s.saturating_add(1)));
    }
    if f.contains(PspriteFlags::OFFSET) {
        w.write_i8(saturate_i8(psp.offset[0] * 2.0));
        w.write_i8(saturate_i8(psp.offset[1] * 2.0));
    }
    if f.contains(PspriteFlags::LIGHT) {
        w.write_u8(unit_to_byte(psp.light));
    }
    if f.contains(PspriteFlags::ALPHA) {
        w.write_u8(unit_to_byte(psp.alpha));
    }
    if f.contains(PspriteFlags::STATE) {
        w.write_u8(psp.phase);
    }
}

fn decode_player(r: &mut ByteReader<'_>) -> CodecResult<Delta> {
    let id = r.read_u8()?;
    let f = PlayerFlags::from_raw(r.read_u16()?);
    let mut p = PlayerDelta {
        flags: f,
        ..PlayerDelta::default()
    };

    if f.contains(PlayerFlags::MOBJ) {
        p.mobj = r.read_u16()?;
    }
    if f.contains(PlayerFlags::FORWARD_MOVE) {
        p.forward_move = r.read_i8()?;
    }
    if f.contains(PlayerFlags::SIDE_MOVE) {
        p.side_move = r.read_i8()?;
    }
    if f.contains(PlayerFlags::TURN_DELTA) {
        p.turn_delta = short_to_angle(r.read_u16()?);
    }
    if f.contains(PlayerFlags::FRICTION) {
        p.friction = decode_ufixed8_8(r.read_u16()?);
    }
    if f.contains(PlayerFlags::EXTRA_LIGHT) {
        let packed = r.read_u8()?;
        p.extra_light = packed & 0x0F;
        p.fixed_colormap = packed >> 4;
    }
    if f.contains(PlayerFlags::FILTER) {
        p.filter = r.read_u32()?;
    }
    if f.contains(PlayerFlags::CL_YAW) {
        p.yaw = short_to_angle(r.read_u16()?);
    }
    if f.contains(PlayerFlags::CL_PITCH) {
        p.pitch = f32::from(r.read_i16()?) / 100.0;
    }
    if f.contains(PlayerFlags::PSPRITES) {
        for psp in &mut p.psprites {
            *psp = decode_psprite(r)?;
        }
    }
    Ok(Delta::player(u32::from(id), p))
}

fn decode_psprite(r: &mut ByteReader<'_>) -> CodecResult<PspriteDelta> {
    let f = PspriteFlags::from_raw(r.read_u8()?);
    let mut psp = PspriteDelta {
        flags: f,
        ..PspriteDelta::default()
    };
    if f.contains(PspriteFlags::STATE_PTR) {
        psp.state = r.read_varu32()?.checked_sub(1);
    }
    if f.contains(PspriteFlags::OFFSET) {
        psp.offset[0] = f32::from(r.read_i8()?) / 2.0;
        psp.offset[1] = f32::from(r.read_i8()?) / 2.0;
    }
    if f.contains(PspriteFlags::LIGHT) {
        psp.light = byte_to_unit(r.read_u8()?);
    }
    if f.contains(PspriteFlags::ALPHA) {
        psp.alpha = byte_to_unit(r.read_u8()?);
    }
    if f.contains(PspriteFlags::STATE) {
        psp.phase = r.read_u8()?;
    }
    Ok(psp)
}

fn channel_bits<const N: usize>(bits: [SectorFlags; N]) -> [u32; N] {
    bits.map(SectorFlags::raw)
}

fn encode_sector(id: u32, s: &SectorDelta, w: &mut ByteWriter) {
    let f = s.flags;
    w.write_varu32(id);
    w.write_varu32(f.raw());

    if f.contains(SectorFlags::FLOOR_MATERIAL) {
        w.write_varu32(s.floor_material);
    }
    if f.contains(SectorFlags::CEILING_MATERIAL) {
        w.write_varu32(s.ceiling_material);
    }
    if f.contains(SectorFlags::LIGHT) {
        w.write_u8(unit_to_byte(s.light));
    }
    write_rgb(w, f.raw(), &channel_bits(SectorFlags::COLOR), &s.color);
    if f.contains(SectorFlags::FLOOR_HEIGHT) {
        w.write_i16(saturate_i16(s.floor_height));
    }
    if f.contains(SectorFlags::CEILING_HEIGHT) {
        w.write_i16(saturate_i16(s.ceiling_height));
    }
    if f.contains(SectorFlags::FLOOR_TARGET) {
        w.write_i16(saturate_i16(s.floor_target));
    }
    if f.contains(SectorFlags::FLOOR_SPEED) {
        w.write_u16(encode_ufixed8_8(s.floor_speed));
    }
    if f.contains(SectorFlags::CEILING_TARGET) {
        w.write_i16(saturate_i16(s.ceiling_target));
    }
    if f.contains(SectorFlags::CEILING_SPEED) {
        w.write_u16(encode_ufixed8_8(s.ceiling_speed));
    }
    write_rgb(
        w,
        f.raw(),
        &channel_bits(SectorFlags::FLOOR_COLOR),
        &s.floor_color,
    );
    write_rgb(
        w,
        f.raw(),
        &channel_bits(SectorFlags::CEILING_COLOR),
        &s.ceiling_color,
    );
}

fn decode_sector(r: &mut ByteReader<'_>) -> CodecResult<Delta> {
    let id = r.read_varu32()?;
    let f = SectorFlags::from_raw(r.read_varu32()?);
    let mut s = SectorDelta {
        flags: f,
        ..SectorDelta::default()
    };

    if f.contains(SectorFlags::FLOOR_MATERIAL) {
        s.floor_material = r.read_varu32()?;
    }
    if f.contains(SectorFlags::CEILING_MATERIAL) {
        s.ceiling_material = r.read_varu32()?;
    }
    if f.contains(SectorFlags::LIGHT) {
        s.light = byte_to_unit(r.read_u8()?);
    }
    read_rgb(r, f.raw(), &channel_bits(SectorFlags::COLOR), &mut s.color)?;
    if f.contains(SectorFlags::FLOOR_HEIGHT) {
        s.floor_height = f32::from(r.read_i16()?);
    }
    if f.contains(SectorFlags::CEILING_HEIGHT) {
        s.ceiling_height = f32::from(r.read_i16()?);
    }
    if f.contains(SectorFlags::FLOOR_TARGET) {
        s.floor_target = f32::from(r.read_i16()?);
    }
    if f.contains(SectorFlags::FLOOR_SPEED) {
        s.floor_speed = decode_ufixed8_8(r.read_u16()?);
    }
    if f.contains(SectorFlags::CEILING_TARGET) {
        s.ceiling_target = f32::from(r.read_i16()?);
    }
    if f.contains(SectorFlags::CEILING_SPEED) {
        s.ceiling_speed = decode_ufixed8_8(r.read_u16()?);
    }
    read_rgb(
        r,
        f.raw(),
        &channel_bits(SectorFlags::FLOOR_COLOR),
        &mut s.floor_color,
    )?;
    read_rgb(
        r,
        f.raw(),
        &channel_bits(SectorFlags::CEILING_COLOR),
        &mut s.ceiling_color,
    )?;
    Ok(Delta::sector(id, s))
}

fn side_bits<const N: usize>(bits: [SideFlags; N]) -> [u32; N] {
    bits.map(SideFlags::raw)
}

fn encode_side(id: u32, s: &SideDelta, w: &mut ByteWriter) {
    let f = s.flags;
    w.write_varu32(id);
    w.write_varu32(f.raw());

    if f.contains(SideFlags::TOP_MATERIAL) {
        w.write_varu32(s.top_material);
    }
    if f.contains(SideFlags::MIDDLE_MATERIAL) {
        w.write_varu32(s.middle_material);
    }
    if f.contains(SideFlags::BOTTOM_MATERIAL) {
        w.write_varu32(s.bottom_material);
    }
    if f.contains(SideFlags::LINE_FLAGS) {
        w.write_u8(s.line_flags);
    }
    write_rgb(w, f.raw(), &side_bits(SideFlags::TOP_COLOR), &s.top_color);
    write_rgb(
        w,
        f.raw(),
        &side_bits(SideFlags::MIDDLE_COLOR),
        &s.middle_color,
    );
    write_rgb(
        w,
        f.raw(),
        &side_bits(SideFlags::BOTTOM_COLOR),
        &s.bottom_color,
    );
    if f.contains(SideFlags::MIDDLE_BLEND_MODE) {
        w.write_u16(s.middle_blend_mode);
    }
    if f.contains(SideFlags::SIDE_FLAGS) {
        w.write_u8(s.side_flags);
    }
}

fn decode_side(r: &mut ByteReader<'_>) -> CodecResult<Delta> {
    let id = r.read_varu32()?;
    let f = SideFlags::from_raw(r.read_varu32()?);
    let mut s = SideDelta {
        flags: f,
        ..SideDelta::default()
    };

    if f.contains(SideFlags::TOP_MATERIAL) {
        s.top_material = r.read_varu32()?;
    }
    if f.contains(SideFlags::MIDDLE_MATERIAL) {
        s.middle_material = r.read_varu32()?;
    }
    if f.contains(SideFlags::BOTTOM_MATERIAL) {
        s.bottom_material = r.read_varu32()?;
    }
    if f.contains(SideFlags::LINE_FLAGS) {
        s.line_flags = r.read_u8()?;
    }
    read_rgb(
        r,
        f.raw(),
        &side_bits(SideFlags::TOP_COLOR),
        &mut s.top_color,
    )?;
    read_rgb(
        r,
        f.raw(),
        &side_bits(SideFlags::MIDDLE_COLOR),
        &mut s.middle_color,
    )?;
    read_rgb(
        r,
        f.raw(),
        &side_bits(SideFlags::BOTTOM_COLOR),
        &mut s.bottom_color,
    )?;
    if f.contains(SideFlags::MIDDLE_BLEND_MODE) {
        s.middle_blend_mode = r.read_u16()?;
    }
    if f.contains(SideFlags::SIDE_FLAGS) {
        s.side_flags = r.read_u8()?;
    }
    Ok(Delta::side(id, s))
}

fn encode_poly(id: u32, p: &PolyDelta, w: &mut ByteWriter) {
    let f = p.flags;
    w.write_varu32(id);
    w.write_u8(f.raw());

    if f.contains(PolyFlags::DEST_X) {
        w.write_f32(p.dest[0]);
    }
    if f.contains(PolyFlags::DEST_Y) {
        w.write_f32(p.dest[1]);
    }
    if f.contains(PolyFlags::SPEED) {
        w.write_f32(p.speed);
    }
    if f.contains(PolyFlags::DEST_ANGLE) {
        let angle = match p.rotation {
            PolyRotation::Toward(angle) => angle,
            PolyRotation::Perpetual => 0,
        };
        w.write_u16(angle_to_short(angle));
    }
    if f.contains(PolyFlags::ANGLE_SPEED) {
        w.write_u16(angle_to_short(p.angle_speed));
    }
}

fn decode_poly(r: &mut ByteReader<'_>) -> CodecResult<Delta> {
    let id = r.read_varu32()?;
    let f = PolyFlags::from_raw(r.read_u8()?);
    let mut p = PolyDelta {
        flags: f,
        ..PolyDelta::default()
    };

    if f.contains(PolyFlags::DEST_X) {
        p.dest[0] = r.read_f32()?;
    }
    if f.contains(PolyFlags::DEST_Y) {
        p.dest[1] = r.read_f32()?;
    }
    if f.contains(PolyFlags::SPEED) {
        p.speed = r.read_f32()?;
    }
    if f.contains(PolyFlags::DEST_ANGLE) {
        p.rotation = PolyRotation::Toward(short_to_angle(r.read_u16()?));
    }
    if f.contains(PolyFlags::ANGLE_SPEED) {
        p.angle_speed = short_to_angle(r.read_u16()?);
    }
    Ok(Delta::poly(id, p))
}

fn encode_sound(id: u32, s: &SoundDelta, w: &mut ByteWriter) {
    match s.emitter {
        SoundEmitter::World => w.write_varu32(s.sound_id),
        SoundEmitter::Mobj => w.write_u16(narrow_u16(id)),
        SoundEmitter::Sector | SoundEmitter::Poly => w.write_varu32(id),
    }
    w.write_u8(s.flags.raw());
    if s.emitter != SoundEmitter::World {
        w.write_varu32(s.sound_id);
    }
    if s.flags.contains(SoundFlags::VOLUME) {
        w.write_u8(quantize_volume(s.volume));
    }
}

fn decode_sound(emitter: SoundEmitter, r: &mut ByteReader<'_>) -> CodecResult<Delta> {
    let id = match emitter {
        SoundEmitter::Mobj => u32::from(r.read_u16()?),
        SoundEmitter::World | SoundEmitter::Sector | SoundEmitter::Poly => r.read_varu32()?,
    };
    let flags = SoundFlags::from_raw(r.read_u8()?);
    let sound_id = if emitter == SoundEmitter::World {
        id
    } else {
        r.read_varu32()?
    };
    let volume = if flags.contains(SoundFlags::VOLUME) {
        dequantize_volume(r.read_u8()?)
    } else {
        1.0
    };
    let sound = SoundDelta {
        emitter,
        flags,
        sound_id,
        volume,
    };
    Ok(Delta::sound(EntityId(id), sound))
}
