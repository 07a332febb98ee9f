//! Map object deltas.

use crate::flags::delta_flags;
use crate::quant::MomentumEncoding;

delta_flags! {
    /// Mobj sub-field flags.
    ///
    /// The low 16 bits travel as the flags word. Bits 16..24 are the "more"
    /// byte, present on the wire only when `MORE_FLAGS` is set.
    pub struct MobjFlags(u32) {
        const ORIGIN_X = 0x0001;
        const ORIGIN_Y = 0x0002;
        const ORIGIN_Z = 0x0004;
        const MOM_X = 0x0008;
        const MOM_Y = 0x0010;
        const MOM_Z = 0x0020;
        const ANGLE = 0x0040;
        const HEIGHT = 0x0080;
        const FLAGS = 0x0100;
        const SELECTOR = 0x0200;
        const STATE = 0x0400;
        const RADIUS = 0x0800;
        const HEALTH = 0x1000;
        const FLOORCLIP = 0x2000;
        /// High byte of the selector follows. Derived during normalization.
        const SELSPEC = 0x4000;
        /// A more byte follows. Derived during normalization.
        const MORE_FLAGS = 0x8000;
        /// Momentum uses 10.6 instead of 8.8. Derived during normalization.
        const FAST_MOM = 0x01_0000;
        const TRANSLUCENCY = 0x02_0000;
        /// Z is pinned to the floor; no Z payload.
        const Z_FLOOR = 0x04_0000;
        /// Z is pinned to the ceiling; no Z payload.
        const Z_CEILING = 0x08_0000;
        const FADE_TARGET = 0x10_0000;
        const TYPE = 0x20_0000;
    }
}

impl MobjFlags {
    /// Every momentum component.
    pub const MOM: Self = Self(0x0038);

    /// Bits of the more byte.
    pub const MORE_MASK: Self = Self(0xFF_0000);

    /// Bits that carry a value of their own and can be superseded by a newer
    /// delta.
    pub const DATA: Self = Self(0x3FFF | 0x02_0000 | 0x10_0000 | 0x20_0000);

    /// Splits into the wire flags word and more byte.
    #[must_use]
    pub const fn to_wire(self) -> (u16, u8) {
        ((self.0 & 0xFFFF) as u16, ((self.0 >> 16) & 0xFF) as u8)
    }

    /// Joins a wire flags word and more byte.
    #[must_use]
    pub fn from_wire(word: u16, more: u8) -> Self {
        Self(u32::from(word) | (u32::from(more) << 16))
    }
}

/// Vertical position of a mobj.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ZPosition {
    /// An absolute height.
    Literal(f32),
    /// Resting on the floor of whatever sector the mobj is in.
    OnFloor,
    /// Touching the ceiling of whatever sector the mobj is in.
    OnCeiling,
}

impl Default for ZPosition {
    fn default() -> Self {
        Self::Literal(0.0)
    }
}

/// Changed fields of one map object.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MobjDelta {
    pub flags: MobjFlags,
    pub x: f32,
    pub y: f32,
    pub z: ZPosition,
    pub mom: [f32; 3],
    /// Binary angle.
    pub angle: u32,
    /// Sprite selector. The high byte selects a color translation.
    pub selector: u32,
    /// State index; `None` when the mobj has no state.
    pub state: Option<u32>,
    /// Render flags.
    pub render_flags: u32,
    pub radius: f32,
    pub height: f32,
    pub health: i32,
    pub floor_clip: f32,
    pub translucency: u8,
    /// Translucency the mobj is fading toward, if any.
    pub fade_target: Option<u8>,
    pub mobj_type: u16,
}

impl MobjDelta {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_origin(mut self, x: f32, y: f32, z: ZPosition) -> Self {
        self.flags |= MobjFlags::ORIGIN_X | MobjFlags::ORIGIN_Y | MobjFlags::ORIGIN_Z;
        self.x = x;
        self.y = y;
        self.z = z;
        self
    }

    #[must_use]
    pub fn with_z(mut self, z: ZPosition) -> Self {
        self.flags |= MobjFlags::ORIGIN_Z;
        self.z = z;
        self
    }

    #[must_use]
    pub fn with_momentum(mut self, mom: [f32; 3]) -> Self {
        self.flags |= MobjFlags::MOM;
        self.mom = mom;
        self
    }

    #[must_use]
    pub fn with_angle(mut self, angle: u32) -> Self {
        self.flags |= MobjFlags::ANGLE;
        self.angle = angle;
        self
    }

    #[must_use]
    pub fn with_selector(mut self, selector: u32) -> Self {
        self.flags |= MobjFlags::SELECTOR;
        self.selector = selector;
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: Option<u32>) -> Self {
        self.flags |= MobjFlags::STATE;
        self.state = state;
        self
    }

    #[must_use]
    pub fn with_render_flags(mut self, render_flags: u32) -> Self {
        self.flags |= MobjFlags::FLAGS;
        self.render_flags = render_flags;
        self
    }

    #[must_use]
    pub fn with_size(mut self, radius: f32, height: f32) -> Self {
        self.flags |= MobjFlags::RADIUS | MobjFlags::HEIGHT;
        self.radius = radius;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_health(mut self, health: i32) -> Self {
        self.flags |= MobjFlags::HEALTH;
        self.health = health;
        self
    }

    #[must_use]
    pub fn with_floor_clip(mut self, floor_clip: f32) -> Self {
        self.flags |= MobjFlags::FLOORCLIP;
        self.floor_clip = floor_clip;
        self
    }

    #[must_use]
    pub fn with_translucency(mut self, translucency: u8) -> Self {
        self.flags |= MobjFlags::TRANSLUCENCY;
        self.translucency = translucency;
        self
    }

    /// Targets range over `0..=254`; the codec rejects 255.
    #[must_use]
    pub fn with_fade_target(mut self, fade_target: Option<u8>) -> Self {
        self.flags |= MobjFlags::FADE_TARGET;
        self.fade_target = fade_target;
        self
    }

    #[must_use]
    pub fn with_type(mut self, mobj_type: u16) -> Self {
        self.flags |= MobjFlags::TYPE;
        self.mobj_type = mobj_type;
        self
    }

    /// Momentum encoding for the flagged components.
    #[must_use]
    pub fn momentum_encoding(&self) -> MomentumEncoding {
        let flagged = [MobjFlags::MOM_X, MobjFlags::MOM_Y, MobjFlags::MOM_Z]
            .into_iter()
            .zip(self.mom)
            .filter(|(bit, _)| self.flags.contains(*bit))
            .map(|(_, m)| m);
        MomentumEncoding::choose(flagged)
    }

    /// Returns the wire form of this delta.
    ///
    /// Pinned Z positions become `Z_FLOOR`/`Z_CEILING`, a missing state drops
    /// `STATE`, and the derived bits (`SELSPEC`, `FAST_MOM`, `MORE_FLAGS`)
    /// are recomputed. Applying it twice changes nothing.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        let flags = &mut out.flags;

        if flags.contains(MobjFlags::ORIGIN_Z) {
            match self.z {
                ZPosition::OnFloor => {
                    flags.remove(MobjFlags::ORIGIN_Z | MobjFlags::Z_CEILING);
                    flags.insert(MobjFlags::Z_FLOOR);
                }
                ZPosition::OnCeiling => {
                    flags.remove(MobjFlags::ORIGIN_Z | MobjFlags::Z_FLOOR);
                    flags.insert(MobjFlags::Z_CEILING);
                }
                ZPosition::Literal(_) => {
                    flags.remove(MobjFlags::Z_FLOOR | MobjFlags::Z_CEILING);
                }
            }
        }

        if self.state.is_none() {
            flags.remove(MobjFlags::STATE);
        }

        let selspec = flags.contains(MobjFlags::SELECTOR) && self.selector >> 24 != 0;
        flags.set(MobjFlags::SELSPEC, selspec);

        let fast = flags.intersects(MobjFlags::MOM)
            && self.momentum_encoding() == MomentumEncoding::Fast10_6;
        flags.set(MobjFlags::FAST_MOM, fast);

        let more = flags.intersects(MobjFlags::MORE_MASK);
        flags.set(MobjFlags::MORE_FLAGS, more);
        out
    }

    /// Inverse of [`normalized`](Self::normalized) for decoded deltas.
    #[must_use]
    pub fn denormalized(&self) -> Self {
        let mut out = self.clone();
        let flags = &mut out.flags;
        if flags.contains(MobjFlags::Z_FLOOR) {
            flags.insert(MobjFlags::ORIGIN_Z);
            out.z = ZPosition::OnFloor;
        } else if flags.contains(MobjFlags::Z_CEILING) {
            flags.insert(MobjFlags::ORIGIN_Z);
            out.z = ZPosition::OnCeiling;
        }
        flags.remove(
            MobjFlags::Z_FLOOR
                | MobjFlags::Z_CEILING
                | MobjFlags::SELSPEC
                | MobjFlags::FAST_MOM
                | MobjFlags::MORE_FLAGS,
        );
        out
    }

    /// Returns `true` if the wire form carries no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.normalized()
            .flags
            .difference(MobjFlags::MORE_FLAGS | MobjFlags::SELSPEC | MobjFlags::FAST_MOM)
            .is_empty()
    }

    /// Folds a newer delta for the same mobj into this one.
    pub fn merge(&mut self, newer: &Self) {
        let f = newer.flags;
        if f.contains(MobjFlags::ORIGIN_X) {
            self.x = newer.x;
        }
        if f.contains(MobjFlags::ORIGIN_Y) {
            self.y = newer.y;
        }
        if f.contains(MobjFlags::ORIGIN_Z) {
            self.z = newer.z;
        }
        for (i, bit) in [MobjFlags::MOM_X, MobjFlags::MOM_Y, MobjFlags::MOM_Z]
            .into_iter()
            .enumerate()
        {
            if f.contains(bit) {
                self.mom[i] = newer.mom[i];
            }
        }
        if f.contains(MobjFlags::ANGLE) {
            self.angle = newer.angle;
        }
        if f.contains(MobjFlags::SELECTOR) {
            self.selector = newer.selector;
        }
        if f.contains(MobjFlags::STATE) {
            self.state = newer.state;
        }
        if f.contains(MobjFlags::FLAGS) {
            self.render_flags = newer.render_flags;
        }
        if f.contains(MobjFlags::RADIUS) {
            self.radius = newer.radius;
        }
        if f.contains(MobjFlags::HEIGHT) {
            self.height = newer.height;
        }
        if f.contains(MobjFlags::HEALTH) {
            self.health = newer.health;
        }
        if f.contains(MobjFlags::FLOORCLIP) {
            self.floor_clip = newer.floor_clip;
        }
        if f.contains(MobjFlags::TRANSLUCENCY) {
            self.translucency = newer.translucency;
        }
        if f.contains(MobjFlags::FADE_TARGET) {
            self.fade_target = newer.fade_target;
        }
        if f.contains(MobjFlags::TYPE) {
            self.mobj_type = newer.mobj_type;
        }
        self.flags |= f;
    }

    /// Clears the fields a newer delta supersedes.
    pub fn subtract(&mut self, newer: &Self) {
        self.flags.remove(newer.flags.intersection(MobjFlags::DATA));
        if newer.flags.contains(MobjFlags::ORIGIN_Z) {
            self.flags.remove(MobjFlags::Z_FLOOR | MobjFlags::Z_CEILING);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_floor_becomes_control_bit() {
        let delta = MobjDelta::new().with_z(ZPosition::OnFloor).normalized();
        assert!(!delta.flags.contains(MobjFlags::ORIGIN_Z));
        assert!(delta.flags.contains(MobjFlags::Z_FLOOR));
        assert!(delta.flags.contains(MobjFlags::MORE_FLAGS));
    }

    #[test]
    fn on_ceiling_becomes_control_bit() {
        let delta = MobjDelta::new()
            .with_origin(1.0, 2.0, ZPosition::OnCeiling)
            .normalized();
        assert!(delta.flags.contains(MobjFlags::ORIGIN_X | MobjFlags::ORIGIN_Y));
        assert!(!delta.flags.contains(MobjFlags::ORIGIN_Z));
        assert!(delta.flags.contains(MobjFlags::Z_CEILING));
    }

    #[test]
    fn literal_z_stays() {
        let delta = MobjDelta::new()
            .with_z(ZPosition::Literal(64.0))
            .normalized();
        assert_eq!(delta.flags, MobjFlags::ORIGIN_Z);
    }

    #[test]
    fn normalization_is_idempotent() {
        let delta = MobjDelta::new()
            .with_z(ZPosition::OnFloor)
            .with_momentum([200.0, 0.0, 0.0])
            .with_selector(0x0300_0001)
            .with_state(None)
            .with_type(3);
        let once = delta.normalized();
        assert_eq!(once.normalized(), once);
    }

    #[test]
    fn missing_state_is_dropped() {
        let delta = MobjDelta::new().with_state(None);
        assert!(!delta.normalized().flags.contains(MobjFlags::STATE));
        assert!(delta.is_empty());
    }

    #[test]
    fn selspec_follows_high_byte() {
        let plain = MobjDelta::new().with_selector(5).normalized();
        assert!(!plain.flags.contains(MobjFlags::SELSPEC));

        let translated = MobjDelta::new().with_selector(0x0200_0005).normalized();
        assert!(translated.flags.contains(MobjFlags::SELSPEC));
    }

    #[test]
    fn fast_momentum_is_all_or_nothing() {
        let slow = MobjDelta::new().with_momentum([1.0, -126.0, 3.0]);
        assert_eq!(slow.momentum_encoding(), MomentumEncoding::Normal8_8);
        assert!(!slow.normalized().flags.contains(MobjFlags::FAST_MOM));

        let fast = MobjDelta::new().with_momentum([1.0, -127.0, 3.0]);
        assert_eq!(fast.momentum_encoding(), MomentumEncoding::Fast10_6);
        let wire = fast.normalized();
        assert!(wire.flags.contains(MobjFlags::FAST_MOM | MobjFlags::MORE_FLAGS));
    }

    #[test]
    fn unflagged_momentum_is_ignored() {
        let mut delta = MobjDelta::new().with_angle(0);
        delta.mom = [500.0, 0.0, 0.0];
        assert_eq!(delta.momentum_encoding(), MomentumEncoding::Normal8_8);
    }

    #[test]
    fn denormalize_restores_user_form() {
        let user = MobjDelta::new()
            .with_z(ZPosition::OnCeiling)
            .with_selector(0x0100_0000)
            .with_translucency(9);
        assert_eq!(user.normalized().denormalized(), user);
    }

    #[test]
    fn wire_split() {
        let flags = MobjFlags::ORIGIN_X | MobjFlags::MORE_FLAGS | MobjFlags::TYPE;
        let (word, more) = flags.to_wire();
        assert_eq!(word, 0x8001);
        assert_eq!(more, 0x20);
        assert_eq!(MobjFlags::from_wire(word, more), flags);
    }

    #[test]
    fn merge_copies_only_flagged_fields() {
        let mut pending = MobjDelta::new().with_health(100).with_angle(10);
        let newer = MobjDelta::new().with_angle(20).with_type(4);
        pending.merge(&newer);

        assert_eq!(pending.health, 100);
        assert_eq!(pending.angle, 20);
        assert_eq!(pending.mobj_type, 4);
        assert!(pending
            .flags
            .contains(MobjFlags::HEALTH | MobjFlags::ANGLE | MobjFlags::TYPE));
    }

    #[test]
    fn subtract_clears_superseded_fields() {
        let mut in_flight = MobjDelta::new()
            .with_origin(1.0, 2.0, ZPosition::Literal(3.0))
            .with_health(50);
        let newer = MobjDelta::new().with_origin(4.0, 5.0, ZPosition::OnFloor);
        in_flight.subtract(&newer);

        assert_eq!(in_flight.flags, MobjFlags::HEALTH);
        in_flight.subtract(&MobjDelta::new().with_health(10));
        assert!(in_flight.is_empty());
    }
}
