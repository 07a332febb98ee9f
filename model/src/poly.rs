//! Polyobject deltas.

use crate::flags::delta_flags;

delta_flags! {
    /// Polyobject sub-field flags.
    pub struct PolyFlags(u8) {
        const DEST_X = 0x01;
        const DEST_Y = 0x02;
        const SPEED = 0x04;
        const DEST_ANGLE = 0x08;
        const ANGLE_SPEED = 0x10;
        /// Rotates forever; replaces `DEST_ANGLE` on the wire.
        const PERPETUAL_ROTATE = 0x20;
    }
}

/// Where a polyobject is rotating to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PolyRotation {
    /// Stop at this binary angle.
    Toward(u32),
    /// Never stop.
    Perpetual,
}

impl Default for PolyRotation {
    fn default() -> Self {
        Self::Toward(0)
    }
}

/// Changed fields of one polyobject.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolyDelta {
    pub flags: PolyFlags,
    pub dest: [f32; 2],
    pub speed: f32,
    pub rotation: PolyRotation,
    /// Binary angle per tic.
    pub angle_speed: u32,
}

impl PolyDelta {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_destination(mut self, x: f32, y: f32, speed: f32) -> Self {
        self.flags |= PolyFlags::DEST_X | PolyFlags::DEST_Y | PolyFlags::SPEED;
        self.dest = [x, y];
        self.speed = speed;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: PolyRotation, angle_speed: u32) -> Self {
        self.flags |= PolyFlags::DEST_ANGLE | PolyFlags::ANGLE_SPEED;
        self.rotation = rotation;
        self.angle_speed = angle_speed;
        self
    }

    /// Returns the wire form: a perpetual rotation becomes `PERPETUAL_ROTATE`
    /// and carries no destination angle.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        if out.flags.contains(PolyFlags::DEST_ANGLE) {
            let perpetual = self.rotation == PolyRotation::Perpetual;
            if perpetual {
                out.flags.remove(PolyFlags::DEST_ANGLE);
            }
            out.flags.set(PolyFlags::PERPETUAL_ROTATE, perpetual);
        }
        out
    }

    /// Inverse of [`normalized`](Self::normalized) for decoded deltas.
    #[must_use]
    pub fn denormalized(&self) -> Self {
        let mut out = self.clone();
        if out.flags.contains(PolyFlags::PERPETUAL_ROTATE) {
            out.flags.remove(PolyFlags::PERPETUAL_ROTATE);
            out.flags.insert(PolyFlags::DEST_ANGLE);
            out.rotation = PolyRotation::Perpetual;
        }
        out
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Folds a newer delta for the same polyobject into this one.
    pub fn merge(&mut self, newer: &Self) {
        let f = newer.flags;
        if f.contains(PolyFlags::DEST_X) {
            self.dest[0] = newer.dest[0];
        }
        if f.contains(PolyFlags::DEST_Y) {
            self.dest[1] = newer.dest[1];
        }
        if f.contains(PolyFlags::SPEED) {
            self.speed = newer.speed;
        }
        if f.contains(PolyFlags::DEST_ANGLE) {
            self.rotation = newer.rotation;
        }
        if f.contains(PolyFlags::ANGLE_SPEED) {
            self.angle_speed = newer.angle_speed;
        }
        self.flags |= f;
    }

    /// Clears the fields a newer delta supersedes.
    pub fn subtract(&mut self, newer: &Self) {
        self.flags.remove(newer.flags);
        if newer.flags.contains(PolyFlags::DEST_ANGLE) {
            self.flags.remove(PolyFlags::PERPETUAL_ROTATE);
        }
    }
}
