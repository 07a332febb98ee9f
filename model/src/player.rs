//! Player deltas.

use crate::flags::delta_flags;

delta_flags! {
    /// Player sub-field flags.
    pub struct PlayerFlags(u16) {
        /// Id of the mobj the player controls.
        const MOBJ = 0x0001;
        const FORWARD_MOVE = 0x0002;
        const SIDE_MOVE = 0x0004;
        const TURN_DELTA = 0x0010;
        const FRICTION = 0x0020;
        /// Extra light and fixed colormap.
        const EXTRA_LIGHT = 0x0040;
        const FILTER = 0x0080;
        const CL_YAW = 0x1000;
        const CL_PITCH = 0x2000;
        const PSPRITES = 0x4000;
    }
}

delta_flags! {
    /// Weapon sprite sub-field flags.
    pub struct PspriteFlags(u8) {
        const STATE_PTR = 0x01;
        const OFFSET = 0x08;
        const LIGHT = 0x20;
        const ALPHA = 0x40;
        /// Animation phase byte.
        const STATE = 0x80;
    }
}

/// Number of weapon sprites a player has.
pub const NUM_PSPRITES: usize = 2;

/// Changed fields of one weapon sprite.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PspriteDelta {
    pub flags: PspriteFlags,
    /// State index; `None` when the sprite is not shown.
    pub state: Option<u32>,
    pub offset: [f32; 2],
    pub light: f32,
    pub alpha: f32,
    /// Animation phase (bobbing, firing, lowering, ...).
    pub phase: u8,
}

impl PspriteDelta {
    pub fn merge(&mut self, newer: &Self) {
        let f = newer.flags;
        if f.contains(PspriteFlags::STATE_PTR) {
            self.state = newer.state;
        }
        if f.contains(PspriteFlags::OFFSET) {
            self.offset = newer.offset;
        }
        if f.contains(PspriteFlags::LIGHT) {
            self.light = newer.light;
        }
        if f.contains(PspriteFlags::ALPHA) {
            self.alpha = newer.alpha;
        }
        if f.contains(PspriteFlags::STATE) {
            self.phase = newer.phase;
        }
        self.flags |= f;
    }
}

/// Changed fields of one player.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerDelta {
    pub flags: PlayerFlags,
    pub mobj: u16,
    pub forward_move: i8,
    pub side_move: i8,
    /// Binary angle.
    pub turn_delta: u32,
    pub friction: f32,
    /// Extra light level, `0..16`.
    pub extra_light: u8,
    /// Fixed colormap, `0..16`.
    pub fixed_colormap: u8,
    /// View filter color, RGBA packed.
    pub filter: u32,
    /// Binary angle.
    pub yaw: u32,
    /// Degrees.
    pub pitch: f32,
    pub psprites: [PspriteDelta; NUM_PSPRITES],
}

impl PlayerDelta {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_mobj(mut self, mobj: u16) -> Self {
        self.flags |= PlayerFlags::MOBJ;
        self.mobj = mobj;
        self
    }

    #[must_use]
    pub fn with_movement(mut self, forward_move: i8, side_move: i8) -> Self {
        self.flags |= PlayerFlags::FORWARD_MOVE | PlayerFlags::SIDE_MOVE;
        self.forward_move = forward_move;
        self.side_move = side_move;
        self
    }

    #[must_use]
    pub fn with_turn_delta(mut self, turn_delta: u32) -> Self {
        self.flags |= PlayerFlags::TURN_DELTA;
        self.turn_delta = turn_delta;
        self
    }

    #[must_use]
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.flags |= PlayerFlags::FRICTION;
        self.friction = friction;
        self
    }

    /// Both values share one byte on the wire and must be in `0..=15`.
    #[must_use]
    pub fn with_extra_light(mut self, extra_light: u8, fixed_colormap: u8) -> Self {
        self.flags |= PlayerFlags::EXTRA_LIGHT;
        self.extra_light = extra_light;
        self.fixed_colormap = fixed_colormap;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: u32) -> Self {
        self.flags |= PlayerFlags::FILTER;
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_view(mut self, yaw: u32, pitch: f32) -> Self {
        self.flags |= PlayerFlags::CL_YAW | PlayerFlags::CL_PITCH;
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    #[must_use]
    pub fn with_psprite(mut self, index: usize, psprite: PspriteDelta) -> Self {
        if let Some(slot) = self.psprites.get_mut(index) {
            *slot = psprite;
            self.flags |= PlayerFlags::PSPRITES;
        }
        self
    }

    /// Returns the wire form: `PSPRITES` is dropped when neither sprite
    /// changed.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        if out.psprites.iter().all(|psp| psp.flags.is_empty()) {
            out.flags.remove(PlayerFlags::PSPRITES);
        }
        out
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.normalized().flags.is_empty()
    }

    /// Folds a newer delta for the same player into this one.
    pub fn merge(&mut self, newer: &Self) {
        let f = newer.flags;
        if f.contains(PlayerFlags::MOBJ) {
            self.mobj = newer.mobj;
        }
        if f.contains(PlayerFlags::FORWARD_MOVE) {
            self.forward_move = newer.forward_move;
        }
        if f.contains(PlayerFlags::SIDE_MOVE) {
            self.side_move = newer.side_move;
        }
        if f.contains(PlayerFlags::TURN_DELTA) {
            self.turn_delta = newer.turn_delta;
        }
        if f.contains(PlayerFlags::FRICTION) {
            self.friction = newer.friction;
        }
        if f.contains(PlayerFlags::EXTRA_LIGHT) {
            self.extra_light = newer.extra_light;
            self.fixed_colormap = newer.fixed_colormap;
        }
        if f.contains(PlayerFlags::FILTER) {
            self.filter = newer.filter;
        }
        if f.contains(PlayerFlags::CL_YAW) {
            self.yaw = newer.yaw;
        }
        if f.contains(PlayerFlags::CL_PITCH) {
            self.pitch = newer.pitch;
        }
        if f.contains(PlayerFlags::PSPRITES) {
            for (mine, theirs) in self.psprites.iter_mut().zip(&newer.psprites) {
                mine.merge(theirs);
            }
        }
        self.flags |= f;
    }

    /// Clears the fields a newer delta supersedes.
    pub fn subtract(&mut self, newer: &Self) {
        self.flags
            .remove(newer.flags.difference(PlayerFlags::PSPRITES));
        if newer.flags.contains(PlayerFlags::PSPRITES) {
            for (mine, theirs) in self.psprites.iter_mut().zip(&newer.psprites) {
                mine.flags.remove(theirs.flags);
            }
            if self.psprites.iter().all(|psp| psp.flags.is_empty()) {
                self.flags.remove(PlayerFlags::PSPRITES);
            }
        }
    }
}
