//! Side (wall) deltas.

use crate::flags::delta_flags;

delta_flags! {
    /// Side sub-field flags.
    pub struct SideFlags(u32) {
        const TOP_MATERIAL = 0x0001;
        const MIDDLE_MATERIAL = 0x0002;
        const BOTTOM_MATERIAL = 0x0004;
        /// Flags of the line the side belongs to.
        const LINE_FLAGS = 0x0008;
        const TOP_COLOR_R = 0x0010;
        const TOP_COLOR_G = 0x0020;
        const TOP_COLOR_B = 0x0040;
        const MIDDLE_COLOR_R = 0x0080;
        const MIDDLE_COLOR_G = 0x0100;
        const MIDDLE_COLOR_B = 0x0200;
        const MIDDLE_COLOR_A = 0x0400;
        const BOTTOM_COLOR_R = 0x0800;
        const BOTTOM_COLOR_G = 0x1000;
        const BOTTOM_COLOR_B = 0x2000;
        const MIDDLE_BLEND_MODE = 0x4000;
        const SIDE_FLAGS = 0x8000;
    }
}

impl SideFlags {
    pub const TOP_COLOR: [Self; 3] = [Self::TOP_COLOR_R, Self::TOP_COLOR_G, Self::TOP_COLOR_B];
    pub const MIDDLE_COLOR: [Self; 4] = [
        Self::MIDDLE_COLOR_R,
        Self::MIDDLE_COLOR_G,
        Self::MIDDLE_COLOR_B,
        Self::MIDDLE_COLOR_A,
    ];
    pub const BOTTOM_COLOR: [Self; 3] = [
        Self::BOTTOM_COLOR_R,
        Self::BOTTOM_COLOR_G,
        Self::BOTTOM_COLOR_B,
    ];
}

/// Changed fields of one side.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SideDelta {
    pub flags: SideFlags,
    pub top_material: u32,
    pub middle_material: u32,
    pub bottom_material: u32,
    pub line_flags: u8,
    pub top_color: [f32; 3],
    pub middle_color: [f32; 4],
    pub bottom_color: [f32; 3],
    pub middle_blend_mode: u16,
    pub side_flags: u8,
}

impl SideDelta {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_materials(mut self, top: u32, middle: u32, bottom: u32) -> Self {
        self.flags |=
            SideFlags::TOP_MATERIAL | SideFlags::MIDDLE_MATERIAL | SideFlags::BOTTOM_MATERIAL;
        self.top_material = top;
        self.middle_material = middle;
        self.bottom_material = bottom;
        self
    }

    #[must_use]
    pub fn with_line_flags(mut self, line_flags: u8) -> Self {
        self.flags |= SideFlags::LINE_FLAGS;
        self.line_flags = line_flags;
        self
    }

    #[must_use]
    pub fn with_middle_color(mut self, rgba: [f32; 4]) -> Self {
        for bit in SideFlags::MIDDLE_COLOR {
            self.flags |= bit;
        }
        self.middle_color = rgba;
        self
    }

    #[must_use]
    pub fn with_top_color(mut self, rgb: [f32; 3]) -> Self {
        for bit in SideFlags::TOP_COLOR {
            self.flags |= bit;
        }
        self.top_color = rgb;
        self
    }

    #[must_use]
    pub fn with_bottom_color(mut self, rgb: [f32; 3]) -> Self {
        for bit in SideFlags::BOTTOM_COLOR {
            self.flags |= bit;
        }
        self.bottom_color = rgb;
        self
    }

    #[must_use]
    pub fn with_blend_mode(mut self, mode: u16) -> Self {
        self.flags |= SideFlags::MIDDLE_BLEND_MODE;
        self.middle_blend_mode = mode;
        self
    }

    #[must_use]
    pub fn with_side_flags(mut self, side_flags: u8) -> Self {
        self.flags |= SideFlags::SIDE_FLAGS;
        self.side_flags = side_flags;
        self
    }

    /// Sides have no derived bits.
    #[must_use]
    pub fn normalized(&self) -> Self {
        self.clone()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Folds a newer delta for the same side into this one.
    pub fn merge(&mut self, newer: &Self) {
        let f = newer.flags;
        if f.contains(SideFlags::TOP_MATERIAL) {
            self.top_material = newer.top_material;
        }
        if f.contains(SideFlags::MIDDLE_MATERIAL) {
            self.middle_material = newer.middle_material;
        }
        if f.contains(SideFlags::BOTTOM_MATERIAL) {
            self.bottom_material = newer.bottom_material;
        }
        if f.contains(SideFlags::LINE_FLAGS) {
            self.line_flags = newer.line_flags;
        }
        for (i, bit) in SideFlags::TOP_COLOR.into_iter().enumerate() {
            if f.contains(bit) {
                self.top_color[i] = newer.top_color[i];
            }
        }
        for (i, bit) in SideFlags::MIDDLE_COLOR.into_iter().enumerate() {
            if f.contains(bit) {
                self.middle_color[i] = newer.middle_color[i];
            }
        }
        for (i, bit) in SideFlags::BOTTOM_COLOR.into_iter().enumerate() {
            if f.contains(bit) {
                self.bottom_color[i] = newer.bottom_color[i];
            }
        }
        if f.contains(SideFlags::MIDDLE_BLEND_MODE) {
            self.middle_blend_mode = newer.middle_blend_mode;
        }
        if f.contains(SideFlags::SIDE_FLAGS) {
            self.side_flags = newer.side_flags;
        }
        self.flags |= f;
    }

    /// Clears the fields a newer delta supersedes.
    pub fn subtract(&mut self, newer: &Self) {
        self.flags.remove(newer.flags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_color_has_alpha() {
        let delta = SideDelta::new().with_middle_color([1.0, 0.5, 0.0, 0.25]);
        assert!(delta.flags.contains(SideFlags::MIDDLE_COLOR_A));
        assert!(!delta.flags.intersects(SideFlags::TOP_COLOR_R | SideFlags::BOTTOM_COLOR_R));
    }

    #[test]
    fn merge_keeps_older_unflagged_channels() {
        let mut pending = SideDelta::new().with_top_color([0.1, 0.2, 0.3]);
        let mut newer = SideDelta::new().with_side_flags(4);
        newer.flags |= SideFlags::TOP_COLOR_B;
        newer.top_color = [0.0, 0.0, 1.0];
        pending.merge(&newer);

        assert_eq!(pending.top_color, [0.1, 0.2, 1.0]);
        assert_eq!(pending.side_flags, 4);
    }

    #[test]
    fn subtract_partial() {
        let mut in_flight = SideDelta::new().with_materials(1, 2, 3).with_line_flags(8);
        in_flight.subtract(&SideDelta::new().with_materials(4, 5, 6));
        assert_eq!(in_flight.flags, SideFlags::LINE_FLAGS);
    }
}
