//! Sector deltas.

use crate::flags::delta_flags;

delta_flags! {
    /// Sector sub-field flags.
    pub struct SectorFlags(u32) {
        const FLOOR_MATERIAL = 0x0_0001;
        const CEILING_MATERIAL = 0x0_0002;
        const LIGHT = 0x0_0004;
        const FLOOR_TARGET = 0x0_0008;
        const FLOOR_SPEED = 0x0_0010;
        const CEILING_TARGET = 0x0_0020;
        const CEILING_SPEED = 0x0_0040;
        const COLOR_R = 0x0_0200;
        const COLOR_G = 0x0_0400;
        const COLOR_B = 0x0_0800;
        const FLOOR_COLOR_R = 0x0_1000;
        const FLOOR_COLOR_G = 0x0_2000;
        const FLOOR_COLOR_B = 0x0_4000;
        const CEILING_COLOR_R = 0x0_8000;
        const CEILING_COLOR_G = 0x1_0000;
        const CEILING_COLOR_B = 0x2_0000;
        const FLOOR_HEIGHT = 0x4_0000;
        const CEILING_HEIGHT = 0x8_0000;
    }
}

impl SectorFlags {
    /// Ambient color channels, red first.
    pub const COLOR: [Self; 3] = [Self::COLOR_R, Self::COLOR_G, Self::COLOR_B];
    /// Floor plane color channels, red first.
    pub const FLOOR_COLOR: [Self; 3] = [
        Self::FLOOR_COLOR_R,
        Self::FLOOR_COLOR_G,
        Self::FLOOR_COLOR_B,
    ];
    /// Ceiling plane color channels, red first.
    pub const CEILING_COLOR: [Self; 3] = [
        Self::CEILING_COLOR_R,
        Self::CEILING_COLOR_G,
        Self::CEILING_COLOR_B,
    ];
}

/// Changed fields of one sector.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectorDelta {
    pub flags: SectorFlags,
    pub floor_material: u32,
    pub ceiling_material: u32,
    /// Light level, `0.0..=1.0`.
    pub light: f32,
    pub color: [f32; 3],
    pub floor_height: f32,
    pub ceiling_height: f32,
    pub floor_target: f32,
    pub floor_speed: f32,
    pub ceiling_target: f32,
    pub ceiling_speed: f32,
    pub floor_color: [f32; 3],
    pub ceiling_color: [f32; 3],
}

impl SectorDelta {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_materials(mut self, floor: u32, ceiling: u32) -> Self {
        self.flags |= SectorFlags::FLOOR_MATERIAL | SectorFlags::CEILING_MATERIAL;
        self.floor_material = floor;
        self.ceiling_material = ceiling;
        self
    }

    #[must_use]
    pub fn with_light(mut self, light: f32) -> Self {
        self.flags |= SectorFlags::LIGHT;
        self.light = light;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        for bit in SectorFlags::COLOR {
            self.flags |= bit;
        }
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_heights(mut self, floor: f32, ceiling: f32) -> Self {
        self.flags |= SectorFlags::FLOOR_HEIGHT | SectorFlags::CEILING_HEIGHT;
        self.floor_height = floor;
        self.ceiling_height = ceiling;
        self
    }

    /// A moving floor: where it is heading and how fast.
    #[must_use]
    pub fn with_floor_motion(mut self, target: f32, speed: f32) -> Self {
        self.flags |= SectorFlags::FLOOR_TARGET | SectorFlags::FLOOR_SPEED;
        self.floor_target = target;
        self.floor_speed = speed;
        self
    }

    /// A moving ceiling: where it is heading and how fast.
    #[must_use]
    pub fn with_ceiling_motion(mut self, target: f32, speed: f32) -> Self {
        self.flags |= SectorFlags::CEILING_TARGET | SectorFlags::CEILING_SPEED;
        self.ceiling_target = target;
        self.ceiling_speed = speed;
        self
    }

    #[must_use]
    pub fn with_plane_colors(mut self, floor: [f32; 3], ceiling: [f32; 3]) -> Self {
        for bit in SectorFlags::FLOOR_COLOR.into_iter().chain(SectorFlags::CEILING_COLOR) {
            self.flags |= bit;
        }
        self.floor_color = floor;
        self.ceiling_color = ceiling;
        self
    }

    /// Sectors have no derived bits.
    #[must_use]
    pub fn normalized(&self) -> Self {
        self.clone()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Folds a newer delta for the same sector into this one.
    pub fn merge(&mut self, newer: &Self) {
        let f = newer.flags;
        if f.contains(SectorFlags::FLOOR_MATERIAL) {
            self.floor_material = newer.floor_material;
        }
        if f.contains(SectorFlags::CEILING_MATERIAL) {
            self.ceiling_material = newer.ceiling_material;
        }
        if f.contains(SectorFlags::LIGHT) {
            self.light = newer.light;
        }
        merge_channels(f, SectorFlags::COLOR, &mut self.color, &newer.color);
        if f.contains(SectorFlags::FLOOR_HEIGHT) {
            self.floor_height = newer.floor_height;
        }
        if f.contains(SectorFlags::CEILING_HEIGHT) {
            self.ceiling_height = newer.ceiling_height;
        }
        if f.contains(SectorFlags::FLOOR_TARGET) {
            self.floor_target = newer.floor_target;
        }
        if f.contains(SectorFlags::FLOOR_SPEED) {
            self.floor_speed = newer.floor_speed;
        }
        if f.contains(SectorFlags::CEILING_TARGET) {
            self.ceiling_target = newer.ceiling_target;
        }
        if f.contains(SectorFlags::CEILING_SPEED) {
            self.ceiling_speed = newer.ceiling_speed;
        }
        merge_channels(
            f,
            SectorFlags::FLOOR_COLOR,
            &mut self.floor_color,
            &newer.floor_color,
        );
        merge_channels(
            f,
            SectorFlags::CEILING_COLOR,
            &mut self.ceiling_color,
            &newer.ceiling_color,
        );
        self.flags |= f;
    }

    /// Clears the fields a newer delta supersedes.
    pub fn subtract(&mut self, newer: &Self) {
        self.flags.remove(newer.flags);
    }
}

fn merge_channels(flags: SectorFlags, bits: [SectorFlags; 3], dst: &mut [f32; 3], src: &[f32; 3]) {
    for (i, bit) in bits.into_iter().enumerate() {
        if flags.contains(bit) {
            dst[i] = src[i];
        }
    }
}
