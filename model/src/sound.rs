//! Sound deltas.

use wire::DeltaType;

use crate::flags::delta_flags;

delta_flags! {
    /// Sound sub-field flags.
    pub struct SoundFlags(u8) {
        const VOLUME = 0x01;
        /// Loop until stopped.
        const REPEAT = 0x02;
        /// Play from the floor plane of the emitting sector.
        const PLANE_FLOOR = 0x04;
        /// Play from the ceiling plane of the emitting sector.
        const PLANE_CEILING = 0x08;
    }
}

/// What a sound is played from.
///
/// For every emitter except [`World`](Self::World) the delta id is the
/// emitter's id. A world sound has no emitter, so its delta id is the sound
/// id itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SoundEmitter {
    World,
    Mobj,
    Sector,
    Poly,
}

impl SoundEmitter {
    /// Record type used for sounds from this emitter.
    #[must_use]
    pub const fn delta_type(self) -> DeltaType {
        match self {
            Self::World => DeltaType::Sound,
            Self::Mobj => DeltaType::MobjSound,
            Self::Sector => DeltaType::SectorSound,
            Self::Poly => DeltaType::PolySound,
        }
    }

    /// Emitter for a sound record type.
    #[must_use]
    pub const fn from_delta_type(delta_type: DeltaType) -> Option<Self> {
        match delta_type {
            DeltaType::Sound => Some(Self::World),
            DeltaType::MobjSound => Some(Self::Mobj),
            DeltaType::SectorSound => Some(Self::Sector),
            DeltaType::PolySound => Some(Self::Poly),
            _ => None,
        }
    }
}

/// One sound start (or stop, at volume zero).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoundDelta {
    pub emitter: SoundEmitter,
    pub flags: SoundFlags,
    pub sound_id: u32,
    /// `0.0` stops the sound; above `1.0` means "full volume, no attenuation".
    pub volume: f32,
}

impl SoundDelta {
    /// A sound at the given volume.
    #[must_use]
    pub const fn new(emitter: SoundEmitter, sound_id: u32, volume: f32) -> Self {
        Self {
            emitter,
            flags: SoundFlags::VOLUME,
            sound_id,
            volume,
        }
    }

    /// Stops whatever `sound_id` the emitter is playing.
    #[must_use]
    pub const fn stop(emitter: SoundEmitter, sound_id: u32) -> Self {
        Self::new(emitter, sound_id, 0.0)
    }

    #[must_use]
    pub fn repeating(mut self) -> Self {
        self.flags |= SoundFlags::REPEAT;
        self
    }

    /// Plays from one plane of a sector emitter.
    #[must_use]
    pub fn on_plane(mut self, floor: bool) -> Self {
        self.flags |= if floor {
            SoundFlags::PLANE_FLOOR
        } else {
            SoundFlags::PLANE_CEILING
        };
        self
    }

    /// Returns the wire form: plane bits only survive on sector emitters.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        if self.emitter != SoundEmitter::Sector {
            out.flags
                .remove(SoundFlags::PLANE_FLOOR | SoundFlags::PLANE_CEILING);
        }
        out
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.normalized().flags.is_empty()
    }
}
