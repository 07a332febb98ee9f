//! Entity identity.

use std::fmt;

use wire::DeltaType;

/// Identifier of a replicated entity within its kind's id space.
///
/// Mobj ids are thinker ids (16 bits on the wire), player ids are console
/// numbers, and sector/side/polyobject ids are dense array indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl EntityId {
    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<u16> for EntityId {
    fn from(value: u16) -> Self {
        Self(u32::from(value))
    }
}

/// Kinds of replicated entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    Mobj,
    Player,
    Sector,
    Side,
    Polyobject,
    SoundEmitter,
}

impl EntityKind {
    /// Returns the entity kind a delta type describes.
    #[must_use]
    pub const fn of(delta_type: DeltaType) -> Self {
        match delta_type {
            DeltaType::Mobj | DeltaType::NullMobj => Self::Mobj,
            DeltaType::Player => Self::Player,
            DeltaType::Sector => Self::Sector,
            DeltaType::Side => Self::Side,
            DeltaType::Poly => Self::Polyobject,
            DeltaType::Sound
            | DeltaType::MobjSound
            | DeltaType::SectorSound
            | DeltaType::PolySound => Self::SoundEmitter,
        }
    }
}

/// An entity id tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl EntityRef {
    #[must_use]
    pub const fn new(kind: EntityKind, id: EntityId) -> Self {
        Self { kind, id }
    }
}

/// Deduplication key of a delta inside a pool.
///
/// At most one never-sent delta exists per key. A null mobj shares its key
/// with the mobj it removes, and each sound record type keys on its emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeltaKey {
    pub delta_type: DeltaType,
    pub id: EntityId,
}

impl DeltaKey {
    /// Creates the key for a delta type and id.
    #[must_use]
    pub const fn new(delta_type: DeltaType, id: EntityId) -> Self {
        let delta_type = match delta_type {
            DeltaType::NullMobj => DeltaType::Mobj,
            other => other,
        };
        Self { delta_type, id }
    }
}

impl fmt::Display for DeltaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.delta_type, self.id)
    }
}
