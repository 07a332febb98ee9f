//! The replication unit: one entity's changed fields.

use wire::DeltaType;

use crate::mobj::{MobjDelta, MobjFlags};
use crate::player::PlayerDelta;
use crate::poly::PolyDelta;
use crate::sector::SectorDelta;
use crate::side::SideDelta;
use crate::sound::{SoundDelta, SoundEmitter};
use crate::types::{DeltaKey, EntityId, EntityKind, EntityRef};

/// Type-specific payload of a delta.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeltaBody {
    Mobj(MobjDelta),
    /// The mobj left the simulation.
    NullMobj,
    Player(PlayerDelta),
    Sector(SectorDelta),
    Side(SideDelta),
    Poly(PolyDelta),
    Sound(SoundDelta),
}

/// A change to one entity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Delta {
    pub id: EntityId,
    pub body: DeltaBody,
}

impl Delta {
    #[must_use]
    pub fn mobj(id: impl Into<EntityId>, mobj: MobjDelta) -> Self {
        Self {
            id: id.into(),
            body: DeltaBody::Mobj(mobj),
        }
    }

    #[must_use]
    pub fn null_mobj(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            body: DeltaBody::NullMobj,
        }
    }

    #[must_use]
    pub fn player(id: impl Into<EntityId>, player: PlayerDelta) -> Self {
        Self {
            id: id.into(),
            body: DeltaBody::Player(player),
        }
    }

    #[must_use]
    pub fn sector(id: impl Into<EntityId>, sector: SectorDelta) -> Self {
        Self {
            id: id.into(),
            body: DeltaBody::Sector(sector),
        }
    }

    #[must_use]
    pub fn side(id: impl Into<EntityId>, side: SideDelta) -> Self {
        Self {
            id: id.into(),
            body: DeltaBody::Side(side),
        }
    }

    #[must_use]
    pub fn poly(id: impl Into<EntityId>, poly: PolyDelta) -> Self {
        Self {
            id: id.into(),
            body: DeltaBody::Poly(poly),
        }
    }

    /// A sound from an emitter. World sounds are keyed by their sound id.
    #[must_use]
    pub fn sound(emitter_id: impl Into<EntityId>, sound: SoundDelta) -> Self {
        let id = if sound.emitter == SoundEmitter::World {
            EntityId(sound.sound_id)
        } else {
            emitter_id.into()
        };
        Self {
            id,
            body: DeltaBody::Sound(sound),
        }
    }

    /// Wire record type.
    #[must_use]
    pub const fn delta_type(&self) -> DeltaType {
        match &self.body {
            DeltaBody::Mobj(_) => DeltaType::Mobj,
            DeltaBody::NullMobj => DeltaType::NullMobj,
            DeltaBody::Player(_) => DeltaType::Player,
            DeltaBody::Sector(_) => DeltaType::Sector,
            DeltaBody::Side(_) => DeltaType::Side,
            DeltaBody::Poly(_) => DeltaType::Poly,
            DeltaBody::Sound(sound) => sound.emitter.delta_type(),
        }
    }

    #[must_use]
    pub const fn entity_kind(&self) -> EntityKind {
        EntityKind::of(self.delta_type())
    }

    #[must_use]
    pub const fn entity(&self) -> EntityRef {
        EntityRef::new(self.entity_kind(), self.id)
    }

    /// Pool deduplication key.
    #[must_use]
    pub const fn key(&self) -> DeltaKey {
        DeltaKey::new(self.delta_type(), self.id)
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self.body, DeltaBody::NullMobj)
    }

    #[must_use]
    pub const fn is_sound(&self) -> bool {
        matches!(self.body, DeltaBody::Sound(_))
    }

    /// Returns `true` if the wire form carries no sub-fields.
    ///
    /// A null mobj is never empty: the id alone is its message.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.body {
            DeltaBody::Mobj(mobj) => mobj.is_empty(),
            DeltaBody::NullMobj => false,
            DeltaBody::Player(player) => player.is_empty(),
            DeltaBody::Sector(sector) => sector.is_empty(),
            DeltaBody::Side(side) => side.is_empty(),
            DeltaBody::Poly(poly) => poly.is_empty(),
            DeltaBody::Sound(sound) => sound.is_empty(),
        }
    }

    /// Returns the wire form of this delta.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let body = match &self.body {
            DeltaBody::Mobj(mobj) => DeltaBody::Mobj(mobj.normalized()),
            DeltaBody::NullMobj => DeltaBody::NullMobj,
            DeltaBody::Player(player) => DeltaBody::Player(player.normalized()),
            DeltaBody::Sector(sector) => DeltaBody::Sector(sector.normalized()),
            DeltaBody::Side(side) => DeltaBody::Side(side.normalized()),
            DeltaBody::Poly(poly) => DeltaBody::Poly(poly.normalized()),
            DeltaBody::Sound(sound) => DeltaBody::Sound(sound.normalized()),
        };
        Self { id: self.id, body }
    }

    /// Converts a decoded wire-form delta back to the form producers build.
    #[must_use]
    pub fn denormalized(&self) -> Self {
        let body = match &self.body {
            DeltaBody::Mobj(mobj) => DeltaBody::Mobj(mobj.denormalized()),
            DeltaBody::Poly(poly) => DeltaBody::Poly(poly.denormalized()),
            other => other.clone(),
        };
        Self { id: self.id, body }
    }

    /// Folds a newer delta with the same key into this never-sent one.
    ///
    /// Flags are combined and only the newer delta's flagged fields are
    /// copied. A null mobj and a mobj replace each other outright, as does a
    /// newer sound.
    pub fn merge_from(&mut self, newer: Self) {
        debug_assert_eq!(self.key(), newer.key());
        match (&mut self.body, newer.body) {
            (DeltaBody::Mobj(mine), DeltaBody::Mobj(theirs)) => mine.merge(&theirs),
            (DeltaBody::Player(mine), DeltaBody::Player(theirs)) => mine.merge(&theirs),
            (DeltaBody::Sector(mine), DeltaBody::Sector(theirs)) => mine.merge(&theirs),
            (DeltaBody::Side(mine), DeltaBody::Side(theirs)) => mine.merge(&theirs),
            (DeltaBody::Poly(mine), DeltaBody::Poly(theirs)) => mine.merge(&theirs),
            (body, theirs) => *body = theirs,
        }
    }

    /// Clears from this in-flight delta whatever `newer` supersedes.
    ///
    /// Returns `true` when nothing worth retransmitting is left.
    pub fn subtract(&mut self, newer: &Self) -> bool {
        match (&mut self.body, &newer.body) {
            (DeltaBody::Mobj(mine), DeltaBody::Mobj(theirs)) => mine.subtract(theirs),
            (DeltaBody::Mobj(mine), DeltaBody::NullMobj) => mine.flags = MobjFlags::EMPTY,
            // The mobj exists again; the pending removal is stale.
            (DeltaBody::NullMobj, DeltaBody::Mobj(_)) => return true,
            (DeltaBody::Player(mine), DeltaBody::Player(theirs)) => mine.subtract(theirs),
            (DeltaBody::Sector(mine), DeltaBody::Sector(theirs)) => mine.subtract(theirs),
            (DeltaBody::Side(mine), DeltaBody::Side(theirs)) => mine.subtract(theirs),
            (DeltaBody::Poly(mine), DeltaBody::Poly(theirs)) => mine.subtract(theirs),
            _ => {}
        }
        self.is_empty()
    }
}
