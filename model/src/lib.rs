//! Delta model for server-to-client world replication.
//!
//! This crate defines what a delta is, independent of how it is framed:
//! - Entity identity and pool deduplication keys
//! - One payload type per entity kind, each with its own sub-field flag set
//! - Normalization into wire form (pinned Z, perpetual rotation, derived bits)
//! - Merge and subtract rules used by the delta pool
//! - Quantization helpers (fixed point, angles, colors, volumes)
//!
//! # Design Principles
//!
//! - **Typed flags** - Each delta type has its own flag newtype; bits never mix.
//! - **Explicit sentinels** - "On floor" is [`ZPosition::OnFloor`], not a magic float.
//! - **Pure transforms** - Normalization, merge and subtract touch only the delta.

mod delta;
mod flags;
mod mobj;
mod player;
mod poly;
pub mod quant;
mod sector;
mod side;
mod sound;
mod types;

pub use delta::{Delta, DeltaBody};
pub use mobj::{MobjDelta, MobjFlags, ZPosition};
pub use player::{PlayerDelta, PlayerFlags, PspriteDelta, PspriteFlags, NUM_PSPRITES};
pub use poly::{PolyDelta, PolyFlags, PolyRotation};
pub use quant::{MomentumEncoding, FAST_MOMENTUM_LIMIT};
pub use sector::{SectorDelta, SectorFlags};
pub use side::{SideDelta, SideFlags};
pub use sound::{SoundDelta, SoundEmitter, SoundFlags};
pub use types::{DeltaKey, EntityId, EntityKind, EntityRef};
pub use wire::DeltaType;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = Delta::null_mobj(1u32);
        let _ = MobjDelta::new();
        let _ = PlayerDelta::new();
        let _ = SectorDelta::new();
        let _ = SideDelta::new();
        let _ = PolyDelta::new();
        let _ = SoundDelta::new(SoundEmitter::World, 1, 1.0);
        let _ = MomentumEncoding::Normal8_8;
        let _ = DeltaKey::new(DeltaType::Mobj, EntityId(1));
    }

    #[test]
    fn every_body_maps_to_a_distinct_type() {
        let deltas = [
            Delta::mobj(1u32, MobjDelta::new()),
            Delta::null_mobj(1u32),
            Delta::player(1u32, PlayerDelta::new()),
            Delta::sector(1u32, SectorDelta::new()),
            Delta::side(1u32, SideDelta::new()),
            Delta::poly(1u32, PolyDelta::new()),
            Delta::sound(1u32, SoundDelta::new(SoundEmitter::World, 1, 1.0)),
            Delta::sound(1u32, SoundDelta::new(SoundEmitter::Mobj, 1, 1.0)),
            Delta::sound(1u32, SoundDelta::new(SoundEmitter::Sector, 1, 1.0)),
            Delta::sound(1u32, SoundDelta::new(SoundEmitter::Poly, 1, 1.0)),
        ];
        let mut types: Vec<_> = deltas.iter().map(Delta::delta_type).collect();
        types.sort();
        types.dedup();
        assert_eq!(types.len(), DeltaType::ALL.len());
    }
}
