use model::{
    Delta, MobjDelta, PlayerDelta, SectorDelta, SoundDelta, SoundEmitter, ZPosition,
};
use server::WorldSnapshot;

use crate::rng::Rng;

#[derive(Debug, Clone)]
struct SimMobj {
    id: u32,
    pos: [f32; 3],
    mom: [f32; 3],
    angle: u32,
    health: i32,
    alive: bool,
}

impl SimMobj {
    fn full_delta(&self) -> Delta {
        Delta::mobj(
            self.id,
            MobjDelta::new()
                .with_origin(self.pos[0], self.pos[1], ZPosition::OnFloor)
                .with_momentum(self.mom)
                .with_angle(self.angle)
                .with_size(16.0, 56.0)
                .with_health(self.health)
                .with_type(1),
        )
    }
}

/// A toy map: roaming mobjs, flickering sectors, one player per client and
/// the occasional sound.
#[derive(Debug, Clone)]
pub struct SimWorld {
    rng: Rng,
    mobjs: Vec<SimMobj>,
    sectors: u32,
    players: u32,
}

impl SimWorld {
    #[must_use]
    pub fn new(seed: u64, mobjs: u32, sectors: u32, players: u32) -> Self {
        let mut rng = Rng::new(seed);
        let mobjs = (0..mobjs)
            .map(|id| SimMobj {
                id,
                pos: [rng.range_f32(-2048.0, 2048.0), rng.range_f32(-2048.0, 2048.0), 0.0],
                mom: [0.0; 3],
                angle: rng.next_u32(),
                health: 100,
                alive: true,
            })
            .collect();
        Self {
            rng,
            mobjs,
            sectors: sectors.max(1),
            players,
        }
    }

    fn step_mobj(rng: &mut Rng, mobj: &mut SimMobj, visit: &mut dyn FnMut(Delta)) {
        if !mobj.alive {
            if rng.chance(0.02) {
                mobj.alive = true;
                mobj.health = 100;
                visit(mobj.full_delta());
            }
            return;
        }
        if rng.chance(0.005) {
            mobj.alive = false;
            visit(Delta::null_mobj(mobj.id));
            return;
        }

        let mut delta = MobjDelta::new();
        if rng.chance(0.1) {
            // Occasional projectile-speed bursts exercise the wide encoding.
            let speed = if rng.chance(0.1) { 160.0 } else { 8.0 };
            mobj.mom = [rng.range_f32(-speed, speed), rng.range_f32(-speed, speed), 0.0];
            mobj.angle = rng.next_u32();
            delta = delta.with_momentum(mobj.mom).with_angle(mobj.angle);
        }
        if mobj.mom != [0.0; 3] {
            for (pos, mom) in mobj.pos.iter_mut().zip(mobj.mom) {
                *pos = (*pos + mom).clamp(-4096.0, 4096.0);
            }
            delta = delta.with_origin(mobj.pos[0], mobj.pos[1], ZPosition::OnFloor);
        }
        if rng.chance(0.01) {
            mobj.health -= 10;
            delta = delta.with_health(mobj.health);
        }
        let delta = Delta::mobj(mobj.id, delta);
        if !delta.is_empty() {
            visit(delta);
        }
    }
}

impl WorldSnapshot for SimWorld {
    fn for_each_changed_entity(&mut self, tick: u64, visit: &mut dyn FnMut(Delta)) {
        let rng = &mut self.rng;
        for mobj in &mut self.mobjs {
            Self::step_mobj(rng, mobj, visit);
        }

        for player in 0..self.players {
            let forward = (rng.below(101) as i32 - 50) as i8;
            visit(Delta::player(
                player,
                PlayerDelta::new()
                    .with_movement(forward, 0)
                    .with_view(rng.next_u32(), rng.range_f32(-30.0, 30.0)),
            ));
        }

        if tick % 10 == 0 {
            let sector = rng.below(self.sectors);
            visit(Delta::sector(
                sector,
                SectorDelta::new().with_light(rng.unit()),
            ));
        }

        if rng.chance(0.05) {
            let sound = 1 + rng.below(100);
            visit(Delta::sound(0u32, SoundDelta::new(SoundEmitter::World, sound, 1.0)));
        }
        if rng.chance(0.1) && !self.mobjs.is_empty() {
            let len = u32::try_from(self.mobjs.len()).unwrap_or(u32::MAX);
            let emitter = self.mobjs[rng.below(len) as usize].id;
            visit(Delta::sound(
                emitter,
                SoundDelta::new(SoundEmitter::Mobj, 1 + rng.below(100), rng.unit()),
            ));
        }
    }

    fn for_each_live_entity(&mut self, visit: &mut dyn FnMut(Delta)) {
        for mobj in self.mobjs.iter().filter(|mobj| mobj.alive) {
            visit(mobj.full_delta());
        }
        for sector in 0..self.sectors {
            visit(Delta::sector(
                sector,
                SectorDelta::new()
                    .with_materials(1, 2)
                    .with_light(1.0)
                    .with_heights(0.0, 128.0),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_covers_live_entities() {
        let mut world = SimWorld::new(1, 5, 3, 1);
        let mut count = 0;
        world.for_each_live_entity(&mut |_| count += 1);
        assert_eq!(count, 8);
    }

    #[test]
    fn changes_never_include_empty_deltas() {
        let mut world = SimWorld::new(2, 20, 4, 2);
        for tick in 0..100 {
            world.for_each_changed_entity(tick, &mut |delta| assert!(!delta.is_empty()));
        }
    }

    #[test]
    fn worlds_are_deterministic() {
        let collect = |seed| {
            let mut world = SimWorld::new(seed, 10, 2, 1);
            let mut out = Vec::new();
            for tick in 0..20 {
                world.for_each_changed_entity(tick, &mut |delta| out.push(delta));
            }
            out
        };
        assert_eq!(collect(7), collect(7));
    }
}
