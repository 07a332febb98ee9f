//! Client sessions and the per-tick frame pipeline.

use std::collections::BTreeMap;

use model::Delta;
use tracing::{debug, info, trace};

use crate::config::ServerConfig;
use crate::encoder::{self, FrameOutcome};
use crate::error::{ServerError, ServerResult};
use crate::scheduler::FrameScheduler;
use crate::session::{ClientId, ClientSession};
use crate::transport::{Clock, Transport, WorldSnapshot};

/// Frames produced by one [`FrameServer::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    /// `false` when the tick was a repeat or there was nobody to serve.
    pub processed: bool,
    pub frames: Vec<(ClientId, FrameOutcome)>,
}

/// Owns every client's session and drives frame generation.
#[derive(Debug, Clone)]
pub struct FrameServer {
    config: ServerConfig,
    sessions: BTreeMap<ClientId, ClientSession>,
    scheduler: FrameScheduler,
}

impl FrameServer {
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sessions: BTreeMap::new(),
            scheduler: FrameScheduler::new(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn set_net_game(&mut self, net_game: bool) {
        self.config.net_game = net_game;
    }

    #[must_use]
    pub fn session(&self, client: ClientId) -> Option<&ClientSession> {
        self.sessions.get(&client)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &ClientSession> {
        self.sessions.values()
    }

    #[must_use]
    pub fn client_count(&self) -> usize {
        self.sessions.len()
    }

    /// Creates a fresh session. A rejoining client starts over.
    pub fn on_client_joined(&mut self, client: ClientId) {
        info!(%client, "client joined");
        self.sessions
            .insert(client, ClientSession::new(client, self.config.pool.clone()));
    }

    /// Drops the client's session and everything pending for it.
    pub fn on_client_left(&mut self, client: ClientId) {
        if let Some(session) = self.sessions.remove(&client) {
            info!(
                %client,
                pending = session.pool().pending_count(),
                "client left"
            );
        }
    }

    /// Discards every pool; the next frame to each client is a first frame.
    pub fn on_map_changed(&mut self) {
        info!(clients = self.sessions.len(), "map changed, resetting pools");
        for session in self.sessions.values_mut() {
            session.reset_for_map_change();
        }
    }

    /// Applies a client acknowledgment. Unknown clients and sets are ignored.
    pub fn on_ack_received(&mut self, client: ClientId, set: u8, resend: u8, now_ms: u64) -> usize {
        match self.sessions.get_mut(&client) {
            Some(session) => session.pool.acknowledge(set, resend, now_ms),
            None => {
                trace!(%client, set, resend, "ack from unknown client");
                0
            }
        }
    }

    pub fn queue_delta(&mut self, client: ClientId, delta: Delta, now_ms: u64) -> ServerResult<()> {
        let session = self.session_mut(client)?;
        session.pool.insert_or_merge(delta, now_ms);
        Ok(())
    }

    /// Queues `delta` for every connected client. Returns how many took it.
    pub fn broadcast_delta(&mut self, delta: &Delta, now_ms: u64) -> usize {
        broadcast(&mut self.sessions, delta, now_ms)
    }

    pub fn set_ready(&mut self, client: ClientId, ready: bool) -> ServerResult<()> {
        self.session_mut(client)?.ready = ready;
        Ok(())
    }

    pub fn set_in_game(&mut self, client: ClientId, in_game: bool) -> ServerResult<()> {
        self.session_mut(client)?.in_game = in_game;
        Ok(())
    }

    pub fn set_recording(&mut self, client: ClientId, recording: bool) -> ServerResult<()> {
        self.session_mut(client)?.recording = recording;
        Ok(())
    }

    /// Marks a loopback client, whose frames need no acknowledgment.
    pub fn set_local(&mut self, client: ClientId, local: bool) -> ServerResult<()> {
        self.session_mut(client)?.local = local;
        Ok(())
    }

    /// Encodes and sends one frame to `client` now, bypassing the scheduler.
    pub fn send_frame<T>(
        &mut self,
        client: ClientId,
        transport: &mut T,
        now_ms: u64,
        game_time: f32,
    ) -> ServerResult<FrameOutcome>
    where
        T: Transport + ?Sized,
    {
        let session = self
            .sessions
            .get_mut(&client)
            .ok_or(ServerError::UnknownClient { client })?;
        Ok(encoder::send_frame(
            session,
            transport,
            &self.config,
            now_ms,
            game_time,
        ))
    }

    /// One simulation tick: pull world changes, then send every due frame.
    pub fn tick<W, T, C>(&mut self, world: &mut W, transport: &mut T, clock: &C) -> TickReport
    where
        W: WorldSnapshot + ?Sized,
        T: Transport + ?Sized,
        C: Clock + ?Sized,
    {
        let tick = clock.current_tick();
        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };
        if !self.scheduler.begin_tick(tick) {
            return report;
        }
        if !self.config.net_game && !self.sessions.values().any(|s| s.recording) {
            trace!(tick, "no net game and no recorder, nothing to replicate");
            return report;
        }
        report.processed = true;

        let now_ms = clock.now_ms();
        self.pull_world(world, tick, now_ms);

        let targets: Vec<ClientId> = self
            .sessions
            .values()
            .filter(|session| session.is_frame_target())
            .map(ClientSession::id)
            .collect();
        let count = targets.len() as u64;
        let interval = self.config.frame_interval;
        let game_time = clock.game_time();

        for (ordinal, client) in (0u64..).zip(targets) {
            let Some(session) = self.sessions.get_mut(&client) else {
                continue;
            };
            if !FrameScheduler::is_due(tick, session.last_transmit, ordinal, count, interval) {
                continue;
            }
            session.last_transmit = Some(tick);
            let outcome = encoder::send_frame(session, transport, &self.config, now_ms, game_time);
            report.frames.push((client, outcome));
        }
        report
    }

    fn pull_world<W>(&mut self, world: &mut W, tick: u64, now_ms: u64)
    where
        W: WorldSnapshot + ?Sized,
    {
        for session in self.sessions.values_mut() {
            if session.needs_baseline && session.is_frame_target() {
                let mut count = 0usize;
                world.for_each_live_entity(&mut |delta| {
                    session.pool.insert_or_merge(delta, now_ms);
                    count += 1;
                });
                session.needs_baseline = false;
                debug!(client = %session.id(), deltas = count, "queued baseline");
            }
        }

        let sessions = &mut self.sessions;
        world.for_each_changed_entity(tick, &mut |delta| {
            broadcast(sessions, &delta, now_ms);
        });
    }

    fn session_mut(&mut self, client: ClientId) -> ServerResult<&mut ClientSession> {
        self.sessions
            .get_mut(&client)
            .ok_or(ServerError::UnknownClient { client })
    }
}

fn broadcast(sessions: &mut BTreeMap<ClientId, ClientSession>, delta: &Delta, now_ms: u64) -> usize {
    let mut queued = 0;
    for session in sessions.values_mut() {
        if session.pool.insert_or_merge(delta.clone(), now_ms).is_some() {
            queued += 1;
        }
    }
    queued
}

#[cfg(test)]
mod tests {
    use model::{MobjDelta, SectorDelta};

    use super::*;

    fn server() -> FrameServer {
        FrameServer::new(ServerConfig::for_testing()).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ServerConfig {
            frame_interval: 0,
            ..ServerConfig::for_testing()
        };
        assert!(FrameServer::new(config).is_err());
    }

    #[test]
    fn setters_require_a_session() {
        let mut server = server();
        assert_eq!(
            server.set_ready(ClientId(3), true),
            Err(ServerError::UnknownClient {
                client: ClientId(3)
            })
        );
        server.on_client_joined(ClientId(3));
        assert!(server.set_ready(ClientId(3), true).is_ok());
        assert!(server.session(ClientId(3)).unwrap().is_ready());
    }

    #[test]
    fn broadcast_reaches_every_client() {
        let mut server = server();
        server.on_client_joined(ClientId(1));
        server.on_client_joined(ClientId(2));
        let delta = Delta::sector(4u32, SectorDelta::new().with_light(0.5));
        assert_eq!(server.broadcast_delta(&delta, 0), 2);
        assert!(server
            .sessions()
            .all(|session| session.pool().pending_count() == 1));
    }

    #[test]
    fn leaving_drops_the_session() {
        let mut server = server();
        server.on_client_joined(ClientId(1));
        server
            .queue_delta(ClientId(1), Delta::mobj(1u32, MobjDelta::new().with_health(1)), 0)
            .unwrap();
        server.on_client_left(ClientId(1));
        assert_eq!(server.client_count(), 0);
        assert_eq!(server.on_ack_received(ClientId(1), 0, 0, 0), 0);
    }

    #[test]
    fn map_change_resets_pools() {
        let mut server = server();
        server.on_client_joined(ClientId(1));
        server
            .queue_delta(ClientId(1), Delta::mobj(1u32, MobjDelta::new().with_health(1)), 0)
            .unwrap();
        server.on_map_changed();
        let session = server.session(ClientId(1)).unwrap();
        assert_eq!(session.pool().pending_count(), 0);
        assert!(session.pool().is_first());
    }
}
