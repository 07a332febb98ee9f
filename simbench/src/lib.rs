//! Deterministic end-to-end simulation of svframe replication.
//!
//! A [`SimWorld`] produces entity changes every tick, a [`server::FrameServer`]
//! turns them into frames, and a [`LossyTransport`] carries the frames to one
//! [`codec::FrameReceiver`] per client, dropping some of them on the way.
//! Receivers acknowledge what they get over the same lossy link.

mod net;
mod rng;
mod summary;
mod world;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use codec::FrameReceiver;
use server::{ClientId, Clock, FrameOutcome, FrameServer, ServerConfig, TIC_RATE};
use tracing::{debug, info};

pub use net::{Delivered, LossyTransport};
pub use rng::Rng;
pub use summary::Summary;
pub use world::SimWorld;

/// Wall time derived from the tick counter.
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    pub tick: u64,
}

impl Clock for SimClock {
    fn current_tick(&self) -> u64 {
        self.tick
    }

    fn now_ms(&self) -> u64 {
        self.tick * 1000 / u64::from(TIC_RATE)
    }
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub clients: u32,
    pub ticks: u64,
    pub seed: u64,
    /// Probability that an unordered frame or an ack is lost.
    pub loss: f32,
    pub mobjs: u32,
    pub sectors: u32,
    /// Link capacity per client.
    pub link_bytes_per_tick: usize,
    /// Tick at which the map changes, resetting every session.
    pub map_change_at: Option<u64>,
    pub server: ServerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            clients: 4,
            ticks: 350,
            seed: 1,
            loss: 0.05,
            mobjs: 64,
            sectors: 32,
            link_bytes_per_tick: 2048,
            map_change_at: None,
            server: ServerConfig::default(),
        }
    }
}

/// Runs the simulation and returns its summary.
pub fn run(config: &SimConfig) -> Result<Summary> {
    let mut server = FrameServer::new(config.server.clone()).context("invalid server config")?;
    let mut world = SimWorld::new(config.seed, config.mobjs, config.sectors, config.clients);
    let mut transport = LossyTransport::new(
        config.link_bytes_per_tick,
        config.loss,
        config.seed.wrapping_add(1),
    );
    let mut receivers = BTreeMap::new();
    for n in 1..=config.clients {
        let client = ClientId(n);
        server.on_client_joined(client);
        server.set_ready(client, true)?;
        server.set_in_game(client, true)?;
        receivers.insert(client, FrameReceiver::default());
    }

    let mut summary = Summary::new(config.clients, config.ticks, config.seed, config.loss);
    for tick in 1..=config.ticks {
        let clock = SimClock { tick };
        if config.map_change_at == Some(tick) {
            info!(tick, "simulated map change");
            server.on_map_changed();
            for receiver in receivers.values_mut() {
                *receiver = FrameReceiver::default();
            }
        }

        let report = server.tick(&mut world, &mut transport, &clock);
        for (_, outcome) in &report.frames {
            match outcome {
                FrameOutcome::Sent(stats) => summary.record_frame(stats),
                FrameOutcome::Backpressure => summary.backpressure_skips += 1,
            }
        }

        let now_ms = clock.now_ms();
        for delivered in transport.deliver() {
            let Some(receiver) = receivers.get_mut(&delivered.client) else {
                continue;
            };
            let frame = receiver
                .receive(&delivered.bytes)
                .with_context(|| format!("client {} rejected a frame", delivered.client))?;
            summary.deltas_delivered += frame.deltas.len() as u64;
            summary.duplicates_filtered += frame.duplicates as u64;
            summary.resent_records += frame.ack.resends.len() as u64;
            for (set, resend) in frame.ack.acks() {
                if transport.ack_survives() {
                    summary.acks_sent += 1;
                    server.on_ack_received(delivered.client, set, resend, now_ms);
                } else {
                    summary.acks_lost += 1;
                }
            }
        }
        debug!(tick, frames = report.frames.len(), "simulated tick");
    }

    summary.frames_lost = transport.lost();
    summary.pending_at_end = server
        .sessions()
        .map(|session| session.pool().pending_count() as u64)
        .sum();
    summary.finalize();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SimConfig {
        SimConfig {
            clients: 2,
            ticks: 120,
            mobjs: 16,
            sectors: 8,
            ..SimConfig::default()
        }
    }

    #[test]
    fn lossless_run_delivers_everything_within_budget() {
        let config = SimConfig {
            loss: 0.0,
            ..small()
        };
        let summary = run(&config).unwrap();
        assert!(summary.frames_sent > 0);
        assert_eq!(summary.budget_violations, 0);
        assert_eq!(summary.frames_lost, 0);
        assert_eq!(summary.duplicates_filtered, 0);
        assert!(summary.deltas_delivered > 0);
        summary.assert_budgets(None, None).unwrap();
    }

    #[test]
    fn lossy_run_resends_and_stays_within_budget() {
        let config = SimConfig {
            loss: 0.3,
            ..small()
        };
        let summary = run(&config).unwrap();
        assert!(summary.frames_lost > 0);
        assert!(summary.resent_records > 0);
        assert_eq!(summary.budget_violations, 0);
    }

    #[test]
    fn runs_are_deterministic() {
        let a = run(&small()).unwrap();
        let b = run(&small()).unwrap();
        assert_eq!(a.bytes_total, b.bytes_total);
        assert_eq!(a.deltas_delivered, b.deltas_delivered);
        assert_eq!(a.pending_at_end, b.pending_at_end);
    }

    #[test]
    fn map_change_restarts_with_first_frames() {
        let config = SimConfig {
            map_change_at: Some(60),
            loss: 0.0,
            ..small()
        };
        let summary = run(&config).unwrap();
        assert_eq!(summary.budget_violations, 0);
        assert!(summary.max_frame_bytes > 0);
    }

    #[test]
    fn clock_follows_tic_rate() {
        assert_eq!(SimClock { tick: 35 }.now_ms(), 1000);
        assert!((SimClock { tick: 70 }.game_time() - 2.0).abs() < 1e-6);
    }
}
