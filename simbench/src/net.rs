use std::collections::{BTreeMap, VecDeque};

use server::{BandwidthRating, ClientId, SendQueueMonitor, Transport};
use wire::Channel;

use crate::rng::Rng;

#[derive(Debug, Default)]
struct Link {
    queue: VecDeque<(Vec<u8>, Channel)>,
    queued_bytes: usize,
    monitor: SendQueueMonitor,
}

/// A frame that survived the link.
#[derive(Debug, Clone)]
pub struct Delivered {
    pub client: ClientId,
    pub bytes: Vec<u8>,
    pub channel: Channel,
}

/// Per-client send queues drained at a fixed byte rate. Unordered frames are
/// dropped with probability `loss` when they reach the far end.
#[derive(Debug)]
pub struct LossyTransport {
    links: BTreeMap<ClientId, Link>,
    bytes_per_tick: usize,
    loss: f32,
    rng: Rng,
    lost: u64,
}

impl LossyTransport {
    #[must_use]
    pub fn new(bytes_per_tick: usize, loss: f32, seed: u64) -> Self {
        Self {
            links: BTreeMap::new(),
            bytes_per_tick,
            loss,
            rng: Rng::new(seed),
            lost: 0,
        }
    }

    pub fn disconnect(&mut self, client: ClientId) {
        self.links.remove(&client);
    }

    #[must_use]
    pub fn lost(&self) -> u64 {
        self.lost
    }

    #[must_use]
    pub fn queued_bytes(&self, client: ClientId) -> usize {
        self.links.get(&client).map_or(0, |link| link.queued_bytes)
    }

    /// Moves up to one tick's worth of bytes off every queue. A frame that
    /// has started transmitting always completes.
    pub fn deliver(&mut self) -> Vec<Delivered> {
        let mut delivered = Vec::new();
        for (&client, link) in &mut self.links {
            let mut budget = self.bytes_per_tick;
            while budget > 0 {
                let Some((bytes, channel)) = link.queue.pop_front() else {
                    break;
                };
                budget = budget.saturating_sub(bytes.len());
                link.queued_bytes -= bytes.len();
                if channel == Channel::Unordered && self.rng.chance(self.loss) {
                    self.lost += 1;
                    continue;
                }
                delivered.push(Delivered {
                    client,
                    bytes,
                    channel,
                });
            }
        }
        delivered
    }

    /// Whether an ack sent back to the server survives.
    pub fn ack_survives(&mut self) -> bool {
        !self.rng.chance(self.loss)
    }
}

impl Transport for LossyTransport {
    fn can_send_now(&mut self, client: ClientId) -> bool {
        let link = self.links.entry(client).or_default();
        link.monitor.update(link.queued_bytes)
    }

    fn send(&mut self, client: ClientId, frame: Vec<u8>, channel: Channel) {
        let link = self.links.entry(client).or_default();
        link.queued_bytes += frame.len();
        link.queue.push_back((frame, channel));
    }

    fn bandwidth_rating(&self, client: ClientId) -> BandwidthRating {
        self.links
            .get(&client)
            .map(|link| link.monitor.rating())
            .unwrap_or_default()
    }
}
