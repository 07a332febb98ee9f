use anyhow::Result;
use serde::Serialize;
use server::FrameStats;

/// Aggregate results of one simulation run, written as `summary.json`.
#[derive(Debug, Default, Serialize)]
pub struct Summary {
    pub clients: u32,
    pub ticks: u64,
    pub seed: u64,
    pub loss: f32,
    pub frames_sent: u64,
    pub frames_lost: u64,
    pub backpressure_skips: u64,
    pub bytes_total: u64,
    pub avg_frame_bytes: u64,
    pub p95_frame_bytes: u64,
    pub max_frame_bytes: u64,
    /// Frames larger than their budget beyond the single-record allowance.
    pub budget_violations: u64,
    pub deltas_sent: u64,
    pub deltas_delivered: u64,
    pub duplicates_filtered: u64,
    pub resent_records: u64,
    pub acks_sent: u64,
    pub acks_lost: u64,
    pub pending_at_end: u64,
    #[serde(skip)]
    frame_sizes: Vec<u64>,
}

impl Summary {
    #[must_use]
    pub fn new(clients: u32, ticks: u64, seed: u64, loss: f32) -> Self {
        Self {
            clients,
            ticks,
            seed,
            loss,
            ..Self::default()
        }
    }

    pub fn record_frame(&mut self, stats: &FrameStats) {
        let bytes = stats.bytes as u64;
        self.frames_sent += 1;
        self.bytes_total += bytes;
        self.deltas_sent += stats.deltas as u64;
        self.max_frame_bytes = self.max_frame_bytes.max(bytes);
        if !stats.within_budget() {
            self.budget_violations += 1;
        }
        self.frame_sizes.push(bytes);
    }

    pub fn finalize(&mut self) {
        if self.frames_sent > 0 {
            self.avg_frame_bytes = self.bytes_total / self.frames_sent;
            self.p95_frame_bytes = p95(&mut self.frame_sizes);
        }
    }

    pub fn assert_budgets(&self, max_p95: Option<u64>, max_avg: Option<u64>) -> Result<()> {
        if self.budget_violations > 0 {
            anyhow::bail!("{} frames exceeded their byte budget", self.budget_violations);
        }
        if let Some(max_p95) = max_p95 {
            if self.p95_frame_bytes > max_p95 {
                anyhow::bail!(
                    "p95 frame bytes {} exceeds budget {}",
                    self.p95_frame_bytes,
                    max_p95
                );
            }
        }
        if let Some(max_avg) = max_avg {
            if self.avg_frame_bytes > max_avg {
                anyhow::bail!(
                    "avg frame bytes {} exceeds budget {}",
                    self.avg_frame_bytes,
                    max_avg
                );
            }
        }
        Ok(())
    }
}

fn p95(values: &mut [u64]) -> u64 {
    values.sort_unstable();
    let idx = ((values.len() as f64) * 0.95).ceil() as usize;
    let idx = idx.saturating_sub(1).min(values.len() - 1);
    values[idx]
}
