//! Bandwidth rating and the frame byte budget derived from it.

use std::fmt;

use tracing::trace;

/// Adaptive estimate of a client's outbound capacity, `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BandwidthRating(u8);

impl BandwidthRating {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(100);

    /// Clamps `value` into range.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        if value > Self::MAX.0 {
            Self::MAX
        } else {
            Self(value)
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn raised(self, step: u8) -> Self {
        Self::new(self.0.saturating_add(step))
    }

    #[must_use]
    pub const fn lowered(self, step: u8) -> Self {
        Self(self.0.saturating_sub(step))
    }
}

impl Default for BandwidthRating {
    fn default() -> Self {
        Self(40)
    }
}

impl fmt::Display for BandwidthRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Frame size caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FrameBudget {
    /// Budget at rating zero.
    pub min_frame_bytes: usize,
    /// Extra bytes per rating point.
    pub bytes_per_rating: usize,
    /// Largest datagram the transport accepts.
    pub max_datagram_bytes: usize,
    /// Cap for the first frame after a join or map change.
    pub max_first_frame_bytes: usize,
}

impl Default for FrameBudget {
    fn default() -> Self {
        Self {
            min_frame_bytes: 80,
            bytes_per_rating: 12,
            max_datagram_bytes: 1400,
            max_first_frame_bytes: 64 * 1024,
        }
    }
}

impl FrameBudget {
    /// Small caps that a handful of deltas overflow.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            min_frame_bytes: 32,
            bytes_per_rating: 1,
            max_datagram_bytes: 128,
            max_first_frame_bytes: 512,
        }
    }

    /// `clamp(min + factor * rating, min, max_datagram)`.
    #[must_use]
    pub fn max_frame_size(&self, rating: BandwidthRating) -> usize {
        let wanted = self
            .min_frame_bytes
            .saturating_add(self.bytes_per_rating.saturating_mul(usize::from(rating.get())));
        wanted
            .min(self.max_datagram_bytes)
            .max(self.min_frame_bytes)
    }

    #[must_use]
    pub const fn max_first_frame_size(&self) -> usize {
        self.max_first_frame_bytes
    }

    /// Budget for the next frame.
    #[must_use]
    pub fn for_frame(&self, first: bool, rating: BandwidthRating) -> usize {
        if first {
            self.max_first_frame_size()
        } else {
            self.max_frame_size(rating)
        }
    }
}

/// Rating upkeep from the transport's send-queue length.
///
/// Transports that track their own queue can call [`Self::update`] from
/// `can_send_now` and report [`Self::rating`] as the client's rating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendQueueMonitor {
    rating: BandwidthRating,
    high_water_mark: usize,
    settle_updates: u32,
    quiet_updates: u32,
}

impl Default for SendQueueMonitor {
    fn default() -> Self {
        Self::new(BandwidthRating::default(), 400, 3)
    }
}

impl SendQueueMonitor {
    const RAISE_STEP: u8 = 5;
    const LOWER_STEP: u8 = 10;
    const REFUSE_FACTOR: usize = 10;

    #[must_use]
    pub const fn new(rating: BandwidthRating, high_water_mark: usize, settle_updates: u32) -> Self {
        Self {
            rating,
            high_water_mark,
            settle_updates,
            quiet_updates: 0,
        }
    }

    #[must_use]
    pub const fn rating(&self) -> BandwidthRating {
        self.rating
    }

    /// Adjusts the rating for `queued` bytes and reports whether sending is
    /// allowed.
    pub fn update(&mut self, queued: usize) -> bool {
        if queued > self.high_water_mark {
            self.quiet_updates = 0;
            let lowered = self.rating.lowered(Self::LOWER_STEP);
            if lowered != self.rating {
                trace!(queued, rating = lowered.get(), "send queue backed up, lowering rating");
            }
            self.rating = lowered;
        } else if queued < self.high_water_mark / 20 {
            self.quiet_updates += 1;
            if self.quiet_updates >= self.settle_updates {
                self.quiet_updates = 0;
                self.rating = self.rating.raised(Self::RAISE_STEP);
            }
        } else {
            self.quiet_updates = 0;
        }
        queued <= self.high_water_mark.saturating_mul(Self::REFUSE_FACTOR)
    }
}
