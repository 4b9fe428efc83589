//! Navigation attention cue
//!
//! Every `interval`, the next nav link in a round-robin gets a short
//! highlight that lasts `hold`. The first highlight fires one interval after
//! start.

use std::time::Duration;

pub const CUE_INTERVAL: Duration = Duration::from_millis(1500);
pub const CUE_HOLD: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct NavCue {
    links: usize,
    interval: Duration,
    hold: Duration,
    cursor: usize,
    cancelled: bool,
}

impl Default for NavCue {
    fn default() -> Self {
        Self::new(2, CUE_INTERVAL, CUE_HOLD)
    }
}

impl NavCue {
    pub fn new(links: usize, interval: Duration, hold: Duration) -> Self {
        Self {
            links,
            interval,
            hold: hold.min(interval),
            cursor: 0,
            cancelled: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }

    /// Link to highlight on this timer fire, advancing the cursor
    pub fn next_link(&mut self) -> Option<usize> {
        if self.cancelled || self.links == 0 {
            return None;
        }
        let link = self.cursor;
        self.cursor = (self.cursor + 1) % self.links;
        Some(link)
    }

    /// Which link is highlighted `elapsed` after start, if any
    pub fn highlighted_at(&self, elapsed: Duration) -> Option<usize> {
        if self.cancelled || self.links == 0 || self.interval.is_zero() {
            return None;
        }
        let fires = elapsed.as_nanos() / self.interval.as_nanos();
        if fires == 0 {
            return None;
        }
        let since_fire = elapsed.as_nanos() - fires * self.interval.as_nanos();
        if since_fire < self.hold.as_nanos() {
            Some(((fires - 1) % self.links as u128) as usize)
        } else {
            None
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
