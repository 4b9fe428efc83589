//! Fixed-rate frame scheduler
//!
//! The host supplies a one-shot "call me next frame" primitive
//! ([`FrameHost`]). The scheduler re-requests a frame after each callback,
//! converts elapsed time into fixed ticks, skips work while hidden, and on
//! cancel guarantees nothing is left pending and nothing reschedules.

use std::ops::ControlFlow;
use std::time::Duration;

/// Host-issued id of a pending frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequestId(pub i32);

/// One-shot frame request primitive (e.g. `requestAnimationFrame`)
pub trait FrameHost {
    fn request_frame(&mut self) -> FrameRequestId;
    fn cancel_frame(&mut self, id: FrameRequestId);
}

/// Elapsed time per frame is capped so a long stall does not replay as a burst
const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Running,
    Cancelled,
}

/// Turns host frames into fixed ticks
#[derive(Debug)]
pub struct FrameScheduler {
    tick: Duration,
    max_substeps: u32,
    accumulator: Duration,
    last_frame: Option<Duration>,
    visible: bool,
    state: RunState,
    pending: Option<FrameRequestId>,
    /// Ticks run since start
    pub total_ticks: u64,
}

impl FrameScheduler {
    pub fn new(tick_hz: f32, max_substeps: u32) -> Self {
        Self {
            tick: Duration::from_nanos((1e9 / f64::from(tick_hz)).round() as u64),
            max_substeps: max_substeps.max(1),
            accumulator: Duration::ZERO,
            last_frame: None,
            visible: true,
            state: RunState::Idle,
            pending: None,
            total_ticks: 0,
        }
    }

    /// Request the first frame. No-op unless idle.
    pub fn start<H: FrameHost>(&mut self, host: &mut H) {
        if self.state != RunState::Idle {
            return;
        }
        self.state = RunState::Running;
        self.pending = Some(host.request_frame());
    }

    /// Handle a host frame at timestamp `now`.
    ///
    /// Calls `tick` with the number of due fixed steps (at most
    /// `max_substeps`), then requests the next frame. Returns the number of
    /// ticks run. If `tick` breaks, the scheduler is cancelled and no further
    /// frame is requested.
    pub fn on_frame<H: FrameHost>(
        &mut self,
        host: &mut H,
        now: Duration,
        mut tick: impl FnMut(u32) -> ControlFlow<()>,
    ) -> u32 {
        self.pending = None;
        if self.state != RunState::Running {
            return 0;
        }

        let mut ran = 0;
        if self.visible {
            let delta = match self.last_frame {
                Some(last) => now.saturating_sub(last).min(MAX_FRAME_DELTA),
                // First frame after start or resume runs a single tick
                None => self.tick,
            };
            self.last_frame = Some(now);

            self.accumulator += delta;
            while self.accumulator >= self.tick && ran < self.max_substeps {
                self.accumulator -= self.tick;
                ran += 1;
            }
            if ran == self.max_substeps {
                // Drop the backlog instead of chasing it next frame
                self.accumulator = Duration::ZERO;
            }
            if ran > 0 {
                self.total_ticks += u64::from(ran);
                if tick(ran).is_break() {
                    log::debug!("Frame scheduler stopped from inside a tick");
                    self.state = RunState::Cancelled;
                }
            }
        }

        if self.state == RunState::Running {
            self.pending = Some(host.request_frame());
        }
        ran
    }

    /// Pause or resume ticking. Hidden frames do not bank time.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            log::debug!("Frame scheduler {}", if visible { "resumed" } else { "paused" });
        }
        self.visible = visible;
        if !visible {
            self.accumulator = Duration::ZERO;
            self.last_frame = None;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Stop for good: cancel the pending request and never reschedule
    pub fn cancel<H: FrameHost>(&mut self, host: &mut H) {
        self.state = RunState::Cancelled;
        if let Some(id) = self.pending.take() {
            host.cancel_frame(id);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == RunState::Cancelled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick
    }
}

/// Frame host driven by explicit calls, for headless runs and tests
#[derive(Debug, Default)]
pub struct ManualFrameHost {
    next_id: i32,
    pending: Vec<FrameRequestId>,
    /// Requests ever issued
    pub requested: u32,
    /// Requests cancelled before firing
    pub cancelled: u32,
}

impl ManualFrameHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests still waiting to fire
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Fire the oldest pending request. Returns false if none was pending.
    pub fn fire(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        self.pending.remove(0);
        true
    }
}

impl FrameHost for ManualFrameHost {
    fn request_frame(&mut self) -> FrameRequestId {
        self.next_id += 1;
        self.requested += 1;
        let id = FrameRequestId(self.next_id);
        self.pending.push(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        if let Some(pos) = self.pending.iter().position(|p| *p == id) {
            self.pending.remove(pos);
            self.cancelled += 1;
        }
    }
}
