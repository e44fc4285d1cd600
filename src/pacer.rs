//! Frame pacing and adaptive frame rate.
//!
//! The pacer measures how long each tick took and returns how long to sleep
//! before the next one. It does not sleep itself; [`PrecisionSleeper`] does
//! that for the render loop.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_time::{Duration, Instant};
use heapless::Deque;

/// Default target frame rate (60 FPS).
pub const DEFAULT_FPS: u32 = 60;

/// Default lower bound of the adaptive frame rate.
pub const DEFAULT_MIN_FPS: u32 = 15;

/// Default upper bound of the adaptive frame rate.
pub const DEFAULT_MAX_FPS: u32 = 120;

/// Number of ticks evaluated before an adaptive adjustment.
pub const ADAPTIVE_WINDOW: usize = 10;

/// Final part of a sleep that is spent spinning instead of sleeping.
pub const DEFAULT_SPIN_THRESHOLD: Duration = Duration::from_millis(2);

/// Longest single OS sleep, bounds how late a stop request is noticed.
pub const DEFAULT_SLEEP_CHUNK: Duration = Duration::from_millis(10);

/// Frame rate settings, normally fed from the `*_fps` parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacerConfig {
    pub target_fps: u32,
    pub min_fps: u32,
    pub max_fps: u32,
    pub adaptive: bool,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_FPS,
            min_fps: DEFAULT_MIN_FPS,
            max_fps: DEFAULT_MAX_FPS,
            adaptive: true,
        }
    }
}

impl PacerConfig {
    /// Bounds ordered and target clamped into them; all values at least 1
    fn normalized(self) -> Self {
        let min_fps = self.min_fps.max(1);
        let max_fps = self.max_fps.max(min_fps);
        Self {
            target_fps: self.target_fps.clamp(min_fps, max_fps),
            min_fps,
            max_fps,
            adaptive: self.adaptive,
        }
    }
}

/// An adaptive change of the effective frame rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FpsAdjustment {
    pub previous: u32,
    pub current: u32,
}

/// What to do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    /// Time left until the next tick, zero when behind schedule
    pub sleep: Duration,
    /// The tick took longer than the frame interval
    pub late: bool,
    pub adjustment: Option<FpsAdjustment>,
}

/// Computes per-tick sleeps and adapts the effective frame rate
#[derive(Debug, Clone)]
pub struct FramePacer {
    config: PacerConfig,
    effective_fps: u32,
    interval: Duration,
    window: Deque<Duration, ADAPTIVE_WINDOW>,
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(PacerConfig::default())
    }
}

impl FramePacer {
    pub fn new(config: PacerConfig) -> Self {
        let config = config.normalized();
        Self {
            config,
            effective_fps: config.target_fps,
            interval: interval_of(config.target_fps),
            window: Deque::new(),
        }
    }

    /// Apply new settings; the effective rate restarts from the target
    pub fn configure(&mut self, config: PacerConfig) {
        let config = config.normalized();
        if config == self.config {
            return;
        }
        self.config = config;
        self.set_effective(config.target_fps);
    }

    pub const fn config(&self) -> PacerConfig {
        self.config
    }

    pub const fn effective_fps(&self) -> u32 {
        self.effective_fps
    }

    pub const fn target_interval(&self) -> Duration {
        self.interval
    }

    /// Plan the pause after a tick that took `elapsed`
    pub fn plan(&mut self, elapsed: Duration) -> FramePlan {
        let interval = self.interval;
        let late = elapsed > interval;
        let sleep = if late {
            Duration::from_ticks(0)
        } else {
            interval - elapsed
        };

        let adjustment = if self.config.adaptive {
            self.observe(elapsed)
        } else {
            None
        };

        FramePlan {
            sleep,
            late,
            adjustment,
        }
    }

    fn observe(&mut self, elapsed: Duration) -> Option<FpsAdjustment> {
        if self.window.is_full() {
            self.window.pop_front();
        }
        // Space was made above
        let _ = self.window.push_back(elapsed);
        if !self.window.is_full() {
            return None;
        }

        let interval = self.interval;
        let overruns = self.window.iter().filter(|tick| **tick > interval).count();
        let relaxed = self
            .window
            .iter()
            .all(|tick| tick.as_ticks() * 2 < interval.as_ticks());

        let step = (self.effective_fps / 10).max(1);
        let next = if overruns * 5 >= ADAPTIVE_WINDOW * 4 {
            self.effective_fps.saturating_sub(step).max(self.config.min_fps)
        } else if relaxed {
            let ceiling = self.config.target_fps.min(self.config.max_fps);
            (self.effective_fps + step).min(ceiling)
        } else {
            return None;
        };

        if next == self.effective_fps {
            return None;
        }
        let previous = self.effective_fps;
        self.set_effective(next);
        Some(FpsAdjustment {
            previous,
            current: next,
        })
    }

    fn set_effective(&mut self, fps: u32) {
        self.effective_fps = fps;
        self.interval = interval_of(fps);
        self.window.clear();
    }
}

fn interval_of(fps: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(fps.max(1)))
}

/// Sleeps with OS sleep for the bulk of the time and spins for the rest.
///
/// OS sleeps are split into chunks so a stop flag is observed promptly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecisionSleeper {
    spin_threshold: Duration,
    chunk: Duration,
}

impl Default for PrecisionSleeper {
    fn default() -> Self {
        Self::new(DEFAULT_SPIN_THRESHOLD, DEFAULT_SLEEP_CHUNK)
    }
}

impl PrecisionSleeper {
    pub const fn new(spin_threshold: Duration, chunk: Duration) -> Self {
        Self {
            spin_threshold,
            chunk,
        }
    }

    /// Sleep for `duration` unless `stop` is raised.
    ///
    /// Returns `false` when the sleep was cut short by `stop`.
    pub fn sleep(&self, duration: Duration, stop: &AtomicBool) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if stop.load(Ordering::Acquire) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let remaining = deadline - now;
            if remaining > self.spin_threshold {
                let coarse = (remaining - self.spin_threshold).min(self.chunk);
                std::thread::sleep(std::time::Duration::from_micros(coarse.as_micros()));
            } else {
                core::hint::spin_loop();
            }
        }
    }
}
