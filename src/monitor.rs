//! Rolling render statistics.

use embassy_time::{Duration, Instant};
use heapless::HistoryBuffer;
use serde::Serialize;

/// Samples kept for the rolling statistics (two seconds at 60 FPS)
pub const MONITOR_WINDOW: usize = 120;

/// Timing of one render loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceSample {
    pub timestamp: Instant,
    /// Time spent in the frame generator
    pub generation: Duration,
    /// Time spent committing the frame to the driver
    pub swap: Duration,
    /// Time since the previous iteration started, or the planned period for
    /// the first one
    pub total: Duration,
    /// Rendering overran the frame interval
    pub late: bool,
}

impl PerformanceSample {
    /// Instantaneous frame rate implied by `total`
    pub fn fps(&self) -> f64 {
        let micros = self.total.as_micros();
        if micros == 0 {
            0.0
        } else {
            1_000_000.0 / micros as f64
        }
    }
}

/// Current, average, minimum and maximum of one measurement, in the unit of
/// the field it describes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub current: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    fn over(values: impl Iterator<Item = f64>, current: f64) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
        if count == 0 {
            return Self::default();
        }
        Self {
            current,
            avg: sum / count as f64,
            min,
            max,
        }
    }
}

/// Aggregated statistics; durations in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub fps: Summary,
    pub generation_ms: Summary,
    pub swap_ms: Summary,
    pub tick_ms: Summary,
    /// Fraction of late frames within the window
    pub late_rate: f64,
    pub samples: usize,
    pub total_frames: u64,
    pub total_late_frames: u64,
    pub uptime_secs: f64,
}

/// Collects [`PerformanceSample`]s in a fixed-size ring.
///
/// Observes the render loop; nothing here feeds back into rendering.
#[derive(Debug)]
pub struct PerformanceMonitor {
    samples: HistoryBuffer<PerformanceSample, MONITOR_WINDOW>,
    started: Instant,
    total_frames: u64,
    total_late_frames: u64,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            samples: HistoryBuffer::new(),
            started: Instant::now(),
            total_frames: 0,
            total_late_frames: 0,
        }
    }

    /// Add a sample, evicting the oldest when the ring is full
    pub fn record(&mut self, sample: PerformanceSample) {
        self.total_frames += 1;
        if sample.late {
            self.total_late_frames += 1;
        }
        self.samples.write(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.len() == 0
    }

    pub fn latest(&self) -> Option<&PerformanceSample> {
        self.samples.recent()
    }

    pub fn stats(&self) -> PerformanceStats {
        let samples = self.samples.as_slice();
        let late = samples.iter().filter(|sample| sample.late).count();
        let latest = self.samples.recent();

        let current = |field: fn(&PerformanceSample) -> f64| latest.map_or(0.0, field);

        PerformanceStats {
            fps: Summary::over(
                samples.iter().map(PerformanceSample::fps),
                current(PerformanceSample::fps),
            ),
            generation_ms: Summary::over(
                samples.iter().map(|sample| millis(sample.generation)),
                current(|sample| millis(sample.generation)),
            ),
            swap_ms: Summary::over(
                samples.iter().map(|sample| millis(sample.swap)),
                current(|sample| millis(sample.swap)),
            ),
            tick_ms: Summary::over(
                samples.iter().map(|sample| millis(sample.total)),
                current(|sample| millis(sample.total)),
            ),
            late_rate: if samples.is_empty() {
                0.0
            } else {
                late as f64 / samples.len() as f64
            },
            samples: samples.len(),
            total_frames: self.total_frames,
            total_late_frames: self.total_late_frames,
            uptime_secs: (Instant::now() - self.started).as_micros() as f64 / 1_000_000.0,
        }
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}
