use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::frame::FrameReport;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoopMetricsSnapshot {
    /// Frames actually drawn per second.
    pub fps: f32,
    pub frame_time_ms: f32,
    pub skipped_draws: u32,
    pub discarded_deltas: u32,
    pub visible_count: usize,
    pub particle_count: usize,
}

#[derive(Clone, Debug)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl Default for MetricsHandle {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(LoopMetricsSnapshot::default())),
        }
    }
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                let mut guard = poisoned.into_inner();
                *guard = snapshot;
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    drawn: u32,
    skipped: u32,
    discarded: u32,
    frame_time_sum: Duration,
    frames: u32,
    visible_count: usize,
    particle_count: usize,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval_start: Instant::now(),
            interval,
            drawn: 0,
            skipped: 0,
            discarded: 0,
            frame_time_sum: Duration::ZERO,
            frames: 0,
            visible_count: 0,
            particle_count: 0,
        }
    }

    /// `frame_dt` is the wall time the whole frame took, present included.
    pub(crate) fn record_frame(&mut self, report: &FrameReport, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
        if report.drew {
            self.drawn = self.drawn.saturating_add(1);
        } else {
            self.skipped = self.skipped.saturating_add(1);
        }
        if report.delta.discarded {
            self.discarded = self.discarded.saturating_add(1);
        }
        self.visible_count = report.visible_count;
        self.particle_count = report.particle_count;
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            (self.frame_time_sum.as_secs_f32() / self.frames as f32) * 1000.0
        };

        let snapshot = LoopMetricsSnapshot {
            fps: self.drawn as f32 / elapsed_seconds,
            frame_time_ms,
            skipped_draws: self.skipped,
            discarded_deltas: self.discarded,
            visible_count: self.visible_count,
            particle_count: self.particle_count,
        };

        self.interval_start = now;
        self.drawn = 0;
        self.skipped = 0;
        self.discarded = 0;
        self.frames = 0;
        self.frame_time_sum = Duration::ZERO;

        Some(snapshot)
    }
}
