// Frame pacing.
//
// The limiter skips the whole tick (not just the paint) when frames arrive
// faster than the cap. The clock measures dt between processed frames only.
// RenderScale trades scene resolution for frame time.

use std::time::{Duration, Instant};

pub struct FrameLimiter {
    min_interval: Option<Duration>,
    last: Option<Instant>,
}

impl FrameLimiter {
    /// `fps_cap == 0` disables the cap.
    pub fn new(fps_cap: u32) -> Self {
        let min_interval = (fps_cap > 0).then(|| Duration::from_secs_f64(1.0 / fps_cap as f64));
        Self { min_interval, last: None }
    }

    /// True if a frame arriving at `now` should be processed.
    pub fn should_run(&mut self, now: Instant) -> bool {
        let Some(min) = self.min_interval else {
            return true;
        };
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < min {
                return false;
            }
        }
        self.last = Some(now);
        true
    }
}

pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Seconds since the previous call; 0 on the first.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let dt = self
            .last
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Rolling one-second frame statistics for the overlay.
pub struct FrameStats {
    /// Duration of the most recently recorded frame.
    pub last_frame_ms: f32,
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub frame_time_min_ms: f32,
    pub frame_time_max_ms: f32,
    window_start: Option<Instant>,
    frames: u32,
    sum_ms: f32,
    min_ms: f32,
    max_ms: f32,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            last_frame_ms: 0.0,
            fps: 0,
            frame_time_avg_ms: 0.0,
            frame_time_min_ms: 0.0,
            frame_time_max_ms: 0.0,
            window_start: None,
            frames: 0,
            sum_ms: 0.0,
            min_ms: f32::MAX,
            max_ms: 0.0,
        }
    }

    /// Record one processed frame. Returns true when a new one-second
    /// window was just published.
    pub fn record(&mut self, now: Instant, dt: f32) -> bool {
        let start = *self.window_start.get_or_insert(now);
        let ms = dt * 1000.0;
        self.last_frame_ms = ms;
        self.frames += 1;
        self.sum_ms += ms;
        self.min_ms = self.min_ms.min(ms);
        self.max_ms = self.max_ms.max(ms);

        if now.saturating_duration_since(start) < Duration::from_secs(1) {
            return false;
        }
        self.fps = self.frames;
        self.frame_time_avg_ms = self.sum_ms / self.frames as f32;
        self.frame_time_min_ms = self.min_ms;
        self.frame_time_max_ms = self.max_ms;
        self.window_start = Some(now);
        self.frames = 0;
        self.sum_ms = 0.0;
        self.min_ms = f32::MAX;
        self.max_ms = 0.0;
        true
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

pub const MIN_PIXEL_RATIO: f32 = 1.0;
pub const MAX_PIXEL_RATIO: f32 = 1.5;
const PIXEL_RATIO_STEP: f32 = 0.05;
/// Frames slower than this lower the ratio.
const SLOW_FRAME_MS: f32 = 20.0;
/// Frames faster than this raise it.
const FAST_FRAME_MS: f32 = 13.0;

/// Scene pixels per logical window pixel, nudged one step per frame toward
/// whatever keeps the frame time near 60 fps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderScale {
    pixel_ratio: f32,
}

impl RenderScale {
    /// Starts at the display's own ratio, within [MIN_PIXEL_RATIO, MAX_PIXEL_RATIO].
    pub fn new(display_ratio: f32) -> Self {
        Self { pixel_ratio: display_ratio.clamp(MIN_PIXEL_RATIO, MAX_PIXEL_RATIO) }
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Feed one frame time. Returns true if the ratio changed.
    pub fn update(&mut self, frame_ms: f32) -> bool {
        // dt is 0 on the very first frame
        if frame_ms <= 0.0 {
            return false;
        }
        let next = if frame_ms > SLOW_FRAME_MS {
            (self.pixel_ratio - PIXEL_RATIO_STEP).max(MIN_PIXEL_RATIO)
        } else if frame_ms < FAST_FRAME_MS {
            (self.pixel_ratio + PIXEL_RATIO_STEP).min(MAX_PIXEL_RATIO)
        } else {
            self.pixel_ratio
        };
        let changed = next != self.pixel_ratio;
        self.pixel_ratio = next;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_skips_early_frames() {
        let t0 = Instant::now();
        let mut limiter = FrameLimiter::new(60);
        assert!(limiter.should_run(t0));
        assert!(!limiter.should_run(t0 + Duration::from_millis(5)));
        assert!(limiter.should_run(t0 + Duration::from_millis(17)));
        // The skipped frame did not move the reference point.
        assert!(!limiter.should_run(t0 + Duration::from_millis(30)));
        assert!(limiter.should_run(t0 + Duration::from_millis(34)));
    }

    #[test]
    fn zero_cap_never_skips() {
        let t0 = Instant::now();
        let mut limiter = FrameLimiter::new(0);
        assert!(limiter.should_run(t0));
        assert!(limiter.should_run(t0));
    }

    #[test]
    fn clock_measures_between_calls() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(t0), 0.0);
        let dt = clock.tick(t0 + Duration::from_millis(20));
        assert!((dt - 0.02).abs() < 1e-4);
    }

    #[test]
    fn stats_publish_once_per_second() {
        let t0 = Instant::now();
        let mut stats = FrameStats::new();
        for i in 0..60 {
            assert!(!stats.record(t0 + Duration::from_millis(i * 16), 0.016));
        }
        assert!(stats.record(t0 + Duration::from_millis(1001), 0.016));
        assert_eq!(stats.fps, 61);
        assert!((stats.frame_time_avg_ms - 16.0).abs() < 1e-3);
    }

    #[test]
    fn render_scale_steps_toward_frame_budget() {
        let mut scale = RenderScale::new(1.25);
        assert!(scale.update(25.0));
        assert!((scale.pixel_ratio() - 1.2).abs() < 1e-5);
        assert!(scale.update(10.0));
        assert!((scale.pixel_ratio() - 1.25).abs() < 1e-5);
        // 13..=20 ms is left alone.
        assert!(!scale.update(16.7));
        assert!(!scale.update(13.0));
        assert!(!scale.update(20.0));
        assert!((scale.pixel_ratio() - 1.25).abs() < 1e-5);
    }

    #[test]
    fn render_scale_is_clamped() {
        let mut scale = RenderScale::new(3.0);
        assert_eq!(scale.pixel_ratio(), MAX_PIXEL_RATIO);
        assert!(!scale.update(5.0));
        for _ in 0..100 {
            scale.update(40.0);
        }
        assert_eq!(scale.pixel_ratio(), MIN_PIXEL_RATIO);
        assert!(!scale.update(40.0));
        assert_eq!(RenderScale::new(0.5).pixel_ratio(), MIN_PIXEL_RATIO);
    }

    #[test]
    fn render_scale_ignores_the_first_frame() {
        let mut scale = RenderScale::new(1.0);
        assert!(!scale.update(0.0));
        assert_eq!(scale.pixel_ratio(), 1.0);
    }

    #[test]
    fn stats_remember_the_last_frame() {
        let mut stats = FrameStats::new();
        stats.record(Instant::now(), 0.025);
        assert!((stats.last_frame_ms - 25.0).abs() < 1e-3);
    }
}
