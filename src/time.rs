//! Frame clock for the render loop.
//!
//! One process-wide, monotonically increasing elapsed time drives the shader
//! animation; it is read by the per-frame uniform push and never by the
//! generator. Pausing freezes the galaxy without resetting it.

use std::time::{Duration, Instant};

/// Elapsed/delta tracking with pause support and a periodic FPS estimate.
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    paused: bool,
    pause_elapsed: Duration,
}

impl Clock {
    const FPS_INTERVAL: Duration = Duration::from_millis(500);

    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            paused: false,
            pause_elapsed: Duration::ZERO,
        }
    }

    /// Advance the clock. Call once per presented frame.
    ///
    /// Returns `(elapsed, delta)` in seconds. While paused, delta is zero
    /// and elapsed stops increasing.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();

        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, 0.0);
        }

        self.delta_secs = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.elapsed_secs = (now.duration_since(self.start) - self.pause_elapsed).as_secs_f32();
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= Self::FPS_INTERVAL {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        (self.elapsed_secs, self.delta_secs)
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            let now = Instant::now();
            self.pause_elapsed += now.duration_since(self.last_frame);
            self.last_frame = now;
            self.paused = false;
        } else {
            self.paused = true;
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_starts_at_zero() {
        let clock = Clock::new();
        assert_eq!(clock.elapsed(), 0.0);
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_update_advances() {
        let mut clock = Clock::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = clock.update();
        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
    }

    #[test]
    fn test_pause_freezes_elapsed() {
        let mut clock = Clock::new();
        clock.update();
        clock.toggle_pause();

        let frozen = clock.elapsed();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = clock.update();

        assert_eq!(elapsed, frozen);
        assert_eq!(delta, 0.0);
    }

    #[test]
    fn test_resume_excludes_paused_span() {
        let mut clock = Clock::new();
        clock.update();
        clock.toggle_pause();
        thread::sleep(Duration::from_millis(20));
        clock.toggle_pause();
        let (elapsed, _) = clock.update();

        // The 20ms pause must not count toward elapsed time.
        assert!(elapsed < 0.015, "elapsed = {}", elapsed);
    }
}
