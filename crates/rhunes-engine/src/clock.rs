//! Frame clocks.
//!
//! The engine asks its [`Clock`] for one tick per frame. The tick blocks
//! until the next frame is due and returns the seconds elapsed since the
//! previous one, which the engine hands to components as `dt`. Components
//! never read time themselves.

use std::time::{Duration, Instant};

/// A tick source for the engine loop.
pub trait Clock {
    /// Wait for the next frame and return the elapsed seconds.
    fn tick(&mut self) -> f32;
}

// ---------------------------------------------------------------------------
// FixedRateClock
// ---------------------------------------------------------------------------

/// Caps the loop at a target frame rate by sleeping out the rest of each
/// frame.
#[derive(Debug)]
pub struct FixedRateClock {
    frame: Duration,
    last: Option<Instant>,
}

impl FixedRateClock {
    /// A clock ticking at most `target_fps` times per second. A rate of `0`
    /// never sleeps.
    pub fn new(target_fps: u32) -> Self {
        let frame = if target_fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / f64::from(target_fps))
        };
        Self { frame, last: None }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame
    }
}

impl Clock for FixedRateClock {
    fn tick(&mut self) -> f32 {
        let Some(last) = self.last else {
            self.last = Some(Instant::now());
            return self.frame.as_secs_f32();
        };
        let elapsed = last.elapsed();
        if elapsed < self.frame {
            std::thread::sleep(self.frame - elapsed);
        }
        let now = Instant::now();
        self.last = Some(now);
        now.duration_since(last).as_secs_f32()
    }
}

// ---------------------------------------------------------------------------
// UnboundedClock
// ---------------------------------------------------------------------------

/// Never sleeps. Reports wall-clock time between ticks.
#[derive(Debug, Default)]
pub struct UnboundedClock {
    last: Option<Instant>,
}

impl UnboundedClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for UnboundedClock {
    fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = self.last.map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last = Some(now);
        dt
    }
}

// ---------------------------------------------------------------------------
// SteppedClock
// ---------------------------------------------------------------------------

/// Never sleeps and always reports the same `dt`. Used for deterministic
/// runs in tests and benchmarks.
#[derive(Debug, Clone, Copy)]
pub struct SteppedClock {
    dt: f32,
}

impl SteppedClock {
    pub fn new(dt: f32) -> Self {
        Self { dt }
    }

    /// A clock stepping at `fps` frames per second of simulated time.
    pub fn at_fps(fps: u32) -> Self {
        Self::new(1.0 / fps.max(1) as f32)
    }
}

impl Clock for SteppedClock {
    fn tick(&mut self) -> f32 {
        self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_rate_clock_waits_out_the_frame() {
        let mut clock = FixedRateClock::new(100);
        assert_eq!(clock.frame_duration(), Duration::from_millis(10));
        clock.tick();
        let dt = clock.tick();
        assert!(dt >= 0.009, "dt was {dt}");
    }

    #[test]
    fn zero_rate_never_sleeps() {
        let clock = FixedRateClock::new(0);
        assert_eq!(clock.frame_duration(), Duration::ZERO);
    }

    #[test]
    fn unbounded_clock_starts_at_zero() {
        let mut clock = UnboundedClock::new();
        assert_eq!(clock.tick(), 0.0);
        assert!(clock.tick() >= 0.0);
    }

    #[test]
    fn stepped_clock_is_constant() {
        let mut clock = SteppedClock::at_fps(50);
        assert_eq!(clock.tick(), 0.02);
        assert_eq!(clock.tick(), 0.02);
    }
}
