use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// Source of real time, in seconds from an arbitrary origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock::default()
    }

    pub fn advance(&self, seconds: f64) {
        *self.time.lock() += seconds;
    }

    pub fn set(&self, seconds: f64) {
        *self.time.lock() = seconds;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.time.lock()
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Time since the last frame boundary. Pausing freezes the reading; resuming carries on
/// from the frozen value instead of catching up on the time spent paused.
pub struct PlaybackTimer {
    clock: Box<dyn Clock>,
    origin: f64,
    frozen: Option<f64>,
}

impl PlaybackTimer {
    pub fn new(clock: impl Clock + 'static) -> Self {
        let origin = clock.now();
        PlaybackTimer {
            clock: Box::new(clock),
            origin,
            frozen: None,
        }
    }

    pub fn elapsed(&self) -> f64 {
        match self.frozen {
            Some(elapsed) => elapsed,
            None => self.clock.now() - self.origin,
        }
    }

    /// Zero the reading. A paused timer stays paused, at zero.
    pub fn reset(&mut self) {
        self.origin = self.clock.now();
        if self.frozen.is_some() {
            self.frozen = Some(0.0);
        }
    }

    pub fn pause(&mut self) {
        if self.frozen.is_none() {
            self.frozen = Some(self.elapsed());
        }
    }

    pub fn resume(&mut self) {
        if let Some(elapsed) = self.frozen.take() {
            self.origin = self.clock.now() - elapsed;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.frozen.is_some()
    }
}

impl std::fmt::Debug for PlaybackTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackTimer")
            .field("elapsed", &self.elapsed())
            .field("paused", &self.is_paused())
            .finish()
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_from_reset() {
        let clock = ManualClock::new();
        clock.set(10.0);
        let mut timer = PlaybackTimer::new(clock.clone());
        clock.advance(0.25);
        assert_eq!(timer.elapsed(), 0.25);
        timer.reset();
        assert_eq!(timer.elapsed(), 0.0);
        clock.advance(0.5);
        assert_eq!(timer.elapsed(), 0.5);
    }

    #[test]
    fn pause_freezes_and_resume_does_not_fast_forward() {
        let clock = ManualClock::new();
        let mut timer = PlaybackTimer::new(clock.clone());
        clock.advance(0.5);
        timer.pause();
        clock.advance(100.0);
        assert_eq!(timer.elapsed(), 0.5);

        timer.resume();
        assert_eq!(timer.elapsed(), 0.5);
        clock.advance(0.25);
        assert_eq!(timer.elapsed(), 0.75);
    }

    #[test]
    fn reset_while_paused_stays_paused() {
        let clock = ManualClock::new();
        let mut timer = PlaybackTimer::new(clock.clone());
        clock.advance(1.0);
        timer.pause();
        timer.reset();
        clock.advance(1.0);
        assert!(timer.is_paused());
        assert_eq!(timer.elapsed(), 0.0);
        timer.resume();
        clock.advance(0.5);
        assert_eq!(timer.elapsed(), 0.5);
    }
}
