//! Time source for trigger timing.
//!
//! All elapsed-time computations (hold delays, press delays, repeat gates)
//! read an injected clock. Two timelines exist: the game timer, which a host
//! may freeze while paused, and the UI timer, which keeps running. The
//! manager picks one per query based on `InputHost::is_paused`.

use parking_lot::Mutex;
use std::time::Instant;

pub trait Clock: Send + Sync {
    /// Seconds on the gameplay timeline.
    fn game_time(&self) -> f32;

    /// Seconds on the UI timeline; defaults to the gameplay timeline for
    /// hosts that don't pause.
    fn ui_time(&self) -> f32 {
        self.game_time()
    }
}

/// Wall-clock seconds since construction, same value on both timelines.
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new()
    }
}

impl Clock for SystemClock {
    fn game_time(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

/// Clock advanced explicitly by the host (fixed-timestep loops) or by tests.
pub struct ManualClock {
    times: Mutex<(f32, f32)>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            times: Mutex::new((0.0, 0.0)),
        }
    }

    /// Advance both timelines.
    pub fn advance(&self, dt: f32) {
        let mut t = self.times.lock();
        t.0 += dt;
        t.1 += dt;
    }

    /// Advance only the UI timeline (gameplay paused).
    pub fn advance_ui(&self, dt: f32) {
        self.times.lock().1 += dt;
    }

    pub fn set(&self, game: f32, ui: f32) {
        *self.times.lock() = (game, ui);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new()
    }
}

impl Clock for ManualClock {
    fn game_time(&self) -> f32 {
        self.times.lock().0
    }

    fn ui_time(&self) -> f32 {
        self.times.lock().1
    }
}
