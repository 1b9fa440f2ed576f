use std::time::{Duration, Instant};

/// Frame clock: tracks delta time and can sleep the remainder of a frame
/// budget to hold a target frame rate.
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    last_tick: Instant,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
        }
    }

    /// Seconds since the clock was created.
    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Advance the clock and return the delta since the last tick in seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        delta
    }

    /// Like `tick`, but first sleeps off whatever remains of the frame budget
    /// for `target_fps`. Returns the full frame delta including the sleep.
    pub fn tick_to_target(&mut self, target_fps: u32) -> f32 {
        if target_fps > 0 {
            let budget = Duration::from_secs_f64(1.0 / target_fps as f64);
            let used = self.last_tick.elapsed();
            if used < budget {
                std::thread::sleep(budget - used);
            }
        }
        self.tick()
    }

    pub fn reset(&mut self) {
        self.last_tick = Instant::now();
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
