use std::time::Instant;

const STEP: f64 = 1.0 / 60.0;
// frames longer than this are treated as a stall, not simulated
const MAX_FRAME_TIME: f64 = 0.25;

/// Fixed-rate simulation clock.
pub struct FixedTimeStep {
    step: f64,
    accumulator: f64,
    last: Instant,
    elapsed: f64,
}

impl FixedTimeStep {
    pub fn new() -> Self {
        Self {
            step: STEP,
            accumulator: 0.0,
            last: Instant::now(),
            elapsed: 0.0,
        }
    }

    /// Runs `update` once per whole step since the previous tick.
    pub fn tick(&mut self, update: impl FnMut(f64)) -> u32 {
        let now = Instant::now();
        let frame_time = (now - self.last).as_secs_f64();
        self.last = now;
        self.advance(frame_time, update)
    }

    pub fn advance(&mut self, frame_time: f64, mut update: impl FnMut(f64)) -> u32 {
        self.accumulator += frame_time.clamp(0.0, MAX_FRAME_TIME);
        let mut steps = 0;
        while self.accumulator >= self.step {
            update(self.step);
            self.elapsed += self.step;
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
