use std::time::{Duration, Instant};

use crate::foundation::core::Fps;

/// Source of elapsed time for the frame loop.
///
/// `start` is called once, at the instant audio begins; `now` is seconds since then.
pub trait FrameClock {
    fn start(&mut self);
    fn now(&mut self) -> f64;
    /// Suspend until the next frame is due.
    fn wait_next_frame(&mut self);
}

/// Wall-clock pacing: frames follow real time and are scheduled on `fps` ticks.
#[derive(Debug)]
pub struct RealtimeClock {
    fps: Fps,
    origin: Option<Instant>,
}

impl RealtimeClock {
    pub fn new(fps: Fps) -> Self {
        Self { fps, origin: None }
    }
}

impl FrameClock for RealtimeClock {
    fn start(&mut self) {
        self.origin = Some(Instant::now());
    }

    fn now(&mut self) -> f64 {
        match self.origin {
            Some(origin) => origin.elapsed().as_secs_f64(),
            None => 0.0,
        }
    }

    fn wait_next_frame(&mut self) {
        let now = self.now();
        let next_tick = (self.fps.secs_to_frames_floor(now) + 1) as f64 * self.fps.frame_duration_secs();
        let wait = next_tick - now;
        if wait > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(wait));
        }
    }
}

/// Deterministic clock advancing exactly one frame per `wait_next_frame`.
#[derive(Clone, Copy, Debug)]
pub struct VirtualClock {
    fps: Fps,
    frame: u64,
}

impl VirtualClock {
    pub fn new(fps: Fps) -> Self {
        Self { fps, frame: 0 }
    }

    pub fn frames_elapsed(&self) -> u64 {
        self.frame
    }
}

impl FrameClock for VirtualClock {
    fn start(&mut self) {
        self.frame = 0;
    }

    fn now(&mut self) -> f64 {
        self.fps.frames_to_secs(self.frame)
    }

    fn wait_next_frame(&mut self) {
        self.frame += 1;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/clock.rs"]
mod tests;
