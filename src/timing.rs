//! Frame timing for the render loop.
//!
//! [`FrameClock`] measures the time between frames and keeps a one second rolling frame counter,
//! [`FrameLimiter`] computes how long a frame has to sleep to honor a frame rate cap. Both take
//! the current instant as an argument so they can be driven without a real clock.

use std::time::{Duration, Instant};

/// Measures per-frame elapsed time and frames per second.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_frame: Instant,
    window_start: Instant,
    frames_in_window: u32,
    fps: u32,
    elapsed_ms: f64,
}

impl FrameClock {
    /// Creates a clock whose first frame and first FPS window start at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            last_frame: now,
            window_start: now,
            frames_in_window: 0,
            fps: 0,
            elapsed_ms: 0.0,
        }
    }

    /// Records a frame starting at `now` and returns the milliseconds since the previous one.
    ///
    /// Once a full second has passed since the current FPS window began, the frame count of that
    /// window becomes the reported FPS and a new window starts with this frame.
    pub fn tick(&mut self, now: Instant) -> f64 {
        self.elapsed_ms = now.saturating_duration_since(self.last_frame).as_secs_f64() * 1000.0;
        self.last_frame = now;

        if now.saturating_duration_since(self.window_start) >= Duration::from_secs(1) {
            self.fps = self.frames_in_window;
            self.frames_in_window = 0;
            self.window_start = now;
            log::trace!("fps: {}", self.fps);
        }
        self.frames_in_window += 1;

        self.elapsed_ms
    }

    /// Frames rendered during the last complete one second window.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Milliseconds between the two most recent frames.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Instant at which the current frame started.
    pub fn frame_start(&self) -> Instant {
        self.last_frame
    }
}

/// Caps the frame rate by sleeping away what is left of each frame interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameLimiter {
    fps: u32,
}

impl FrameLimiter {
    /// Creates a limiter for `fps` frames per second. `0` disables limiting.
    pub fn new(fps: u32) -> Self {
        Self { fps }
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps;
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// The target duration of one frame, `None` when unlimited.
    pub fn interval(&self) -> Option<Duration> {
        (self.fps > 0).then(|| Duration::from_secs(1) / self.fps)
    }

    /// Time left in the frame that started at `frame_start`, seen from `now`.
    ///
    /// Returns `None` when unlimited or when the frame already took the whole interval.
    pub fn remaining(&self, frame_start: Instant, now: Instant) -> Option<Duration> {
        let spent = now.saturating_duration_since(frame_start);
        self.interval()?
            .checked_sub(spent)
            .filter(|left| !left.is_zero())
    }

    /// Sleeps for whatever is left of the frame that started at `frame_start`.
    pub fn wait(&self, frame_start: Instant) {
        if let Some(left) = self.remaining(frame_start, Instant::now()) {
            std::thread::sleep(left);
        }
    }
}
