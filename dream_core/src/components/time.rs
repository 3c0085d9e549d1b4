use std::sync::atomic::{AtomicI64, Ordering};

/// Longest frame delta the simulation will integrate. Frames stalled by
/// a debugger or a window drag resume with one clamped step instead of
/// a catch-up explosion.
pub const DELTA_MAX_MS: i64 = 100;

/// Frame clock shared by every task of a frame. Plain atomics: tasks
/// read it concurrently, only the frame driver writes it.
pub struct Time {
    current_frame_ms: AtomicI64,
    frame_delta_ms: AtomicI64,
}

impl Time {
    pub fn new() -> Self {
        Time {
            current_frame_ms: AtomicI64::new(0),
            frame_delta_ms: AtomicI64::new(0),
        }
    }

    /// Advance the clock by one frame. The stored delta is clamped to
    /// [`DELTA_MAX_MS`]; the absolute clock still advances by the full
    /// amount so wall-time comparisons stay honest.
    pub fn advance(&self, delta_ms: i64) {
        let delta_ms = delta_ms.max(0);
        self.current_frame_ms.fetch_add(delta_ms, Ordering::AcqRel);
        self.frame_delta_ms
            .store(delta_ms.min(DELTA_MAX_MS), Ordering::Release);
    }

    pub fn current_frame_ms(&self) -> i64 {
        self.current_frame_ms.load(Ordering::Acquire)
    }

    /// Clamped delta of the current frame, in milliseconds.
    pub fn frame_delta_ms(&self) -> i64 {
        self.frame_delta_ms.load(Ordering::Acquire)
    }

    pub fn frame_delta_seconds(&self) -> f32 {
        self.frame_delta_ms() as f32 / 1000.0
    }
}

impl Default for Time {
    fn default() -> Self {
        Time::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates_and_stores_delta() {
        let time = Time::new();
        time.advance(16);
        time.advance(17);
        assert_eq!(time.current_frame_ms(), 33);
        assert_eq!(time.frame_delta_ms(), 17);
    }

    #[test]
    fn delta_is_clamped_but_clock_is_not() {
        let time = Time::new();
        time.advance(5000);
        assert_eq!(time.frame_delta_ms(), DELTA_MAX_MS);
        assert_eq!(time.current_frame_ms(), 5000);
    }

    #[test]
    fn negative_delta_is_ignored() {
        let time = Time::new();
        time.advance(-16);
        assert_eq!(time.current_frame_ms(), 0);
        assert_eq!(time.frame_delta_ms(), 0);
    }
}
