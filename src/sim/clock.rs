//! Frame-rate normalisation
//!
//! Tuning values are balanced for 60 Hz. The multiplier scales every
//! per-frame delta so the game runs at the same speed on any display.

use crate::consts::{MAX_FRAME_MULTIPLIER, MIN_FRAME_MULTIPLIER, REFERENCE_FRAME_MS};

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a display frame at `now_ms` and return its multiplier.
    /// The first frame (and any frame with a non-advancing clock) counts as 1.0.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        let multiplier = match self.last_ms {
            Some(last) if now_ms > last => {
                ((now_ms - last) / REFERENCE_FRAME_MS) as f32
            }
            _ => 1.0,
        };
        self.last_ms = Some(now_ms);
        multiplier.clamp(MIN_FRAME_MULTIPLIER, MAX_FRAME_MULTIPLIER)
    }

    /// Forget the previous frame (e.g. after the tab was hidden)
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_is_unit() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(12345.0), 1.0);
    }

    #[test]
    fn test_normalised_to_60hz() {
        let mut clock = FrameClock::new();
        clock.advance(0.0);
        let m = clock.advance(REFERENCE_FRAME_MS * 2.0);
        assert!((m - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_clamped_after_stall() {
        let mut clock = FrameClock::new();
        clock.advance(0.0);
        assert_eq!(clock.advance(10_000.0), MAX_FRAME_MULTIPLIER);
        assert_eq!(clock.advance(10_001.0), MIN_FRAME_MULTIPLIER);
        clock.reset();
        assert_eq!(clock.advance(20_000.0), 1.0);
    }
}
