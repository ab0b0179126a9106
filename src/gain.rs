use crossbeam::atomic::AtomicCell;
use std::sync::Arc;

/// Latest target gain, written by the poll loop and read by the synthesizer.
#[derive(Debug, Clone, Default)]
pub struct GainState(Arc<AtomicCell<f32>>);

impl GainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> f32 {
        self.0.load()
    }

    pub fn store(&self, gain: f32) {
        self.0.store(gain.clamp(0.0, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_silent() {
        assert_eq!(GainState::new().load(), 0.0);
    }

    #[test]
    fn test_clones_share_value() {
        let writer = GainState::new();
        let reader = writer.clone();
        writer.store(0.8);
        assert_eq!(reader.load(), 0.8);
    }

    #[test]
    fn test_store_clamps() {
        let gain = GainState::new();
        gain.store(1.5);
        assert_eq!(gain.load(), 1.0);
        gain.store(-0.2);
        assert_eq!(gain.load(), 0.0);
    }
}
