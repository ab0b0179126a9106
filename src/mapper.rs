//! Distance → loudness. Closer objects give a louder siren.

use crate::sensor::DistanceSample;

/// Shape applied to the linear proximity fraction `1 - d / threshold`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum GainCurve {
    #[default]
    Linear,
    Squared,
}

impl GainCurve {
    fn apply(self, fraction: f32) -> f32 {
        match self {
            GainCurve::Linear => fraction,
            GainCurve::Squared => fraction * fraction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeMapper {
    threshold_cm: f32,
    curve: GainCurve,
}

impl AmplitudeMapper {
    pub fn new(threshold_cm: f32, curve: GainCurve) -> Self {
        Self {
            threshold_cm,
            curve,
        }
    }

    pub fn map(&self, sample: &DistanceSample, previous_gain: f32) -> f32 {
        if !sample.valid {
            return previous_gain;
        }
        if sample.distance_cm >= self.threshold_cm {
            return 0.0;
        }
        let fraction = (1.0 - sample.distance_cm / self.threshold_cm).clamp(0.0, 1.0);
        self.curve.apply(fraction).clamp(0.0, 1.0)
    }

    /// LED decision for a valid sample. `None` leaves the LED as it is.
    pub fn within_threshold(&self, sample: &DistanceSample) -> Option<bool> {
        sample
            .valid
            .then_some(sample.distance_cm < self.threshold_cm)
    }
}

/// Linear mapping with an explicit threshold.
pub fn map(sample: &DistanceSample, previous_gain: f32, threshold_cm: f32) -> f32 {
    AmplitudeMapper::new(threshold_cm, GainCurve::Linear).map(sample, previous_gain)
}
