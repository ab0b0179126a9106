use crate::config::SensorConfig;
use crate::error::SensorError;
use crate::hardware::PulseTimer;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSample {
    pub distance_cm: f32,
    pub valid: bool,
    pub timestamp: Instant,
}

impl DistanceSample {
    pub fn invalid(distance_cm: f32) -> Self {
        Self {
            distance_cm,
            valid: false,
            timestamp: Instant::now(),
        }
    }
}

/// Ranges with an HC-SR04 style module behind any [`PulseTimer`].
pub struct DistanceSensor<P> {
    timer: P,
    config: SensorConfig,
}

impl<P: PulseTimer> DistanceSensor<P> {
    pub fn new(timer: P, config: SensorConfig) -> Self {
        Self { timer, config }
    }

    /// One trigger/echo cycle. Blocks for at most the configured echo timeout.
    pub fn try_measure(&mut self) -> Result<DistanceSample, SensorError> {
        self.timer.pulse(self.config.trigger_pulse);
        let echo = self.timer.wait_for_echo(self.config.echo_timeout)?;
        let timestamp = Instant::now();

        // Round trip, so halve it
        let distance_cm = echo.as_secs_f32() * self.config.speed_of_sound_cm_per_s / 2.0;

        if distance_cm < self.config.min_valid_distance_cm
            || distance_cm > self.config.max_valid_distance_cm
        {
            return Err(SensorError::OutOfRange { distance_cm });
        }

        Ok(DistanceSample {
            distance_cm,
            valid: true,
            timestamp,
        })
    }

    /// Like [`try_measure`](Self::try_measure), but folds recoverable faults into an invalid
    /// sample so the caller keeps its previous gain.
    pub fn measure(&mut self) -> DistanceSample {
        match self.try_measure() {
            Ok(sample) => sample,
            Err(err) => {
                debug!(%err, "discarding distance sample");
                match err {
                    SensorError::OutOfRange { distance_cm } => DistanceSample::invalid(distance_cm),
                    SensorError::Timeout(_) => DistanceSample::invalid(f32::NAN),
                }
            }
        }
    }
}
