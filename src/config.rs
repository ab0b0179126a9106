use crate::error::ConfigError;
use crate::mapper::GainCurve;
use alsa::pcm::{Access, Format};
use std::time::Duration;

// Wiring (BCM numbering)
pub const TRIGGER_PIN: u8 = 23;
pub const ECHO_PIN: u8 = 24;
pub const LED_PIN: u8 = 17;
pub const PCM_DEVICE_NAME: &str = "default";

// Sensing
pub const DISTANCE_THRESHOLD_CM: f32 = 50.0;
pub const MIN_VALID_DISTANCE_CM: f32 = 2.0;
pub const MAX_VALID_DISTANCE_CM: f32 = 400.0;
pub const SPEED_OF_SOUND_CM_PER_S: f32 = 34_300.0;
pub const TRIGGER_PULSE: Duration = Duration::from_micros(10);
pub const ECHO_TIMEOUT: Duration = Duration::from_millis(30);
pub const POLL_INTERVAL: Duration = Duration::from_millis(60);

// Siren
pub const TONE_LOW_HZ: f32 = 800.0;
pub const TONE_HIGH_HZ: f32 = 1100.0;
pub const TONE_SWITCH_PERIOD: Duration = Duration::from_millis(200);
pub const MAX_AMPLITUDE: f32 = 0.4; // Headroom so the speaker doesn't distort
pub const GAIN_SMOOTHING: f32 = 0.5;

// Should be hardcoded
pub const SAMPLE_RATE_HZ: u32 = 44_100;
pub const CHANNELS: u16 = 1;
pub const BUFFER_FRAME_COUNT: usize = 512;
pub const BUFFER_COUNT: usize = 3;
pub const FORMAT: Format = Format::S16LE;
pub const PCM_DEVICE_ACCESS: Access = Access::RWInterleaved;

const MIN_SAMPLE_RATE_HZ: u32 = 8_000;
const MAX_SAMPLE_RATE_HZ: u32 = 192_000;

#[derive(Debug, Clone, PartialEq)]
pub struct SensorConfig {
    pub min_valid_distance_cm: f32,
    pub max_valid_distance_cm: f32,
    pub speed_of_sound_cm_per_s: f32,
    pub trigger_pulse: Duration,
    pub echo_timeout: Duration,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            min_valid_distance_cm: MIN_VALID_DISTANCE_CM,
            max_valid_distance_cm: MAX_VALID_DISTANCE_CM,
            speed_of_sound_cm_per_s: SPEED_OF_SOUND_CM_PER_S,
            trigger_pulse: TRIGGER_PULSE,
            echo_timeout: ECHO_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SirenConfig {
    pub tone_low_hz: f32,
    pub tone_high_hz: f32,
    pub tone_switch_period: Duration,
    pub max_amplitude: f32,
    /// Fraction of the remaining distance to the target gain covered per buffer.
    pub gain_smoothing: f32,
}

impl Default for SirenConfig {
    fn default() -> Self {
        Self {
            tone_low_hz: TONE_LOW_HZ,
            tone_high_hz: TONE_HIGH_HZ,
            tone_switch_period: TONE_SWITCH_PERIOD,
            max_amplitude: MAX_AMPLITUDE,
            gain_smoothing: GAIN_SMOOTHING,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_frame_count: usize,
    /// Buffers in circulation between synthesis and playback.
    pub buffer_count: usize,
}

impl StreamConfig {
    pub fn buffer_period(&self) -> Duration {
        Duration::from_secs_f64(self.buffer_frame_count as f64 / self.sample_rate as f64)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE_HZ,
            channels: CHANNELS,
            buffer_frame_count: BUFFER_FRAME_COUNT,
            buffer_count: BUFFER_COUNT,
        }
    }
}

/// Everything a run needs, fixed for its whole lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub distance_threshold_cm: f32,
    pub gain_curve: GainCurve,
    pub poll_interval: Duration,
    pub sensor: SensorConfig,
    pub siren: SirenConfig,
    pub stream: StreamConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            distance_threshold_cm: DISTANCE_THRESHOLD_CM,
            gain_curve: GainCurve::default(),
            poll_interval: POLL_INTERVAL,
            sensor: SensorConfig::default(),
            siren: SirenConfig::default(),
            stream: StreamConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.distance_threshold_cm.is_finite() && self.distance_threshold_cm > 0.0) {
            return Err(ConfigError::Threshold(self.distance_threshold_cm));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("poll interval"));
        }

        let sensor = &self.sensor;
        if !(sensor.min_valid_distance_cm >= 0.0
            && sensor.min_valid_distance_cm < sensor.max_valid_distance_cm
            && sensor.max_valid_distance_cm.is_finite())
        {
            return Err(ConfigError::DistanceRange {
                min: sensor.min_valid_distance_cm,
                max: sensor.max_valid_distance_cm,
            });
        }
        if !(sensor.speed_of_sound_cm_per_s.is_finite() && sensor.speed_of_sound_cm_per_s > 0.0) {
            return Err(ConfigError::SpeedOfSound(sensor.speed_of_sound_cm_per_s));
        }
        if sensor.trigger_pulse.is_zero() {
            return Err(ConfigError::ZeroDuration("trigger pulse"));
        }
        if sensor.echo_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("echo timeout"));
        }

        let stream = &self.stream;
        if !(MIN_SAMPLE_RATE_HZ..=MAX_SAMPLE_RATE_HZ).contains(&stream.sample_rate) {
            return Err(ConfigError::SampleRate(stream.sample_rate));
        }
        if !(1..=2).contains(&stream.channels) {
            return Err(ConfigError::Channels(stream.channels));
        }
        if stream.buffer_frame_count == 0 {
            return Err(ConfigError::BufferFrameCount(stream.buffer_frame_count));
        }
        if stream.buffer_count < 2 {
            return Err(ConfigError::BufferCount(stream.buffer_count));
        }

        let siren = &self.siren;
        let nyquist = stream.sample_rate as f32 / 2.0;
        for tone in [siren.tone_low_hz, siren.tone_high_hz] {
            if !(tone > 0.0 && tone < nyquist) {
                return Err(ConfigError::ToneFrequency { tone, nyquist });
            }
        }
        if siren.tone_switch_period.is_zero() {
            return Err(ConfigError::ZeroDuration("tone switch period"));
        }
        if !(siren.max_amplitude > 0.0 && siren.max_amplitude <= 1.0) {
            return Err(ConfigError::MaxAmplitude(siren.max_amplitude));
        }
        if !(siren.gain_smoothing > 0.0 && siren.gain_smoothing <= 1.0) {
            return Err(ConfigError::GainSmoothing(siren.gain_smoothing));
        }

        Ok(())
    }
}
