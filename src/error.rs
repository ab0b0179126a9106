//! Error types for the sensing, audio and configuration layers.

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable sensor faults. The poll loop absorbs these by keeping the last gain.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SensorError {
    #[error("no echo edge within {0:?}")]
    Timeout(Duration),

    #[error("distance {distance_cm:.1} cm outside the rated range")]
    OutOfRange { distance_cm: f32 },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AudioDeviceError {
    #[error("failed to open audio device: {0}")]
    Open(String),

    #[error("audio device underrun")]
    Underrun,

    #[error("failed to write to audio device: {0}")]
    Write(String),

    #[error("failed to close audio device: {0}")]
    Close(String),

    #[error("{0} thread panicked")]
    Worker(&'static str),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("distance threshold must be a positive number of centimetres, got {0}")]
    Threshold(f32),

    #[error("invalid valid-distance range [{min}, {max}] cm")]
    DistanceRange { min: f32, max: f32 },

    #[error("speed of sound must be positive, got {0} cm/s")]
    SpeedOfSound(f32),

    #[error("{0} must be non-zero")]
    ZeroDuration(&'static str),

    #[error("unsupported sample rate {0} Hz")]
    SampleRate(u32),

    #[error("unsupported channel count {0}")]
    Channels(u16),

    #[error("buffer frame count must be non-zero, got {0}")]
    BufferFrameCount(usize),

    #[error("at least two audio buffers are required, got {0}")]
    BufferCount(usize),

    #[error("tone {tone} Hz must lie in (0, {nyquist}) Hz")]
    ToneFrequency { tone: f32, nyquist: f32 },

    #[error("max amplitude must lie in (0, 1], got {0}")]
    MaxAmplitude(f32),

    #[error("gain smoothing must lie in (0, 1], got {0}")]
    GainSmoothing(f32),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Audio(#[from] AudioDeviceError),

    #[error("GPIO error: {0}")]
    Gpio(#[from] rppal::gpio::Error),

    #[error("control loop is not idle")]
    NotIdle,

    #[error("control loop was never started")]
    NotStarted,

    #[error("poll thread panicked")]
    PollThreadPanicked,
}
