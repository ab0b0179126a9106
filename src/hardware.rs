//! Hardware seams
//!
//! The control core only talks to the board through these traits. The real implementations
//! live in `utils` (rppal GPIO, ALSA playback); tests substitute scripted fakes.

use crate::error::{AudioDeviceError, SensorError};
use crate::streamer::AudioBuffer;
use std::time::Duration;

pub use rppal::gpio::Level;

/// A digital output line with no state beyond its electrical level.
pub trait DigitalOutput {
    fn set_level(&mut self, level: Level);
}

/// Trigger/echo timing for an HC-SR04 style ranging module.
pub trait PulseTimer {
    /// Drive the trigger line high for `width`.
    fn pulse(&mut self, width: Duration);

    /// Time how long the echo line stays high. Both the rising and the falling edge must
    /// arrive within `timeout` of the call.
    fn wait_for_echo(&mut self, timeout: Duration) -> Result<Duration, SensorError>;
}

/// An audio sink that can be (re)opened at a sample rate and channel count.
pub trait AudioOutput: Send + 'static {
    type Stream: AudioStream;

    fn open(&mut self, sample_rate: u32, channels: u16) -> Result<Self::Stream, AudioDeviceError>;
}

/// An open playback handle. Closing consumes it, so a handle is closed at most once.
pub trait AudioStream {
    /// Blocks while the device queue is full.
    fn write(&mut self, buffer: &AudioBuffer) -> Result<(), AudioDeviceError>;

    /// Stop playback, dropping whatever the device still has queued, and release it.
    fn close(self) -> Result<(), AudioDeviceError>;
}
