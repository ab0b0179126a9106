//! Proximity siren for a Raspberry Pi: an HC-SR04 ranging module sets the loudness of a
//! two-tone siren streamed through ALSA, and an LED lights while something is in range.

pub mod config;
pub mod control;
pub mod error;
pub mod gain;
pub mod hardware;
pub mod mapper;
pub mod sensor;
pub mod streamer;
pub mod synth;
pub mod utils;

#[cfg(test)]
mod mock;

pub use config::Config;
pub use control::{ControlLoop, LoopState, RunSummary};
pub use error::{Error, Result};
