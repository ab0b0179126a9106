/// Utilities Module
///
/// Board-side implementations of the hardware seams: rppal GPIO for the ranging module and
/// the LED, ALSA for audio playback.
pub mod hc_sr04;
pub mod led;
pub mod pcm_setup;
