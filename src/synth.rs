use crate::config::SirenConfig;
use crate::gain::GainState;
use crate::streamer::AudioBuffer;
use std::f64::consts::TAU;

/// Two-tone siren oscillator.
///
/// The phase accumulator and tone clock carry over between buffers so that consecutive
/// buffers join without a click. The output level chases the shared target gain with a
/// one-pole filter evaluated once per buffer and ramped across the buffer's frames.
#[derive(Debug, Clone)]
pub struct SirenSynthesizer {
    phase: f64,
    sample_rate: u32,
    tones: (f64, f64),
    frames_per_tone: u64,
    elapsed_frames: u64,
    level: f32,
    smoothing: f32,
    peak: f32,
}

impl SirenSynthesizer {
    pub fn new(config: &SirenConfig, sample_rate: u32) -> Self {
        let frames_per_tone =
            (config.tone_switch_period.as_secs_f64() * sample_rate as f64).round() as u64;
        Self {
            phase: 0.0,
            sample_rate,
            tones: (config.tone_low_hz as f64, config.tone_high_hz as f64),
            frames_per_tone: frames_per_tone.max(1),
            elapsed_frames: 0,
            level: 0.0,
            smoothing: config.gain_smoothing,
            peak: config.max_amplitude * i16::MAX as f32,
        }
    }

    /// Fill `buffer` using the gain currently held in `gain`.
    pub fn fill(&mut self, buffer: &mut AudioBuffer, gain: &GainState) {
        let channels = buffer.channels() as usize;
        self.render(buffer.samples_mut(), channels, gain.load());
    }

    fn render(&mut self, samples: &mut [i16], channels: usize, target: f32) {
        let start = self.level;
        let end = start + self.smoothing * (target - start);
        let frames = samples.len() / channels;

        for (index, frame) in samples.chunks_exact_mut(channels).enumerate() {
            let level = start + (end - start) * (index + 1) as f32 / frames as f32;
            let value = (self.phase.sin() as f32 * level * self.peak).round() as i16;
            frame.fill(value);
            self.advance();
        }
        self.level = end;
    }

    fn advance(&mut self) {
        let frequency = if (self.elapsed_frames / self.frames_per_tone) % 2 == 0 {
            self.tones.0
        } else {
            self.tones.1
        };
        self.phase += TAU * frequency / self.sample_rate as f64;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
        self.elapsed_frames += 1;
    }

    /// Smoothed level reached at the end of the last buffer.
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }
}
