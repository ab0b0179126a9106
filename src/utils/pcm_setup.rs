/// PCM Setup Module
///
/// Handles the setup of the ALSA playback device the siren is streamed to. Hardware
/// parameters come from the stream configuration plus the fixed format settings in `config`.
use crate::config::{StreamConfig, FORMAT, PCM_DEVICE_ACCESS};
use crate::error::AudioDeviceError;
use crate::hardware::{AudioOutput, AudioStream};
use crate::streamer::AudioBuffer;
use alsa::{
    pcm::{Frames, HwParams, PCM},
    Direction, ValueOr,
};
use tracing::debug;

pub fn setup_pcm(
    device_name: &str,
    sample_rate: u32,
    channels: u16,
    period_size: usize,
    periods: usize,
) -> Result<PCM, alsa::Error> {
    let pcm = PCM::new(device_name, Direction::Playback, false)?;

    {
        // Limiting the scope of HwParams
        let hwp = HwParams::any(&pcm)?;
        hwp.set_channels(channels.into())?;
        hwp.set_rate(sample_rate, ValueOr::Nearest)?;
        hwp.set_format(FORMAT)?;
        hwp.set_access(PCM_DEVICE_ACCESS)?;
        hwp.set_period_size(period_size as Frames, ValueOr::Nearest)?;
        hwp.set_buffer_size_near((period_size * periods) as Frames)?;
        pcm.hw_params(&hwp)?;
    }

    let hwp = pcm.hw_params_current()?;
    debug!(
        rate = hwp.get_rate()?,
        period = hwp.get_period_size()?,
        buffer = hwp.get_buffer_size()?,
        "PCM configured"
    );
    drop(hwp);

    Ok(pcm)
}

/// ALSA playback device, reopened from scratch on every [`AudioOutput::open`].
pub struct AlsaOutput {
    device_name: String,
    period_size: usize,
    periods: usize,
}

impl AlsaOutput {
    pub fn new(device_name: impl Into<String>, stream: &StreamConfig) -> Self {
        Self {
            device_name: device_name.into(),
            period_size: stream.buffer_frame_count,
            periods: stream.buffer_count,
        }
    }
}

impl AudioOutput for AlsaOutput {
    type Stream = AlsaStream;

    fn open(&mut self, sample_rate: u32, channels: u16) -> Result<AlsaStream, AudioDeviceError> {
        let pcm = setup_pcm(
            &self.device_name,
            sample_rate,
            channels,
            self.period_size,
            self.periods,
        )
        .map_err(|err| AudioDeviceError::Open(format!("{}: {err}", self.device_name)))?;
        let granted = pcm
            .hw_params_current()
            .and_then(|hwp| hwp.get_rate())
            .map_err(|err| AudioDeviceError::Open(format!("{}: {err}", self.device_name)))?;
        check_rate(&self.device_name, sample_rate, granted)?;
        Ok(AlsaStream {
            pcm,
            channels: channels as usize,
        })
    }
}

/// The synthesizer is clocked at the requested rate, so a device that settles on another one
/// would play the siren off pitch.
fn check_rate(device_name: &str, requested: u32, granted: u32) -> Result<(), AudioDeviceError> {
    if requested == granted {
        Ok(())
    } else {
        Err(AudioDeviceError::Open(format!(
            "{device_name}: asked for {requested} Hz, device runs at {granted} Hz"
        )))
    }
}

pub struct AlsaStream {
    pcm: PCM,
    channels: usize,
}

impl AudioStream for AlsaStream {
    fn write(&mut self, buffer: &AudioBuffer) -> Result<(), AudioDeviceError> {
        let io = self
            .pcm
            .io_i16()
            .map_err(|err| AudioDeviceError::Write(err.to_string()))?;

        let samples = buffer.samples();
        let mut frames_written = 0;
        while frames_written < buffer.frame_count() {
            match io.writei(&samples[frames_written * self.channels..]) {
                Ok(frames) => frames_written += frames,
                Err(err) if err.errno() as i32 == libc::EPIPE => return Err(AudioDeviceError::Underrun),
                Err(err) => return Err(AudioDeviceError::Write(err.to_string())),
            }
        }
        Ok(())
    }

    fn close(self) -> Result<(), AudioDeviceError> {
        self.pcm
            .drop()
            .map_err(|err| AudioDeviceError::Close(err.to_string()))
    }
}
