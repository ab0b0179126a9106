/// Fixed-size block of interleaved S16 frames.
///
/// The length is set at construction and only the contents are exposed mutably, so a
/// buffer handed to the device is always exactly `frame_count` frames long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    samples: Vec<i16>,
    channels: u16,
}

impl AudioBuffer {
    pub fn new(frame_count: usize, channels: u16) -> Self {
        Self {
            samples: vec![0i16; frame_count * channels as usize],
            channels,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [i16] {
        &mut self.samples
    }
}
