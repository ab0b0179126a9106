mod buffer;
mod channel_messages;
mod playback_thread;
mod synthesis_thread;

pub use buffer::AudioBuffer;
pub use channel_messages::StreamerEvent;

use crate::config::StreamConfig;
use crate::error::AudioDeviceError;
use crate::gain::GainState;
use crate::hardware::AudioOutput;
use crate::synth::SirenSynthesizer;
use crossbeam::channel::{bounded, unbounded, Receiver};
use playback_thread::playback_thread_logic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use synthesis_thread::synthesis_thread_logic;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub buffers_produced: u64,
    pub buffers_written: u64,
    pub reopens: u32,
}

/// Keeps the audio device fed from a pool of `buffer_count` buffers.
///
/// A synthesis thread fills free buffers and a playback thread writes them, so the device
/// always has the next buffer ready regardless of how often the gain changes.
pub struct AudioStreamer {
    shutdown_signal: Arc<AtomicBool>,
    synthesis_thread: Option<JoinHandle<u64>>,
    playback_thread: Option<JoinHandle<StreamStats>>,
    events: Receiver<StreamerEvent>,
    failure: Option<AudioDeviceError>,
    outcome: Option<Result<StreamStats, AudioDeviceError>>,
}

impl AudioStreamer {
    pub fn start<A: AudioOutput>(
        config: &StreamConfig,
        synth: SirenSynthesizer,
        output: A,
        gain: GainState,
    ) -> Self {
        let (free_sender, free_receiver) = bounded(config.buffer_count);
        let (filled_sender, filled_receiver) = bounded(config.buffer_count);
        let (event_sender, events) = unbounded();
        let pool = (0..config.buffer_count)
            .map(|_| AudioBuffer::new(config.buffer_frame_count, config.channels))
            .collect::<Vec<_>>();

        let shutdown_signal = Arc::new(AtomicBool::new(false));

        let synthesis_thread = {
            let shutdown_signal = Arc::clone(&shutdown_signal);
            thread::spawn(move || {
                synthesis_thread_logic(
                    synth,
                    gain,
                    pool,
                    free_receiver,
                    filled_sender,
                    shutdown_signal,
                )
            })
        };

        let playback_thread = {
            let shutdown_signal = Arc::clone(&shutdown_signal);
            let config = config.clone();
            thread::spawn(move || {
                playback_thread_logic(
                    output,
                    config,
                    filled_receiver,
                    free_sender,
                    event_sender,
                    shutdown_signal,
                )
            })
        };

        AudioStreamer {
            shutdown_signal,
            synthesis_thread: Some(synthesis_thread),
            playback_thread: Some(playback_thread),
            events,
            failure: None,
            outcome: None,
        }
    }

    /// Drain pending events and return the fatal device error, if playback has given up.
    pub fn poll_failure(&mut self) -> Option<AudioDeviceError> {
        for event in self.events.try_iter() {
            match event {
                StreamerEvent::Reopened(cause) => {
                    warn!(%cause, "audio device recovered by reopening")
                }
                StreamerEvent::Failed(err) => {
                    self.failure.get_or_insert(err);
                }
            }
        }
        self.failure.clone()
    }

    /// Raising this flag makes both audio threads wind down without waiting for [`stop`](Self::stop).
    pub fn shutdown_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown_signal)
    }

    pub fn is_running(&self) -> bool {
        self.outcome.is_none() && !self.shutdown_signal.load(Ordering::SeqCst)
    }

    /// Stop producing, let playback finish its current buffer and close the device. Queued
    /// buffers are dropped. Safe to call repeatedly; later calls return the first call's outcome.
    pub fn stop(&mut self) -> Result<StreamStats, AudioDeviceError> {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        self.shutdown_signal.store(true, Ordering::SeqCst);

        let mut stats = StreamStats::default();
        let mut panicked = None;
        if let Some(thread_handle) = self.synthesis_thread.take() {
            match thread_handle.join() {
                Ok(produced) => stats.buffers_produced = produced,
                Err(_) => panicked = Some("synthesis"),
            }
        }
        if let Some(thread_handle) = self.playback_thread.take() {
            match thread_handle.join() {
                Ok(playback) => {
                    stats.buffers_written = playback.buffers_written;
                    stats.reopens = playback.reopens;
                }
                Err(_) => panicked = Some("playback"),
            }
        }

        let outcome = match (self.poll_failure(), panicked) {
            (Some(err), _) => Err(err),
            (None, Some(reason)) => Err(AudioDeviceError::Worker(reason)),
            (None, None) => Ok(stats),
        };
        self.outcome = Some(outcome.clone());
        outcome
    }
}

impl Drop for AudioStreamer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests;
