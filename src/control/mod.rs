mod poll_thread;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::gain::GainState;
use crate::hardware::{AudioOutput, DigitalOutput, PulseTimer};
use crate::mapper::AmplitudeMapper;
use crate::sensor::DistanceSensor;
use crate::streamer::{AudioStreamer, StreamStats};
use crate::synth::SirenSynthesizer;
use crossbeam::atomic::AtomicCell;
use crossbeam::channel::{bounded, Receiver, Sender};
use poll_thread::{poll_thread_logic, PollLoop};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub polls: u64,
    pub valid_samples: u64,
    pub invalid_samples: u64,
    pub stream: StreamStats,
}

/// Runs the sensor poll loop next to the audio streamer.
///
/// `Idle → Running` on [`start`](Self::start), `Running → Stopping → Stopped` after
/// [`request_stop`](Self::request_stop) or a fatal audio device failure. A stop request
/// reaches the audio threads directly, so playback ends after its current buffer even while
/// the poll thread is still waiting on an echo. The LED is forced off after the device closes.
pub struct ControlLoop<P, L, A> {
    config: Config,
    hardware: Option<(P, L, A)>,
    gain: GainState,
    state: Arc<AtomicCell<LoopState>>,
    stop_sender: Sender<()>,
    stop_receiver: Receiver<()>,
    audio_shutdown: Option<Arc<AtomicBool>>,
    poll_thread: Option<JoinHandle<Result<RunSummary>>>,
}

impl<P, L, A> ControlLoop<P, L, A>
where
    P: PulseTimer + Send + 'static,
    L: DigitalOutput + Send + 'static,
    A: AudioOutput,
{
    /// Fails with [`Error::Config`] before anything is touched if `config` is invalid.
    pub fn new(config: Config, sensor: P, led: L, audio: A) -> Result<Self> {
        config.validate()?;
        let (stop_sender, stop_receiver) = bounded(1);
        Ok(Self {
            config,
            hardware: Some((sensor, led, audio)),
            gain: GainState::new(),
            state: Arc::new(AtomicCell::new(LoopState::Idle)),
            stop_sender,
            stop_receiver,
            audio_shutdown: None,
            poll_thread: None,
        })
    }

    pub fn start(&mut self) -> Result<()> {
        if self.state.load() != LoopState::Idle {
            return Err(Error::NotIdle);
        }
        let Some((timer, led, audio)) = self.hardware.take() else {
            return Err(Error::NotIdle);
        };
        let config = &self.config;

        let synth = SirenSynthesizer::new(&config.siren, config.stream.sample_rate);
        let streamer = AudioStreamer::start(&config.stream, synth, audio, self.gain.clone());
        self.audio_shutdown = Some(streamer.shutdown_signal());

        let poll_loop = PollLoop {
            sensor: DistanceSensor::new(timer, config.sensor.clone()),
            mapper: AmplitudeMapper::new(config.distance_threshold_cm, config.gain_curve),
            led,
            gain: self.gain.clone(),
            poll_interval: config.poll_interval,
            state: Arc::clone(&self.state),
            stop_receiver: self.stop_receiver.clone(),
        };

        self.state.store(LoopState::Running);
        info!(
            threshold_cm = config.distance_threshold_cm,
            poll_interval = ?config.poll_interval,
            buffer_period = ?config.stream.buffer_period(),
            "control loop running"
        );
        self.poll_thread = Some(thread::spawn(move || {
            poll_thread_logic(poll_loop, streamer)
        }));
        Ok(())
    }

    /// Ask the loop to wind down. Returns immediately; use [`wait`](Self::wait) to join.
    pub fn request_stop(&self) {
        if self
            .state
            .compare_exchange(LoopState::Idle, LoopState::Stopped)
            .is_err()
        {
            self.signal_stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.load() == LoopState::Running
    }

    pub fn state(&self) -> LoopState {
        self.state.load()
    }

    /// Target gain most recently derived from a valid reading.
    pub fn gain(&self) -> f32 {
        self.gain.load()
    }

    /// Block until the poll thread has finished and the audio device is closed.
    pub fn wait(&mut self) -> Result<RunSummary> {
        let thread_handle = self.poll_thread.take().ok_or(Error::NotStarted)?;
        thread_handle.join().unwrap_or_else(|_| {
            self.state.store(LoopState::Stopped);
            Err(Error::PollThreadPanicked)
        })
    }

    pub fn stop(&mut self) -> Result<RunSummary> {
        self.request_stop();
        self.wait()
    }
}

impl<P, L, A> ControlLoop<P, L, A> {
    fn signal_stop(&self) {
        if let Some(audio_shutdown) = &self.audio_shutdown {
            audio_shutdown.store(true, Ordering::SeqCst);
        }
        // A stop is already pending if the slot is full
        let _ = self.stop_sender.try_send(());
    }
}

impl<P, L, A> Drop for ControlLoop<P, L, A> {
    fn drop(&mut self) {
        if let Some(thread_handle) = self.poll_thread.take() {
            self.signal_stop();
            let _ = thread_handle.join();
        }
    }
}
