use super::{LoopState, RunSummary};
use crate::error::Result;
use crate::gain::GainState;
use crate::hardware::{DigitalOutput, Level, PulseTimer};
use crate::mapper::AmplitudeMapper;
use crate::sensor::DistanceSensor;
use crate::streamer::AudioStreamer;
use crossbeam::atomic::AtomicCell;
use crossbeam::channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub struct PollLoop<P, L> {
    pub sensor: DistanceSensor<P>,
    pub mapper: AmplitudeMapper,
    pub led: L,
    pub gain: GainState,
    pub poll_interval: Duration,
    pub state: Arc<AtomicCell<LoopState>>,
    pub stop_receiver: Receiver<()>,
}

pub fn poll_thread_logic<P: PulseTimer, L: DigitalOutput>(
    mut poll_loop: PollLoop<P, L>,
    mut streamer: AudioStreamer,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    let outcome = poll_loop.run(&mut streamer, &mut summary);

    poll_loop.state.store(LoopState::Stopping);
    let stream = streamer.stop();
    poll_loop.led.set_level(Level::Low);
    poll_loop.state.store(LoopState::Stopped);

    if let Err(err) = &outcome {
        error!(%err, "control loop stopped on error");
    }
    outcome?;
    summary.stream = stream?;
    info!(
        polls = summary.polls,
        invalid = summary.invalid_samples,
        buffers = summary.stream.buffers_written,
        "control loop stopped"
    );
    Ok(summary)
}

impl<P: PulseTimer, L: DigitalOutput> PollLoop<P, L> {
    fn run(&mut self, streamer: &mut AudioStreamer, summary: &mut RunSummary) -> Result<()> {
        self.led.set_level(Level::Low);
        let mut led_on = false;

        loop {
            if let Ok(()) | Err(TryRecvError::Disconnected) = self.stop_receiver.try_recv() {
                return Ok(());
            }
            let started = Instant::now();

            let sample = self.sensor.measure();
            summary.polls += 1;
            let gain = self.mapper.map(&sample, self.gain.load());
            self.gain.store(gain);

            match self.mapper.within_threshold(&sample) {
                Some(within) => {
                    summary.valid_samples += 1;
                    if within != led_on {
                        self.led
                            .set_level(if within { Level::High } else { Level::Low });
                        led_on = within;
                    }
                    debug!(
                        distance_cm = sample.distance_cm,
                        gain,
                        led = if led_on { "on" } else { "off" },
                        "poll"
                    );
                }
                None => {
                    summary.invalid_samples += 1;
                    debug!(gain, "invalid reading, holding gain");
                }
            }

            if let Some(err) = streamer.poll_failure() {
                return Err(err.into());
            }

            let remaining = self.poll_interval.saturating_sub(started.elapsed());
            match self.stop_receiver.recv_timeout(remaining) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
    }
}
