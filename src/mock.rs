//! Scripted stand-ins for the board, used by the unit tests.

use crate::config::SPEED_OF_SOUND_CM_PER_S;
use crate::error::{AudioDeviceError, SensorError};
use crate::hardware::{AudioOutput, AudioStream, DigitalOutput, Level, PulseTimer};
use crate::streamer::AudioBuffer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EchoReply {
    Echo(Duration),
    Timeout,
}

pub fn echo_for_distance(distance_cm: f32) -> EchoReply {
    EchoReply::Echo(Duration::from_secs_f64(
        distance_cm as f64 * 2.0 / SPEED_OF_SOUND_CM_PER_S as f64,
    ))
}

/// Answers every trigger with the reply currently set. A timeout blocks for the full wait,
/// as the real sensor does.
#[derive(Debug, Clone)]
pub struct ScriptedEcho {
    reply: Arc<Mutex<EchoReply>>,
    pulses: Arc<Mutex<Vec<Duration>>>,
}

impl ScriptedEcho {
    pub fn new(reply: EchoReply) -> Self {
        Self {
            reply: Arc::new(Mutex::new(reply)),
            pulses: Arc::default(),
        }
    }

    pub fn set(&self, reply: EchoReply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn pulses(&self) -> usize {
        self.pulses.lock().unwrap().len()
    }

    pub fn last_pulse_width(&self) -> Option<Duration> {
        self.pulses.lock().unwrap().last().copied()
    }
}

impl PulseTimer for ScriptedEcho {
    fn pulse(&mut self, width: Duration) {
        self.pulses.lock().unwrap().push(width);
    }

    fn wait_for_echo(&mut self, timeout: Duration) -> Result<Duration, SensorError> {
        let reply = *self.reply.lock().unwrap();
        match reply {
            EchoReply::Echo(duration) => Ok(duration),
            EchoReply::Timeout => {
                thread::sleep(timeout);
                Err(SensorError::Timeout(timeout))
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingLed {
    levels: Arc<Mutex<Vec<Level>>>,
}

impl RecordingLed {
    pub fn last(&self) -> Option<Level> {
        self.levels.lock().unwrap().last().copied()
    }

    pub fn history(&self) -> Vec<Level> {
        self.levels.lock().unwrap().clone()
    }
}

impl DigitalOutput for RecordingLed {
    fn set_level(&mut self, level: Level) {
        self.levels.lock().unwrap().push(level);
    }
}

#[derive(Debug, Default)]
pub struct AudioLog {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub writes: AtomicUsize,
    pub wrong_length_writes: AtomicUsize,
    pub open_now: AtomicUsize,
    pub max_open: AtomicUsize,
}

impl AudioLog {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

type FailurePlan = Arc<dyn Fn(usize) -> bool + Send + Sync>;

/// Audio device that checks buffer sizes and fails on request. `fail_open(n)` and
/// `fail_write(n)` are given the zero-based index of the call.
#[derive(Clone)]
pub struct MockAudio {
    pub log: Arc<AudioLog>,
    frame_count: usize,
    pace: Duration,
    fail_open: FailurePlan,
    fail_write: FailurePlan,
}

impl MockAudio {
    pub fn new(frame_count: usize) -> Self {
        Self {
            log: Arc::default(),
            frame_count,
            pace: Duration::from_millis(1),
            fail_open: Arc::new(|_| false),
            fail_write: Arc::new(|_| false),
        }
    }

    /// Block each write for `pace`. One buffer period makes the device consume in real time.
    pub fn paced(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    pub fn failing_opens(mut self, plan: impl Fn(usize) -> bool + Send + Sync + 'static) -> Self {
        self.fail_open = Arc::new(plan);
        self
    }

    pub fn failing_writes(mut self, plan: impl Fn(usize) -> bool + Send + Sync + 'static) -> Self {
        self.fail_write = Arc::new(plan);
        self
    }
}

impl AudioOutput for MockAudio {
    type Stream = MockStream;

    fn open(&mut self, _sample_rate: u32, channels: u16) -> Result<MockStream, AudioDeviceError> {
        let index = self.log.opens.fetch_add(1, Ordering::SeqCst);
        if (self.fail_open)(index) {
            return Err(AudioDeviceError::Open("scripted failure".into()));
        }
        let open_now = self.log.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.max_open.fetch_max(open_now, Ordering::SeqCst);
        Ok(MockStream {
            device: self.clone(),
            expected_samples: self.frame_count * channels as usize,
        })
    }
}

pub struct MockStream {
    device: MockAudio,
    expected_samples: usize,
}

impl AudioStream for MockStream {
    fn write(&mut self, buffer: &AudioBuffer) -> Result<(), AudioDeviceError> {
        let log = &self.device.log;
        let index = log.writes.fetch_add(1, Ordering::SeqCst);
        if buffer.samples().len() != self.expected_samples {
            log.wrong_length_writes.fetch_add(1, Ordering::SeqCst);
        }
        thread::sleep(self.device.pace);
        if (self.device.fail_write)(index) {
            return Err(AudioDeviceError::Underrun);
        }
        Ok(())
    }

    fn close(self) -> Result<(), AudioDeviceError> {
        self.device.log.closes.fetch_add(1, Ordering::SeqCst);
        self.device.log.open_now.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
