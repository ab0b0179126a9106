use super::*;
use crate::config::SirenConfig;
use crate::mock::MockAudio;
use std::time::{Duration, Instant};

fn stream_config() -> StreamConfig {
    StreamConfig {
        buffer_frame_count: 256,
        ..StreamConfig::default()
    }
}

fn start(audio: &MockAudio) -> AudioStreamer {
    let config = stream_config();
    let synth = SirenSynthesizer::new(&SirenConfig::default(), config.sample_rate);
    let gain = GainState::new();
    gain.store(0.5);
    AudioStreamer::start(&config, synth, audio.clone(), gain)
}

fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_streams_full_buffers_until_stopped() {
    let audio = MockAudio::new(256);
    let mut streamer = start(&audio);
    wait_for(|| audio.log.writes() >= 20);

    let stats = streamer.stop().unwrap();
    assert_eq!(audio.log.opens(), 1);
    assert_eq!(audio.log.closes(), 1);
    assert_eq!(audio.log.wrong_length_writes.load(Ordering::SeqCst), 0);
    assert!(stats.buffers_written >= 20);
    assert_eq!(stats.buffers_written, audio.log.writes() as u64);
}

#[test]
fn test_stop_finishes_current_buffer_and_drops_the_queue() {
    let config = stream_config();
    let audio = MockAudio::new(256).paced(config.buffer_period());
    let mut streamer = start(&audio);
    wait_for(|| audio.log.writes() >= 5);

    let requested = Instant::now();
    let stats = streamer.stop().unwrap();
    let elapsed = requested.elapsed();

    assert!(elapsed <= config.buffer_period() * 2, "stop took {elapsed:?}");
    assert!(stats.buffers_written <= stats.buffers_produced);
    assert!(stats.buffers_produced - stats.buffers_written <= config.buffer_count as u64);
    assert_eq!(stats.buffers_written, audio.log.writes() as u64);
    assert_eq!(audio.log.closes(), 1);
}

#[test]
fn test_raised_shutdown_signal_stops_playback_without_stop() {
    let config = stream_config();
    let audio = MockAudio::new(256).paced(config.buffer_period());
    let mut streamer = start(&audio);
    wait_for(|| audio.log.writes() >= 3);

    streamer.shutdown_signal().store(true, Ordering::SeqCst);
    wait_for(|| audio.log.closes() == 1);
    let writes = audio.log.writes();
    thread::sleep(config.buffer_period() * 2);
    assert_eq!(audio.log.writes(), writes);
    assert!(streamer.stop().is_ok());
    assert_eq!(audio.log.closes(), 1);
}

#[test]
fn test_stop_is_idempotent() {
    let audio = MockAudio::new(256);
    let mut streamer = start(&audio);
    wait_for(|| audio.log.writes() >= 3);

    let first = streamer.stop();
    let second = streamer.stop();
    assert!(first.is_ok());
    assert_eq!(first, second);
    assert!(!streamer.is_running());
    drop(streamer);
    assert_eq!(audio.log.closes(), 1);
}

#[test]
fn test_drop_closes_device() {
    let audio = MockAudio::new(256);
    let streamer = start(&audio);
    wait_for(|| audio.log.writes() >= 1);
    drop(streamer);
    assert_eq!(audio.log.closes(), 1);
}

#[test]
fn test_underrun_recovered_by_reopening() {
    let audio = MockAudio::new(256).failing_writes(|index| index == 4);
    let mut streamer = start(&audio);
    wait_for(|| audio.log.writes() >= 10);

    assert_eq!(streamer.poll_failure(), None);
    assert!(streamer.is_running());
    let stats = streamer.stop().unwrap();
    assert_eq!(stats.reopens, 1);
    assert_eq!(audio.log.opens(), 2);
    assert_eq!(audio.log.closes(), 2);
    assert_eq!(audio.log.max_open.load(Ordering::SeqCst), 1);
}

#[test]
fn test_separate_underruns_each_get_a_reopen() {
    let audio = MockAudio::new(256).failing_writes(|index| index == 3 || index == 9);
    let mut streamer = start(&audio);
    wait_for(|| audio.log.writes() >= 15);

    let stats = streamer.stop().unwrap();
    assert_eq!(stats.reopens, 2);
    assert_eq!(audio.log.opens(), audio.log.closes());
}

#[test]
fn test_repeated_failure_stops_streamer() {
    let audio = MockAudio::new(256).failing_writes(|index| index >= 2);
    let mut streamer = start(&audio);
    wait_for(|| !streamer.is_running());

    assert_eq!(streamer.poll_failure(), Some(AudioDeviceError::Underrun));
    assert_eq!(streamer.stop(), Err(AudioDeviceError::Underrun));
    assert_eq!(audio.log.opens(), 2);
    assert_eq!(audio.log.closes(), 2);
}

#[test]
fn test_open_retried_once() {
    let audio = MockAudio::new(256).failing_opens(|index| index == 0);
    let mut streamer = start(&audio);
    wait_for(|| audio.log.writes() >= 3);

    assert!(streamer.stop().is_ok());
    assert_eq!(audio.log.opens(), 2);
    assert_eq!(audio.log.closes(), 1);
}

#[test]
fn test_open_failure_is_fatal_after_retry() {
    let audio = MockAudio::new(256).failing_opens(|_| true);
    let mut streamer = start(&audio);
    wait_for(|| !streamer.is_running());

    assert!(matches!(streamer.stop(), Err(AudioDeviceError::Open(_))));
    assert_eq!(audio.log.opens(), 2);
    assert_eq!(audio.log.closes(), 0);
    assert_eq!(audio.log.writes(), 0);
}
