use super::channel_messages::StreamerEvent;
use super::{AudioBuffer, StreamStats};
use crate::config::StreamConfig;
use crate::error::AudioDeviceError;
use crate::hardware::{AudioOutput, AudioStream};
use crossbeam::channel::{Receiver, Sender};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, error, info, warn};

/// Writes queued buffers to the device and hands them back to the pool.
///
/// Any device failure gets one reopen. A successful write restores that allowance; a second
/// failure in a row ends playback and is reported as [`StreamerEvent::Failed`]. Once
/// `shutdown_signal` is raised the buffer being written is finished and anything still queued
/// is discarded, so stopping never waits on more than one buffer period.
pub fn playback_thread_logic<A: AudioOutput>(
    mut output: A,
    config: StreamConfig,
    filled_buffers: Receiver<AudioBuffer>,
    free_buffers: Sender<AudioBuffer>,
    events: Sender<StreamerEvent>,
    shutdown_signal: Arc<AtomicBool>,
) -> StreamStats {
    let mut stats = StreamStats::default();
    let fail = |err: AudioDeviceError| {
        error!(%err, "giving up on audio device");
        let _ = events.send(StreamerEvent::Failed(err));
        shutdown_signal.store(true, Ordering::SeqCst);
    };

    let mut can_reopen = true;
    let mut stream = match output.open(config.sample_rate, config.channels) {
        Ok(stream) => stream,
        Err(err) => {
            warn!(%err, "audio device failed to open, retrying once");
            can_reopen = false;
            match reopen(&mut output, &config, err, &events, &mut stats) {
                Ok(stream) => stream,
                Err(err) => {
                    fail(err);
                    return stats;
                }
            }
        }
    };
    info!(
        sample_rate = config.sample_rate,
        channels = config.channels,
        frames = config.buffer_frame_count,
        buffers = config.buffer_count,
        "audio device open"
    );

    for buffer in filled_buffers.iter() {
        if shutdown_signal.load(Ordering::SeqCst) {
            let discarded = 1 + filled_buffers.try_iter().count();
            debug!(discarded, "stopping, queued buffers dropped");
            break;
        }
        let written = stream.write(&buffer);
        // The pool only goes away once the producer has exited
        let _ = free_buffers.send(buffer);

        match written {
            Ok(()) => {
                stats.buffers_written += 1;
                can_reopen = true;
            }
            Err(err) if shutdown_signal.load(Ordering::SeqCst) => {
                warn!(%err, "audio device write failed while stopping");
                break;
            }
            Err(err) if can_reopen => {
                warn!(%err, "audio device write failed, reopening");
                can_reopen = false;
                if let Err(close_err) = stream.close() {
                    warn!(err = %close_err, "closing failed audio device");
                }
                stream = match reopen(&mut output, &config, err, &events, &mut stats) {
                    Ok(stream) => stream,
                    Err(err) => {
                        fail(err);
                        return stats;
                    }
                };
            }
            Err(err) => {
                if let Err(close_err) = stream.close() {
                    warn!(err = %close_err, "closing failed audio device");
                }
                fail(err);
                return stats;
            }
        }
    }

    if let Err(err) = stream.close() {
        warn!(%err, "audio device did not close cleanly");
    }
    info!(written = stats.buffers_written, "audio device closed");
    stats
}

fn reopen<A: AudioOutput>(
    output: &mut A,
    config: &StreamConfig,
    cause: AudioDeviceError,
    events: &Sender<StreamerEvent>,
    stats: &mut StreamStats,
) -> Result<A::Stream, AudioDeviceError> {
    let stream = output.open(config.sample_rate, config.channels)?;
    stats.reopens += 1;
    let _ = events.send(StreamerEvent::Reopened(cause));
    Ok(stream)
}
