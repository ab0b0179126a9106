use super::AudioBuffer;
use crate::gain::GainState;
use crate::synth::SirenSynthesizer;
use crossbeam::channel::{Receiver, Sender};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::trace;

/// Fills buffers and queues them for playback until shut down or until the playback side
/// goes away. `pool` is used up first; after that every buffer is one the playback thread
/// has handed back. Returns the number of buffers produced.
pub fn synthesis_thread_logic(
    mut synth: SirenSynthesizer,
    gain: GainState,
    mut pool: Vec<AudioBuffer>,
    free_buffers: Receiver<AudioBuffer>,
    filled_buffers: Sender<AudioBuffer>,
    shutdown_signal: Arc<AtomicBool>,
) -> u64 {
    let mut produced = 0;

    while !shutdown_signal.load(Ordering::SeqCst) {
        let mut buffer = match pool.pop() {
            Some(buffer) => buffer,
            None => match free_buffers.recv() {
                Ok(buffer) => buffer,
                Err(_) => break,
            },
        };
        synth.fill(&mut buffer, &gain);
        if filled_buffers.send(buffer).is_err() {
            break;
        }
        produced += 1;
    }

    trace!(produced, level = synth.level(), "synthesis thread done");
    produced
}
