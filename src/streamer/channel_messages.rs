use crate::error::AudioDeviceError;

/// Reports from the playback thread to whoever owns the streamer.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamerEvent {
    /// The device failed and was reopened successfully.
    Reopened(AudioDeviceError),
    /// The device failed again after a reopen, or could not be reopened. Playback is over.
    Failed(AudioDeviceError),
}
