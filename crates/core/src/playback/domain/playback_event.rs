use super::remote_phrases::RemotePhraseError;

/// Result reported back to the sequencer by an asynchronous collaborator.
///
/// Every event carries the sequencer generation it was issued under; events
/// from an earlier generation (before a stop) are discarded.
#[derive(Debug)]
pub enum PlaybackEvent {
    AudioFinished {
        generation: u64,
    },
    AudioFailed {
        generation: u64,
        reason: String,
    },
    RemoteBatch {
        generation: u64,
        result: Result<Vec<String>, RemotePhraseError>,
    },
}

impl PlaybackEvent {
    pub fn generation(&self) -> u64 {
        match self {
            PlaybackEvent::AudioFinished { generation }
            | PlaybackEvent::AudioFailed { generation, .. }
            | PlaybackEvent::RemoteBatch { generation, .. } => *generation,
        }
    }
}
