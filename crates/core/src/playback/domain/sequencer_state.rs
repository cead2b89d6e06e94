use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    PlayingLocal,
    WaitingAfterLocal,
    FetchingRemoteBatch,
    PlayingRemoteBatch,
    WaitingAfterRemoteItem,
}

/// Which half of the narration cycle the sequencer is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackMode {
    Local,
    RemoteBatch,
}

impl SequencerState {
    pub fn mode(&self) -> PlaybackMode {
        match self {
            SequencerState::FetchingRemoteBatch
            | SequencerState::PlayingRemoteBatch
            | SequencerState::WaitingAfterRemoteItem => PlaybackMode::RemoteBatch,
            SequencerState::Idle
            | SequencerState::PlayingLocal
            | SequencerState::WaitingAfterLocal => PlaybackMode::Local,
        }
    }
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SequencerState::Idle => "idle",
            SequencerState::PlayingLocal => "playing-local",
            SequencerState::WaitingAfterLocal => "waiting-after-local",
            SequencerState::FetchingRemoteBatch => "fetching-remote-batch",
            SequencerState::PlayingRemoteBatch => "playing-remote-batch",
            SequencerState::WaitingAfterRemoteItem => "waiting-after-remote-item",
        };
        f.write_str(name)
    }
}
