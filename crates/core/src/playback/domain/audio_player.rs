use std::fmt;

/// Where a phrase came from. Players may resolve audio differently for
/// catalog phrases and for phrases generated by the remote service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhraseOrigin {
    Local,
    Remote,
}

impl fmt::Display for PhraseOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhraseOrigin::Local => write!(f, "local"),
            PhraseOrigin::Remote => write!(f, "remote"),
        }
    }
}

/// Domain interface for speaking a phrase.
///
/// `play` returns as soon as playback has started. Completion or failure is
/// reported later as a [`PlaybackEvent`](super::playback_event::PlaybackEvent)
/// tagged with `generation`. An `Err` means playback never started.
pub trait AudioPlayer: Send {
    fn play(
        &mut self,
        phrase: &str,
        origin: PhraseOrigin,
        generation: u64,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Stop whatever is playing. No completion event may follow.
    fn stop(&mut self);
}
