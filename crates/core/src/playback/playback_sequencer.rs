use std::time::{Duration, Instant};

use crate::narration::domain::phrase_selector::PhraseSelector;
use crate::shared::constants::{INTER_MESSAGE_DELAY_MS, LOCAL_PHRASES_PER_CYCLE};
use crate::shared::frame::Frame;

use super::domain::audio_player::{AudioPlayer, PhraseOrigin};
use super::domain::phrase_display::PhraseDisplay;
use super::domain::playback_event::PlaybackEvent;
use super::domain::remote_phrases::{RemoteBatchRequester, RemotePhraseError};
use super::domain::sequencer_state::{PlaybackMode, SequencerState};

#[derive(Clone, Debug, PartialEq)]
pub struct SequencerParams {
    pub local_phrases_per_cycle: usize,
    pub inter_message_delay: Duration,
}

impl Default for SequencerParams {
    fn default() -> Self {
        Self {
            local_phrases_per_cycle: LOCAL_PHRASES_PER_CYCLE,
            inter_message_delay: Duration::from_millis(INTER_MESSAGE_DELAY_MS),
        }
    }
}

/// What the sequencer needs to know about the primary face.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceCue {
    pub emotion: String,
    pub speed: Option<f64>,
}

/// Decides what to say next.
///
/// Cycle: `local_phrases_per_cycle` catalog phrases, then one batch from the
/// remote phrase service played item by item, then back to local phrases.
/// Only one phrase plays at a time, at most one fetch is in flight, and the
/// pause between messages is a deadline checked on every tick.
pub struct PlaybackSequencer {
    params: SequencerParams,
    selector: PhraseSelector,
    audio: Box<dyn AudioPlayer>,
    display: Box<dyn PhraseDisplay>,
    remote: Box<dyn RemoteBatchRequester>,
    state: SequencerState,
    local_count: usize,
    batch: Vec<String>,
    batch_index: usize,
    advance_at: Option<Instant>,
    fetch_in_flight: bool,
    generation: u64,
}

impl PlaybackSequencer {
    pub fn new(
        params: SequencerParams,
        selector: PhraseSelector,
        audio: Box<dyn AudioPlayer>,
        display: Box<dyn PhraseDisplay>,
        remote: Box<dyn RemoteBatchRequester>,
    ) -> Self {
        Self {
            params,
            selector,
            audio,
            display,
            remote,
            state: SequencerState::Idle,
            local_count: 0,
            batch: Vec::new(),
            batch_index: 0,
            advance_at: None,
            fetch_in_flight: false,
            generation: 0,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn mode(&self) -> PlaybackMode {
        self.state.mode()
    }

    pub fn local_count(&self) -> usize {
        self.local_count
    }

    pub fn batch_index(&self) -> usize {
        self.batch_index
    }

    pub fn is_fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn selector(&self) -> &PhraseSelector {
        &self.selector
    }

    /// Per-frame decision point.
    ///
    /// Advances out of a waiting state once its deadline has passed, then,
    /// if idle and a primary face is present, starts the next message.
    /// `capture` is only called when a remote batch is about to be requested.
    pub fn tick(
        &mut self,
        now: Instant,
        cue: Option<&FaceCue>,
        capture: &mut dyn FnMut() -> Option<Frame>,
    ) {
        if self.advance_at.is_some_and(|at| now >= at) {
            self.advance();
        }

        if self.state != SequencerState::Idle || self.advance_at.is_some() {
            return;
        }
        let Some(cue) = cue else {
            return;
        };

        if self.local_count < self.params.local_phrases_per_cycle {
            self.play_local(cue);
        } else {
            self.request_remote_batch(capture);
        }
    }

    pub fn handle_event(&mut self, event: PlaybackEvent, now: Instant) {
        if event.generation() != self.generation {
            log::debug!(
                "Dropping event from generation {} (current {})",
                event.generation(),
                self.generation
            );
            return;
        }

        match event {
            PlaybackEvent::AudioFinished { .. } => self.on_audio_finished(now),
            PlaybackEvent::AudioFailed { reason, .. } => {
                log::warn!("Audio playback failed: {reason}");
                self.on_audio_failed();
            }
            PlaybackEvent::RemoteBatch { result, .. } => self.on_remote_batch(result),
        }
    }

    /// Tear down: silence audio, abandon the fetch, forget the cycle.
    /// Events issued before this call are ignored afterwards.
    pub fn stop(&mut self) {
        self.audio.stop();
        self.remote.cancel();
        self.display.clear();
        self.generation += 1;
        self.state = SequencerState::Idle;
        self.local_count = 0;
        self.batch.clear();
        self.batch_index = 0;
        self.advance_at = None;
        self.fetch_in_flight = false;
        self.selector.clear_history();
    }

    fn play_local(&mut self, cue: &FaceCue) {
        self.local_count += 1;
        match self.selector.select(&cue.emotion, cue.speed) {
            Some(phrase) => {
                if !self.start_playback(&phrase, PhraseOrigin::Local, SequencerState::PlayingLocal) {
                    self.display.clear();
                    self.state = SequencerState::Idle;
                }
            }
            None => log::debug!(
                "Nothing to say for {} (local slot {} skipped)",
                cue.emotion,
                self.local_count
            ),
        }
    }

    fn request_remote_batch(&mut self, capture: &mut dyn FnMut() -> Option<Frame>) {
        if self.fetch_in_flight {
            return;
        }
        match capture() {
            Some(frame) => {
                log::info!("Requesting remote phrases for frame {}", frame.index());
                self.fetch_in_flight = true;
                self.state = SequencerState::FetchingRemoteBatch;
                self.remote.request(frame, self.generation);
            }
            None => {
                log::warn!("No frame available for remote phrases; staying local");
                self.fall_back_to_local();
            }
        }
    }

    /// Returns false when the player could not start; the caller moves on.
    fn start_playback(&mut self, phrase: &str, origin: PhraseOrigin, playing: SequencerState) -> bool {
        self.state = playing;
        self.display.show(phrase);
        log::info!("Saying ({origin}): {phrase}");
        match self.audio.play(phrase, origin, self.generation) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not start audio for {phrase:?}: {e}");
                false
            }
        }
    }

    /// Play the batch item at `batch_index`, skipping items whose audio
    /// cannot start. Falls back to local mode once the batch is used up.
    fn play_remaining_batch(&mut self) {
        while let Some(next) = self.batch.get(self.batch_index).cloned() {
            if self.start_playback(&next, PhraseOrigin::Remote, SequencerState::PlayingRemoteBatch) {
                return;
            }
            self.display.clear();
            self.batch_index += 1;
        }
        log::debug!("Remote batch finished; starting a new cycle");
        self.fall_back_to_local();
    }

    fn on_audio_finished(&mut self, now: Instant) {
        let waiting = match self.state {
            SequencerState::PlayingLocal => SequencerState::WaitingAfterLocal,
            SequencerState::PlayingRemoteBatch => SequencerState::WaitingAfterRemoteItem,
            other => {
                log::debug!("Ignoring audio completion in state {other}");
                return;
            }
        };
        self.state = waiting;
        self.advance_at = Some(now + self.params.inter_message_delay);
    }

    /// Skip straight to the next message, no pause.
    fn on_audio_failed(&mut self) {
        self.state = match self.state {
            SequencerState::PlayingLocal => SequencerState::WaitingAfterLocal,
            SequencerState::PlayingRemoteBatch => SequencerState::WaitingAfterRemoteItem,
            _ => return,
        };
        self.advance();
    }

    fn on_remote_batch(&mut self, result: Result<Vec<String>, RemotePhraseError>) {
        self.fetch_in_flight = false;
        if self.state != SequencerState::FetchingRemoteBatch {
            log::debug!("Remote phrases arrived in state {}; ignoring", self.state);
            return;
        }

        match result {
            Ok(phrases) if !phrases.is_empty() => {
                log::info!("Received {} remote phrases", phrases.len());
                self.batch = phrases;
                self.batch_index = 0;
                self.play_remaining_batch();
            }
            Ok(_) => {
                log::warn!("Remote phrase service returned no phrases; back to local phrases");
                self.fall_back_to_local();
            }
            Err(e) => {
                log::warn!("Remote phrases unavailable ({e}); back to local phrases");
                self.fall_back_to_local();
            }
        }
    }

    fn advance(&mut self) {
        self.advance_at = None;
        self.display.clear();
        match self.state {
            SequencerState::WaitingAfterLocal => self.state = SequencerState::Idle,
            SequencerState::WaitingAfterRemoteItem => {
                self.batch_index += 1;
                self.play_remaining_batch();
            }
            _ => {}
        }
    }

    fn fall_back_to_local(&mut self) {
        self.state = SequencerState::Idle;
        self.local_count = 0;
        self.batch.clear();
        self.batch_index = 0;
    }
}
