use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

use crate::playback::domain::audio_player::{AudioPlayer, PhraseOrigin};
use crate::playback::domain::playback_event::PlaybackEvent;
use crate::shared::constants::SPEECH_MS_PER_WORD;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Stand-in for a speech device: "speaks" for a duration proportional to
/// the phrase's word count, then reports completion.
///
/// Used by the headless replay driver, where no audio output exists.
pub struct TimedAudioPlayer {
    events: Sender<PlaybackEvent>,
    per_word: Duration,
    current: Option<Arc<AtomicBool>>,
}

impl TimedAudioPlayer {
    pub fn new(events: Sender<PlaybackEvent>, per_word: Duration) -> Self {
        Self {
            events,
            per_word,
            current: None,
        }
    }

    pub fn with_default_pace(events: Sender<PlaybackEvent>) -> Self {
        Self::new(events, Duration::from_millis(SPEECH_MS_PER_WORD))
    }

    pub fn duration_for(&self, phrase: &str) -> Duration {
        let words = phrase.split_whitespace().count().max(1) as u32;
        self.per_word * words
    }
}

impl AudioPlayer for TimedAudioPlayer {
    fn play(
        &mut self,
        phrase: &str,
        origin: PhraseOrigin,
        generation: u64,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if phrase.trim().is_empty() {
            return Err("cannot speak an empty phrase".into());
        }
        self.stop();

        let cancelled = Arc::new(AtomicBool::new(false));
        self.current = Some(cancelled.clone());
        let duration = self.duration_for(phrase);
        let tx = self.events.clone();
        log::debug!("Speaking {origin} phrase for {duration:?}");

        thread::spawn(move || {
            let deadline = Instant::now() + duration;
            while Instant::now() < deadline {
                if cancelled.load(Ordering::Relaxed) {
                    return;
                }
                thread::sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
            }
            if !cancelled.load(Ordering::Relaxed) {
                let _ = tx.send(PlaybackEvent::AudioFinished { generation });
            }
        });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(flag) = self.current.take() {
            flag.store(true, Ordering::Relaxed);
        }
    }
}

impl Drop for TimedAudioPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
