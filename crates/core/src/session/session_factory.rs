use std::sync::Arc;

use crate::narration::domain::phrase_catalog::PhraseCatalog;
use crate::narration::domain::phrase_selector::PhraseSelector;
use crate::playback::domain::phrase_display::PhraseDisplay;
use crate::playback::domain::remote_phrases::{
    NoRemotePhraseService, RemotePhraseError, RemotePhraseService,
};
use crate::playback::infrastructure::http_remote_phrase_service::HttpRemotePhraseService;
use crate::playback::infrastructure::threaded_batch_requester::ThreadedBatchRequester;
use crate::playback::infrastructure::timed_audio_player::TimedAudioPlayer;
use crate::playback::playback_sequencer::PlaybackSequencer;
use crate::tracking::infrastructure::centroid_tracker::CentroidTracker;

use super::narration_session::NarrationSession;
use super::session_config::SessionConfig;
use super::session_logger::SessionLogger;

/// Wires a headless session from configuration.
///
/// Without a catalog the session still tracks faces but never speaks local
/// phrases. Without `remote_url` every remote batch falls back to local.
pub fn build_session(
    config: &SessionConfig,
    catalog: Option<PhraseCatalog>,
    display: Box<dyn PhraseDisplay>,
    logger: Box<dyn SessionLogger>,
) -> Result<NarrationSession, RemotePhraseError> {
    let (tx, rx) = crossbeam_channel::unbounded();

    let selector = match catalog {
        Some(catalog) => {
            log::info!("Phrase catalog ready ({} phrases)", catalog.phrase_count());
            PhraseSelector::new(catalog, config.speed_thresholds(), config.history_size)
        }
        None => {
            log::warn!("No phrase catalog; local narration disabled");
            PhraseSelector::unavailable()
        }
    };

    let service: Arc<dyn RemotePhraseService> = match &config.remote_url {
        Some(url) => {
            log::info!("Using remote phrase service at {url}");
            Arc::new(HttpRemotePhraseService::new(url, config.remote_timeout())?)
        }
        None => {
            log::info!("No remote phrase service configured");
            Arc::new(NoRemotePhraseService)
        }
    };

    let sequencer = PlaybackSequencer::new(
        config.sequencer_params(),
        selector,
        Box::new(TimedAudioPlayer::new(tx.clone(), config.speech_per_word())),
        display,
        Box::new(ThreadedBatchRequester::new(service, tx)),
    );

    Ok(NarrationSession::new(
        Box::new(CentroidTracker::new(config.tracker_params())),
        sequencer,
        rx,
        logger,
        config.speed_thresholds(),
    ))
}
