use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;

use crate::playback::domain::playback_event::PlaybackEvent;
use crate::playback::domain::remote_phrases::{RemoteBatchRequester, RemotePhraseService};
use crate::shared::frame::Frame;

/// Runs each remote fetch on its own worker thread and posts the outcome to
/// the session's event channel.
pub struct ThreadedBatchRequester {
    service: Arc<dyn RemotePhraseService>,
    events: Sender<PlaybackEvent>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl ThreadedBatchRequester {
    pub fn new(service: Arc<dyn RemotePhraseService>, events: Sender<PlaybackEvent>) -> Self {
        Self {
            service,
            events,
            cancelled: None,
        }
    }
}

impl RemoteBatchRequester for ThreadedBatchRequester {
    fn request(&mut self, frame: Frame, generation: u64) {
        self.cancel();
        let cancelled = Arc::new(AtomicBool::new(false));
        self.cancelled = Some(cancelled.clone());

        let service = self.service.clone();
        let tx = self.events.clone();
        thread::spawn(move || {
            let result = service.fetch(&frame);
            if cancelled.load(Ordering::Relaxed) {
                log::debug!("Discarding remote phrases for cancelled request");
                return;
            }
            let _ = tx.send(PlaybackEvent::RemoteBatch { generation, result });
        });
    }

    fn cancel(&mut self) {
        if let Some(flag) = self.cancelled.take() {
            flag.store(true, Ordering::Relaxed);
        }
    }
}

impl Drop for ThreadedBatchRequester {
    fn drop(&mut self) {
        self.cancel();
    }
}
