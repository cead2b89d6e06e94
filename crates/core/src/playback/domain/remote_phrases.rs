use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum RemotePhraseError {
    #[error("failed to encode frame {index}: {source}")]
    Encode {
        index: usize,
        #[source]
        source: image::ImageError,
    },
    #[error("frame {0} has unsupported pixel layout")]
    FrameLayout(usize),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("malformed phrase payload: {0}")]
    Payload(#[source] serde_json::Error),
    #[error("phrase service returned no phrases")]
    Empty,
    #[error("no remote phrase service configured")]
    NotConfigured,
}

/// Domain interface for the service that turns a captured frame into an
/// ordered batch of phrases. Blocking; callers run it off the frame loop.
pub trait RemotePhraseService: Send + Sync {
    fn fetch(&self, frame: &Frame) -> Result<Vec<String>, RemotePhraseError>;
}

/// Service used when no remote endpoint is configured: every fetch fails,
/// so the sequencer keeps to local phrases.
pub struct NoRemotePhraseService;

impl RemotePhraseService for NoRemotePhraseService {
    fn fetch(&self, _frame: &Frame) -> Result<Vec<String>, RemotePhraseError> {
        Err(RemotePhraseError::NotConfigured)
    }
}

/// Domain interface for issuing a fetch without blocking the frame loop.
///
/// The outcome arrives as a `PlaybackEvent::RemoteBatch` tagged with
/// `generation`.
pub trait RemoteBatchRequester: Send {
    fn request(&mut self, frame: Frame, generation: u64);

    /// Abandon any request in flight. Its result must not be delivered.
    fn cancel(&mut self);
}
