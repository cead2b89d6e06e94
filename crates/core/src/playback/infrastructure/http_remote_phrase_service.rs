use std::io::Cursor;
use std::time::Duration;

use serde::Deserialize;

use crate::playback::domain::remote_phrases::{RemotePhraseError, RemotePhraseService};
use crate::shared::constants::MAX_REMOTE_PHRASES;
use crate::shared::frame::Frame;

/// Accepted response bodies: a bare array or `{"phrases": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PhrasePayload {
    List(Vec<String>),
    Wrapped { phrases: Vec<String> },
}

/// Posts the captured frame as PNG and reads back a JSON phrase list.
pub struct HttpRemotePhraseService {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpRemotePhraseService {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RemotePhraseError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemotePhraseError::Transport {
                url: url.to_string(),
                source: e,
            })?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl RemotePhraseService for HttpRemotePhraseService {
    fn fetch(&self, frame: &Frame) -> Result<Vec<String>, RemotePhraseError> {
        let body = encode_png(frame)?;
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(body)
            .send()
            .map_err(|e| RemotePhraseError::Transport {
                url: self.url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemotePhraseError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(|e| RemotePhraseError::Transport {
            url: self.url.clone(),
            source: e,
        })?;
        parse_phrases(&bytes)
    }
}

pub fn encode_png(frame: &Frame) -> Result<Vec<u8>, RemotePhraseError> {
    if frame.channels() != 3 {
        return Err(RemotePhraseError::FrameLayout(frame.index()));
    }
    let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or(RemotePhraseError::FrameLayout(frame.index()))?;

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| RemotePhraseError::Encode {
            index: frame.index(),
            source: e,
        })?;
    Ok(buf)
}

/// Blank entries are dropped; nothing left is an error. At most
/// `MAX_REMOTE_PHRASES` are kept.
fn parse_phrases(body: &[u8]) -> Result<Vec<String>, RemotePhraseError> {
    let payload: PhrasePayload = serde_json::from_slice(body).map_err(RemotePhraseError::Payload)?;
    let phrases = match payload {
        PhrasePayload::List(p) | PhrasePayload::Wrapped { phrases: p } => p,
    };
    let received = phrases.len();
    let phrases: Vec<String> = phrases
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .take(MAX_REMOTE_PHRASES)
        .collect();
    if received > MAX_REMOTE_PHRASES {
        log::warn!("Remote phrase service sent {received} phrases; keeping the first {MAX_REMOTE_PHRASES}");
    }

    if phrases.is_empty() {
        return Err(RemotePhraseError::Empty);
    }
    Ok(phrases)
}
