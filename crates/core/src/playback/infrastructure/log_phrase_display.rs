use crate::playback::domain::phrase_display::PhraseDisplay;

/// Caption sink that writes to the log, remembering what is on screen.
#[derive(Default)]
pub struct LogPhraseDisplay {
    current: Option<String>,
}

impl LogPhraseDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl PhraseDisplay for LogPhraseDisplay {
    fn show(&mut self, text: &str) {
        log::info!("Caption: {text}");
        self.current = Some(text.to_string());
    }

    fn clear(&mut self) {
        if self.current.take().is_some() {
            log::debug!("Caption cleared");
        }
    }
}
