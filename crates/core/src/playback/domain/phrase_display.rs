/// Domain interface for the on-screen caption of the phrase being spoken.
pub trait PhraseDisplay: Send {
    fn show(&mut self, text: &str);
    fn clear(&mut self);
}

/// Display that shows nothing, for headless sessions and tests.
pub struct NullPhraseDisplay;

impl PhraseDisplay for NullPhraseDisplay {
    fn show(&mut self, _text: &str) {}
    fn clear(&mut self) {}
}
