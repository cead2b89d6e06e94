use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::phrase_catalog::PhraseCatalog;
use super::selection_history::SelectionHistory;
use super::speed_category::{SpeedCategory, SpeedThresholds};

/// Weighted-random phrase picker keyed by (emotion, speed category).
///
/// Recently spoken phrases are down-weighted but never excluded, so a
/// small candidate set still yields a phrase every time.
pub struct PhraseSelector {
    catalog: Option<PhraseCatalog>,
    history: SelectionHistory,
    thresholds: SpeedThresholds,
    rng: StdRng,
}

impl PhraseSelector {
    pub fn new(catalog: PhraseCatalog, thresholds: SpeedThresholds, history_size: usize) -> Self {
        Self {
            catalog: Some(catalog),
            history: SelectionHistory::new(history_size),
            thresholds,
            rng: StdRng::from_entropy(),
        }
    }

    /// A selector whose catalog failed to load. Every selection is `None`.
    pub fn unavailable() -> Self {
        Self {
            catalog: None,
            history: SelectionHistory::default(),
            thresholds: SpeedThresholds::default(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.catalog.is_some()
    }

    pub fn category_for(&self, speed: Option<f64>) -> SpeedCategory {
        self.thresholds.classify(speed)
    }

    /// Candidates for the combination with their current draw weights.
    pub fn candidate_weights(&self, emotion: &str, speed: Option<f64>) -> Vec<(&str, f64)> {
        match &self.catalog {
            Some(catalog) => weigh(catalog, &self.history, emotion, self.category_for(speed)),
            None => Vec::new(),
        }
    }

    pub fn select(&mut self, emotion: &str, speed: Option<f64>) -> Option<String> {
        let category = self.category_for(speed);
        let catalog = self.catalog.as_ref()?;
        let weighted = weigh(catalog, &self.history, emotion, category);
        if weighted.is_empty() {
            log::debug!("No phrases for {emotion}/{category}");
            return None;
        }

        let weights: Vec<f64> = weighted.iter().map(|(_, w)| *w).collect();
        let total: f64 = weights.iter().sum();
        let draw = self.rng.gen::<f64>() * total;
        let index = match weighted_pick(&weights, draw) {
            Some(i) => i,
            None => self.rng.gen_range(0..weighted.len()),
        };

        let phrase = weighted[index].0.to_string();
        self.history.record(&phrase);
        log::debug!("Selected phrase for {emotion}/{category}: {phrase:?}");
        Some(phrase)
    }

    pub fn history(&self) -> &SelectionHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

fn weigh<'a>(
    catalog: &'a PhraseCatalog,
    history: &SelectionHistory,
    emotion: &str,
    category: SpeedCategory,
) -> Vec<(&'a str, f64)> {
    catalog
        .candidates(emotion, category)
        .into_iter()
        .map(|phrase| (phrase, history.weight(phrase)))
        .collect()
}

/// Subtracts weights in order from `draw` and returns the index at which
/// the remainder reaches zero. `None` only when rounding leaves a positive
/// remainder after the last weight.
fn weighted_pick(weights: &[f64], mut draw: f64) -> Option<usize> {
    for (i, w) in weights.iter().enumerate() {
        draw -= w;
        if draw <= 0.0 {
            return Some(i);
        }
    }
    None
}
