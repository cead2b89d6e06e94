use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::speed_category::SpeedCategory;

/// Emotion key whose phrases apply to every emotion.
pub const ALL_EMOTIONS: &str = "all";

/// Read-only phrase table: emotion → speed category → phrases.
///
/// Serialized as a nested map, e.g.
/// `{"happy": {"lo": ["..."], "all": ["..."]}, "all": {"hi": ["..."]}}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhraseCatalog {
    entries: HashMap<String, HashMap<SpeedCategory, Vec<String>>>,
}

impl PhraseCatalog {
    pub fn new(entries: HashMap<String, HashMap<SpeedCategory, Vec<String>>>) -> Self {
        Self { entries }
    }

    pub fn bucket(&self, emotion: &str, category: SpeedCategory) -> &[String] {
        self.entries
            .get(emotion)
            .and_then(|by_speed| by_speed.get(&category))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every phrase eligible for `(emotion, category)`, gathered from the
    /// specific bucket, the emotion's `all` bucket, the global bucket for the
    /// category and the global `all` bucket.
    ///
    /// A phrase listed in several buckets appears once per bucket.
    pub fn candidates(&self, emotion: &str, category: SpeedCategory) -> Vec<&str> {
        let mut sources = vec![(emotion, category), (emotion, SpeedCategory::All)];
        if emotion != ALL_EMOTIONS {
            sources.push((ALL_EMOTIONS, category));
            sources.push((ALL_EMOTIONS, SpeedCategory::All));
        }
        if category == SpeedCategory::All {
            sources.dedup();
        }

        sources
            .into_iter()
            .flat_map(|(e, c)| self.bucket(e, c).iter().map(String::as_str))
            .collect()
    }

    pub fn phrase_count(&self) -> usize {
        self.entries
            .values()
            .flat_map(|by_speed| by_speed.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.phrase_count() == 0
    }
}
