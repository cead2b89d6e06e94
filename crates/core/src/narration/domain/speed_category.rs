use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::constants::{SPEED_HI_ABOVE, SPEED_LO_BELOW};

/// Ordered speed buckets used to key the phrase catalog.
///
/// `All` never comes out of classification; it is the catalog key for
/// phrases that fit any speed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedCategory {
    Lo,
    Med,
    Hi,
    All,
}

/// Breakpoints between categories, in pixels/second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedThresholds {
    /// Speeds strictly below are `Lo`.
    pub lo_below: f64,
    /// Speeds strictly above are `Hi`.
    pub hi_above: f64,
}

impl Default for SpeedThresholds {
    fn default() -> Self {
        Self {
            lo_below: SPEED_LO_BELOW,
            hi_above: SPEED_HI_ABOVE,
        }
    }
}

impl SpeedThresholds {
    /// Unknown speed counts as `Med`.
    pub fn classify(&self, speed: Option<f64>) -> SpeedCategory {
        match speed {
            None => SpeedCategory::Med,
            Some(s) if s < self.lo_below => SpeedCategory::Lo,
            Some(s) if s <= self.hi_above => SpeedCategory::Med,
            Some(_) => SpeedCategory::Hi,
        }
    }
}

impl SpeedCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedCategory::Lo => "lo",
            SpeedCategory::Med => "med",
            SpeedCategory::Hi => "hi",
            SpeedCategory::All => "all",
        }
    }
}

impl fmt::Display for SpeedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
