//! Nearest-centroid face tracker.
//!
//! Each detection is associated with the closest detection of the previous
//! non-empty frame whose centroid lies within `match_distance`. Matching is
//! greedy, not an optimal assignment: with crowded faces two identities can
//! swap. Every previous detection is claimed at most once per frame.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{
    ASSUMED_FPS, MATCH_DISTANCE, MIN_SPEED_SAMPLES, SPEED_WINDOW, STALE_FRAMES,
};
use crate::shared::detection::Detection;
use crate::tracking::domain::face_id::{FaceId, FaceIdGenerator};
use crate::tracking::domain::face_tracker::{FaceTracker, TrackedDetection};
use crate::tracking::domain::velocity::{SpeedWindow, Velocity};

/// How current detections pick their previous-frame partner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Detections scan in input order; the first to claim a previous
    /// detection keeps it.
    #[default]
    Sequential,
    /// All candidate pairs sorted by distance, closest pairs assigned first.
    GlobalNearest,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackerParams {
    pub match_distance: f64,
    pub stale_frames: u64,
    pub speed_window: usize,
    pub min_samples: usize,
    pub assumed_fps: f64,
    pub strategy: MatchStrategy,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            match_distance: MATCH_DISTANCE,
            stale_frames: STALE_FRAMES,
            speed_window: SPEED_WINDOW,
            min_samples: MIN_SPEED_SAMPLES,
            assumed_fps: ASSUMED_FPS,
            strategy: MatchStrategy::Sequential,
        }
    }
}

#[derive(Clone, Debug)]
struct TrackedFace {
    bbox: BoundingBox,
    last_seen: u64,
    speeds: SpeedWindow,
    heading: Option<f64>,
    updated_at: Instant,
}

pub struct CentroidTracker {
    params: TrackerParams,
    faces: HashMap<FaceId, TrackedFace>,
    previous: Vec<(FaceId, BoundingBox)>,
    ids: FaceIdGenerator,
}

impl CentroidTracker {
    pub fn new(params: TrackerParams) -> Self {
        Self {
            params,
            faces: HashMap::new(),
            previous: Vec::new(),
            ids: FaceIdGenerator::new(),
        }
    }

    fn match_previous(&self, current: &[BoundingBox]) -> Vec<Option<usize>> {
        let previous: Vec<BoundingBox> = self.previous.iter().map(|(_, b)| *b).collect();
        match self.params.strategy {
            MatchStrategy::Sequential => {
                sequential_match(&previous, current, self.params.match_distance)
            }
            MatchStrategy::GlobalNearest => {
                global_nearest_match(&previous, current, self.params.match_distance)
            }
        }
    }

    /// Reuse the matched identity if it is still live, otherwise mint one.
    fn resolve_identity(&mut self, matched: Option<usize>) -> FaceId {
        let live = matched
            .map(|pi| self.previous[pi].0)
            .filter(|id| self.faces.contains_key(id));
        match live {
            Some(id) => id,
            None => {
                let id = self.ids.mint();
                log::debug!("New face {id}");
                id
            }
        }
    }

    fn record(&mut self, id: FaceId, bbox: BoundingBox, frame_index: u64, now: Instant) {
        match self.faces.get_mut(&id) {
            Some(face) => {
                let frame_delta = frame_index.saturating_sub(face.last_seen).max(1);
                if let Some(v) = Velocity::between(&face.bbox, &bbox, frame_delta) {
                    let polar = v.to_polar();
                    face.speeds.push(polar.speed);
                    // a stationary sample has no direction; keep the last one
                    if polar.speed > 0.0 {
                        face.heading = Some(polar.direction);
                    }
                }
                face.bbox = bbox;
                face.last_seen = frame_index;
                face.updated_at = now;
            }
            None => {
                self.faces.insert(
                    id,
                    TrackedFace {
                        bbox,
                        last_seen: frame_index,
                        speeds: SpeedWindow::new(self.params.speed_window, self.params.min_samples),
                        heading: None,
                        updated_at: now,
                    },
                );
            }
        }
    }

    fn evict_stale(&mut self, frame_index: u64, seen: &HashSet<FaceId>) {
        let stale_frames = self.params.stale_frames;
        self.faces.retain(|id, face| {
            if seen.contains(id) || frame_index.saturating_sub(face.last_seen) <= stale_frames {
                return true;
            }
            log::debug!(
                "Evicting face {id} (unseen since frame {}, idle {:?})",
                face.last_seen,
                face.updated_at.elapsed()
            );
            false
        });
    }
}

impl Default for CentroidTracker {
    fn default() -> Self {
        Self::new(TrackerParams::default())
    }
}

impl FaceTracker for CentroidTracker {
    fn track(&mut self, detections: Vec<Detection>, frame_index: u64) -> Vec<TrackedDetection> {
        if detections.is_empty() {
            self.evict_stale(frame_index, &HashSet::new());
            return Vec::new();
        }

        let current: Vec<BoundingBox> = detections.iter().map(|d| d.bbox).collect();
        let matches = self.match_previous(&current);
        let now = Instant::now();

        let mut seen = HashSet::with_capacity(detections.len());
        let mut snapshot = Vec::with_capacity(detections.len());
        let mut tracked = Vec::with_capacity(detections.len());

        for (detection, matched) in detections.into_iter().zip(matches) {
            let id = self.resolve_identity(matched);
            self.record(id, detection.bbox, frame_index, now);
            seen.insert(id);
            snapshot.push((id, detection.bbox));
            tracked.push(TrackedDetection {
                id,
                speed: self.speed_of(id),
                heading: self.heading_of(id),
                detection,
            });
        }

        self.previous = snapshot;
        self.evict_stale(frame_index, &seen);
        tracked
    }

    fn speed_of(&self, id: FaceId) -> Option<f64> {
        self.faces
            .get(&id)
            .and_then(|f| f.speeds.per_second(self.params.assumed_fps))
    }

    fn heading_of(&self, id: FaceId) -> Option<f64> {
        self.faces.get(&id).and_then(|f| f.heading)
    }

    fn tracked_count(&self) -> usize {
        self.faces.len()
    }

    fn reset(&mut self) {
        self.faces.clear();
        self.previous.clear();
    }
}

/// For each current box in order, the nearest unclaimed previous box
/// strictly closer than `max_distance`. Ties go to the earlier candidate.
fn sequential_match(
    previous: &[BoundingBox],
    current: &[BoundingBox],
    max_distance: f64,
) -> Vec<Option<usize>> {
    let mut claimed = vec![false; previous.len()];
    current
        .iter()
        .map(|cur| {
            let mut best = None;
            let mut min_distance = max_distance;
            for (pi, prev) in previous.iter().enumerate() {
                if claimed[pi] {
                    continue;
                }
                let dist = cur.centroid_distance(prev);
                if dist < min_distance {
                    min_distance = dist;
                    best = Some(pi);
                }
            }
            if let Some(pi) = best {
                claimed[pi] = true;
            }
            best
        })
        .collect()
}

/// Greedy distance matching: pairs sorted by ascending distance, each
/// previous/current box used at most once.
fn global_nearest_match(
    previous: &[BoundingBox],
    current: &[BoundingBox],
    max_distance: f64,
) -> Vec<Option<usize>> {
    let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
    for (pi, prev) in previous.iter().enumerate() {
        for (ci, cur) in current.iter().enumerate() {
            let dist = cur.centroid_distance(prev);
            if dist < max_distance {
                pairs.push((pi, ci, dist));
            }
        }
    }
    pairs.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

    let mut used_previous = HashSet::new();
    let mut matches = vec![None; current.len()];
    for (pi, ci, _) in pairs {
        if matches[ci].is_none() && !used_previous.contains(&pi) {
            used_previous.insert(pi);
            matches[ci] = Some(pi);
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn det(x: f64, y: f64) -> Detection {
        Detection::new(BoundingBox::new(x, y, 50.0, 50.0))
    }

    fn tracker_with(strategy: MatchStrategy) -> CentroidTracker {
        CentroidTracker::new(TrackerParams {
            strategy,
            ..TrackerParams::default()
        })
    }

    #[test]
    fn test_new_detections_get_unique_ids() {
        let mut tracker = CentroidTracker::default();
        let faces = tracker.track(vec![det(0.0, 0.0), det(300.0, 300.0)], 0);
        assert_eq!(faces.len(), 2);
        assert_ne!(faces[0].id, faces[1].id);
    }

    #[test]
    fn test_consistent_id_within_threshold() {
        let mut tracker = CentroidTracker::default();
        let id = tracker.track(vec![det(100.0, 100.0)], 0)[0].id;
        let next = tracker.track(vec![det(120.0, 100.0)], 1);
        assert_eq!(next[0].id, id);
    }

    #[test]
    fn test_beyond_threshold_gets_new_id() {
        let mut tracker = CentroidTracker::default();
        let id = tracker.track(vec![det(0.0, 0.0)], 0)[0].id;
        let next = tracker.track(vec![det(100.0, 0.0)], 1);
        // distance == threshold is not a match
        assert_ne!(next[0].id, id);
    }

    #[test]
    fn test_matching_is_deterministic() {
        let frames = vec![
            vec![det(0.0, 0.0), det(200.0, 0.0)],
            vec![det(205.0, 0.0), det(4.0, 0.0)],
            vec![det(10.0, 0.0), det(210.0, 0.0)],
        ];
        let run = || {
            let mut tracker = CentroidTracker::default();
            frames
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    tracker
                        .track(f.clone(), i as u64)
                        .iter()
                        .map(|t| t.id)
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_reordered_detections_keep_identities() {
        let mut tracker = CentroidTracker::default();
        let first = tracker.track(vec![det(0.0, 0.0), det(300.0, 0.0)], 0);
        let second = tracker.track(vec![det(305.0, 0.0), det(5.0, 0.0)], 1);
        assert_eq!(second[0].id, first[1].id);
        assert_eq!(second[1].id, first[0].id);
    }

    #[test]
    fn test_previous_detection_claimed_once() {
        let mut tracker = CentroidTracker::default();
        let id = tracker.track(vec![det(0.0, 0.0)], 0)[0].id;
        let next = tracker.track(vec![det(10.0, 0.0), det(15.0, 0.0)], 1);
        assert_eq!(next[0].id, id);
        assert_ne!(next[1].id, id);
    }

    #[test]
    fn test_speed_unknown_until_min_samples() {
        let mut tracker = CentroidTracker::default();
        for frame in 0..5u64 {
            let faces = tracker.track(vec![det(frame as f64 * 10.0, 0.0)], frame);
            // frame N has produced N samples
            assert!(faces[0].speed.is_none(), "frame {frame}");
        }
        let faces = tracker.track(vec![det(50.0, 0.0)], 5);
        assert!(faces[0].speed.is_some());
    }

    #[test]
    fn test_horizontal_motion_speed_per_second() {
        let mut tracker = CentroidTracker::default();
        let mut last = None;
        for frame in 0..=5u64 {
            last = Some(tracker.track(vec![det(frame as f64 * 10.0, 0.0)], frame));
        }
        let face = &last.unwrap()[0];
        assert_relative_eq!(face.speed.unwrap(), 300.0, epsilon = 1e-9);
        assert_relative_eq!(tracker.speed_of(face.id).unwrap(), 300.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stationary_face_speed_is_zero_not_unknown() {
        let mut tracker = CentroidTracker::default();
        let mut speed = None;
        for frame in 0..=5u64 {
            speed = tracker.track(vec![det(40.0, 40.0)], frame)[0].speed;
        }
        assert_eq!(speed, Some(0.0));
    }

    #[rstest]
    #[case::rightward(10.0, 0.0, 0.0)]
    #[case::downward(0.0, 10.0, std::f64::consts::FRAC_PI_2)]
    #[case::leftward(-10.0, 0.0, std::f64::consts::PI)]
    fn test_heading_follows_latest_motion(#[case] dx: f64, #[case] dy: f64, #[case] expected: f64) {
        let mut tracker = CentroidTracker::default();
        let first = &tracker.track(vec![det(200.0, 200.0)], 0)[0];
        assert!(first.heading.is_none());

        let face = &tracker.track(vec![det(200.0 + dx, 200.0 + dy)], 1)[0];
        assert_relative_eq!(face.heading.unwrap(), expected, epsilon = 1e-9);
        assert_eq!(tracker.heading_of(face.id), face.heading);
    }

    #[test]
    fn test_heading_kept_while_stationary() {
        let mut tracker = CentroidTracker::default();
        tracker.track(vec![det(0.0, 0.0)], 0);
        tracker.track(vec![det(0.0, 10.0)], 1);
        let face = &tracker.track(vec![det(0.0, 10.0)], 2)[0];
        assert_relative_eq!(face.heading.unwrap(), std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn test_gap_frames_divide_displacement() {
        let mut tracker = CentroidTracker::new(TrackerParams {
            min_samples: 1,
            ..TrackerParams::default()
        });
        tracker.track(vec![det(0.0, 0.0)], 0);
        tracker.track(vec![], 1);
        tracker.track(vec![], 2);
        let face = &tracker.track(vec![det(30.0, 0.0)], 3)[0];
        // 30 px over 3 frames = 10 px/frame = 300 px/s
        assert_relative_eq!(face.speed.unwrap(), 300.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stale_identity_evicted_and_replaced() {
        let mut tracker = CentroidTracker::default();
        let id = tracker.track(vec![det(0.0, 0.0)], 0)[0].id;
        for frame in 1..=31 {
            tracker.track(vec![], frame);
        }
        assert_eq!(tracker.tracked_count(), 0);
        assert!(tracker.speed_of(id).is_none());

        let again = tracker.track(vec![det(0.0, 0.0)], 32);
        assert_ne!(again[0].id, id);
    }

    #[test]
    fn test_identity_survives_up_to_stale_threshold() {
        let mut tracker = CentroidTracker::default();
        let id = tracker.track(vec![det(0.0, 0.0)], 0)[0].id;
        for frame in 1..30 {
            tracker.track(vec![], frame);
        }
        assert_eq!(tracker.tracked_count(), 1);
        let again = tracker.track(vec![det(5.0, 0.0)], 30);
        assert_eq!(again[0].id, id);
    }

    #[test]
    fn test_unmatched_identity_evicted_while_others_seen() {
        let mut tracker = CentroidTracker::default();
        tracker.track(vec![det(0.0, 0.0), det(500.0, 0.0)], 0);
        for frame in 1..=31 {
            tracker.track(vec![det(500.0, 0.0)], frame);
        }
        assert_eq!(tracker.tracked_count(), 1);
    }

    #[test]
    fn test_empty_frame_is_noop() {
        let mut tracker = CentroidTracker::default();
        assert!(tracker.track(vec![], 0).is_empty());
        assert_eq!(tracker.tracked_count(), 0);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut tracker = CentroidTracker::default();
        let id = tracker.track(vec![det(0.0, 0.0)], 0)[0].id;
        tracker.reset();
        assert_eq!(tracker.tracked_count(), 0);
        let again = tracker.track(vec![det(0.0, 0.0)], 1);
        assert_ne!(again[0].id, id);
    }

    #[test]
    fn test_non_finite_box_yields_no_sample() {
        let mut tracker = CentroidTracker::new(TrackerParams {
            min_samples: 1,
            ..TrackerParams::default()
        });
        tracker.track(vec![det(0.0, 0.0)], 0);
        // NaN centroid never matches, so a new identity is minted without a sample
        let faces = tracker.track(vec![det(f64::NAN, 0.0)], 1);
        assert!(faces[0].speed.is_none());
    }

    // ── Strategy comparison ──────────────────────────────────────────

    // Previous centroids at x=25 (A) and x=85 (B). Current centroids at
    // x=60 and x=90. Scanning in order, the first detection takes B
    // (distance 25) leaving A for the second: a swap. Global nearest
    // pairs B with the x=90 detection first (distance 5).
    #[rstest]
    #[case::sequential(MatchStrategy::Sequential, true)]
    #[case::global_nearest(MatchStrategy::GlobalNearest, false)]
    fn test_crowded_faces_swap_only_when_sequential(
        #[case] strategy: MatchStrategy,
        #[case] swapped: bool,
    ) {
        let mut tracker = tracker_with(strategy);
        let first = tracker.track(vec![det(0.0, 0.0), det(60.0, 0.0)], 0);
        let (a, b) = (first[0].id, first[1].id);

        let second = tracker.track(vec![det(35.0, 0.0), det(65.0, 0.0)], 1);
        if swapped {
            assert_eq!((second[0].id, second[1].id), (b, a));
        } else {
            assert_eq!((second[0].id, second[1].id), (a, b));
        }
    }

    #[test]
    fn test_sequential_match_tie_goes_to_first() {
        let previous = [BoundingBox::new(0.0, 0.0, 10.0, 10.0), BoundingBox::new(20.0, 0.0, 10.0, 10.0)];
        let current = [BoundingBox::new(10.0, 0.0, 10.0, 10.0)];
        assert_eq!(sequential_match(&previous, &current, 100.0), vec![Some(0)]);
    }
}
