use std::time::Instant;

use crossbeam_channel::Receiver;

use crate::narration::domain::speed_category::SpeedThresholds;
use crate::playback::domain::playback_event::PlaybackEvent;
use crate::playback::domain::sequencer_state::SequencerState;
use crate::playback::playback_sequencer::{FaceCue, PlaybackSequencer};
use crate::shared::detection::{Detection, NEUTRAL_EXPRESSION};
use crate::shared::frame::Frame;
use crate::tracking::domain::face_id::FaceId;
use crate::tracking::domain::face_tracker::{primary_face, FaceTracker};

use super::face_annotation::FaceAnnotation;
use super::session_logger::SessionLogger;

/// Outcome of one `process_frame` call.
#[derive(Clone, Debug)]
pub struct FrameReport {
    pub frame_index: u64,
    pub annotations: Vec<FaceAnnotation>,
    pub primary: Option<FaceId>,
    pub state: SequencerState,
}

/// All mutable state of a running narration, owned by the frame loop.
///
/// Each frame: apply collaborator events that arrived since the last frame,
/// track the new detections, then let the sequencer decide what to say about
/// the primary face.
pub struct NarrationSession {
    tracker: Box<dyn FaceTracker>,
    sequencer: PlaybackSequencer,
    events: Receiver<PlaybackEvent>,
    logger: Box<dyn SessionLogger>,
    thresholds: SpeedThresholds,
    frame_index: u64,
}

impl NarrationSession {
    pub fn new(
        tracker: Box<dyn FaceTracker>,
        sequencer: PlaybackSequencer,
        events: Receiver<PlaybackEvent>,
        logger: Box<dyn SessionLogger>,
        thresholds: SpeedThresholds,
    ) -> Self {
        Self {
            tracker,
            sequencer,
            events,
            logger,
            thresholds,
            frame_index: 0,
        }
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn sequencer(&self) -> &PlaybackSequencer {
        &self.sequencer
    }

    pub fn tracked_count(&self) -> usize {
        self.tracker.tracked_count()
    }

    /// `capture` supplies the frame sent to the remote phrase service; it is
    /// only called when a remote batch is due.
    pub fn process_frame(
        &mut self,
        detections: Vec<Detection>,
        now: Instant,
        capture: &mut dyn FnMut() -> Option<Frame>,
    ) -> FrameReport {
        let started = Instant::now();
        self.drain_events(now);

        let faces = self.tracker.track(detections, self.frame_index);
        let tracked_at = Instant::now();

        let primary = primary_face(&faces);
        let cue = primary.map(|face| FaceCue {
            emotion: face
                .detection
                .dominant_expression()
                .unwrap_or(NEUTRAL_EXPRESSION)
                .to_string(),
            speed: face.speed,
        });
        let primary_id = primary.map(|face| face.id);

        self.sequencer.tick(now, cue.as_ref(), capture);
        let narrated_at = Instant::now();

        let annotations = faces
            .iter()
            .map(|face| FaceAnnotation::from_tracked(face, &self.thresholds, Some(face.id) == primary_id))
            .collect();

        self.logger.frame(self.frame_index, faces.len());
        self.logger
            .timing("track", (tracked_at - started).as_secs_f64() * 1000.0);
        self.logger
            .timing("narrate", (narrated_at - tracked_at).as_secs_f64() * 1000.0);
        self.logger
            .metric("tracked_faces", self.tracker.tracked_count() as f64);

        let report = FrameReport {
            frame_index: self.frame_index,
            annotations,
            primary: primary_id,
            state: self.sequencer.state(),
        };
        self.frame_index += 1;
        report
    }

    /// End the session: silence playback, forget every identity and discard
    /// pending events. The session can be reused afterwards.
    pub fn stop(&mut self) {
        self.sequencer.stop();
        self.tracker.reset();
        let dropped = self.events.try_iter().count();
        if dropped > 0 {
            log::debug!("Discarded {dropped} pending playback event(s)");
        }
        self.logger.info(&format!("Session stopped after {} frames", self.frame_index));
        self.frame_index = 0;
    }

    pub fn summary(&self) {
        self.logger.summary();
    }

    fn drain_events(&mut self, now: Instant) {
        while let Ok(event) = self.events.try_recv() {
            self.sequencer.handle_event(event, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::domain::phrase_catalog::PhraseCatalog;
    use crate::narration::domain::phrase_selector::PhraseSelector;
    use crate::playback::domain::audio_player::{AudioPlayer, PhraseOrigin};
    use crate::playback::domain::phrase_display::NullPhraseDisplay;
    use crate::playback::domain::remote_phrases::RemoteBatchRequester;
    use crate::playback::playback_sequencer::SequencerParams;
    use crate::session::session_logger::NullSessionLogger;
    use crate::shared::bounding_box::BoundingBox;
    use crate::tracking::infrastructure::centroid_tracker::{CentroidTracker, TrackerParams};
    use crossbeam_channel::{unbounded, Sender};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Plays = Arc<Mutex<Vec<(String, PhraseOrigin)>>>;

    struct RecordingAudio(Plays);

    impl AudioPlayer for RecordingAudio {
        fn play(
            &mut self,
            phrase: &str,
            origin: PhraseOrigin,
            _generation: u64,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.0.lock().unwrap().push((phrase.to_string(), origin));
            Ok(())
        }

        fn stop(&mut self) {}
    }

    /// Answers every request immediately through the event channel.
    struct InstantRemote {
        events: Sender<PlaybackEvent>,
        phrases: Vec<String>,
    }

    impl RemoteBatchRequester for InstantRemote {
        fn request(&mut self, _frame: Frame, generation: u64) {
            let _ = self.events.send(PlaybackEvent::RemoteBatch {
                generation,
                result: Ok(self.phrases.clone()),
            });
        }

        fn cancel(&mut self) {}
    }

    struct Harness {
        session: NarrationSession,
        plays: Plays,
        events: Sender<PlaybackEvent>,
    }

    fn harness() -> Harness {
        let (tx, rx) = unbounded();
        let plays: Plays = Arc::default();
        let catalog: PhraseCatalog = serde_json::from_str(
            r#"{"happy": {"all": ["smile"]}, "sad": {"all": ["frown"]}, "neutral": {"all": ["calm"]}}"#,
        )
        .unwrap();
        let selector = PhraseSelector::new(catalog, SpeedThresholds::default(), 5)
            .with_rng(StdRng::seed_from_u64(3));
        let sequencer = PlaybackSequencer::new(
            SequencerParams {
                local_phrases_per_cycle: 1,
                inter_message_delay: Duration::from_millis(500),
            },
            selector,
            Box::new(RecordingAudio(plays.clone())),
            Box::new(NullPhraseDisplay),
            Box::new(InstantRemote {
                events: tx.clone(),
                phrases: vec!["from afar".to_string()],
            }),
        );
        let session = NarrationSession::new(
            Box::new(CentroidTracker::new(TrackerParams::default())),
            sequencer,
            rx,
            Box::new(NullSessionLogger),
            SpeedThresholds::default(),
        );
        Harness {
            session,
            plays,
            events: tx,
        }
    }

    fn face(x: f64, width: f64, emotion: &str) -> Detection {
        Detection::new(BoundingBox::new(x, 100.0, width, width)).with_expression(emotion, 0.9)
    }

    fn frame() -> Option<Frame> {
        Some(Frame::new(vec![0u8; 3], 1, 1, 3, 0))
    }

    #[test]
    fn test_empty_frame_stays_idle() {
        let mut h = harness();
        let report = h.session.process_frame(Vec::new(), Instant::now(), &mut frame);
        assert!(report.annotations.is_empty());
        assert!(report.primary.is_none());
        assert_eq!(report.state, SequencerState::Idle);
        assert_eq!(h.session.frame_index(), 1);
    }

    #[test]
    fn test_primary_face_drives_phrase_choice() {
        let mut h = harness();
        let report = h.session.process_frame(
            vec![face(0.0, 80.0, "happy"), face(400.0, 150.0, "sad")],
            Instant::now(),
            &mut frame,
        );

        assert_eq!(report.annotations.len(), 2);
        assert!(!report.annotations[0].primary);
        assert!(report.annotations[1].primary);
        assert_eq!(report.primary, Some(report.annotations[1].id));
        assert_eq!(report.state, SequencerState::PlayingLocal);
        assert_eq!(h.plays.lock().unwrap()[0].0, "frown");
    }

    #[test]
    fn test_face_without_expressions_uses_neutral() {
        let mut h = harness();
        let detection = Detection::new(BoundingBox::new(0.0, 0.0, 100.0, 100.0));
        h.session.process_frame(vec![detection], Instant::now(), &mut frame);
        assert_eq!(h.plays.lock().unwrap()[0].0, "calm");
    }

    #[test]
    fn test_identity_persists_across_frames() {
        let mut h = harness();
        let now = Instant::now();
        let first = h.session.process_frame(vec![face(0.0, 100.0, "happy")], now, &mut frame);
        let second = h.session.process_frame(vec![face(5.0, 100.0, "happy")], now, &mut frame);
        assert_eq!(first.annotations[0].id, second.annotations[0].id);
        assert_eq!(second.frame_index, 1);
    }

    #[test]
    fn test_events_drive_full_cycle() {
        let mut h = harness();
        let now = Instant::now();
        let faces = || vec![face(0.0, 100.0, "happy")];

        h.session.process_frame(faces(), now, &mut frame);
        let generation = h.session.sequencer().generation();
        h.events
            .send(PlaybackEvent::AudioFinished { generation })
            .unwrap();

        let report = h.session.process_frame(faces(), now, &mut frame);
        assert_eq!(report.state, SequencerState::WaitingAfterLocal);

        let later = now + Duration::from_millis(500);
        let report = h.session.process_frame(faces(), later, &mut frame);
        assert_eq!(report.state, SequencerState::FetchingRemoteBatch);

        // The remote answer was queued during the previous frame.
        let report = h.session.process_frame(faces(), later, &mut frame);
        assert_eq!(report.state, SequencerState::PlayingRemoteBatch);
        let plays = h.plays.lock().unwrap();
        assert_eq!(plays.last().unwrap(), &("from afar".to_string(), PhraseOrigin::Remote));
    }

    #[test]
    fn test_stop_resets_and_ignores_stale_events() {
        let mut h = harness();
        let now = Instant::now();
        h.session
            .process_frame(vec![face(0.0, 100.0, "happy")], now, &mut frame);
        let stale = h.session.sequencer().generation();

        h.session.stop();
        assert_eq!(h.session.frame_index(), 0);
        assert_eq!(h.session.tracked_count(), 0);
        assert_eq!(h.session.sequencer().state(), SequencerState::Idle);

        h.events
            .send(PlaybackEvent::AudioFinished { generation: stale })
            .unwrap();
        let report = h.session.process_frame(Vec::new(), now, &mut frame);
        assert_eq!(report.state, SequencerState::Idle);
    }
}
