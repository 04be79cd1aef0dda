use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc::{self, Receiver, Sender},
        Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use moodscroll_core::{EmotionLabel, EmotionScores, MoodSource};
use moodscroll_system_emotion::{
    Config, EmotionSampler, Frame, RegionOfInterest, TickOutcome, Vision, VisionError,
};

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for the sampler");
        thread::sleep(Duration::from_millis(1));
    }
}

fn wait_idle<V: Vision>(sampler: &EmotionSampler<V>) {
    wait_until(|| !sampler.is_sampling());
}

fn scores(entries: &[(EmotionLabel, f32)]) -> EmotionScores {
    entries.iter().copied().collect()
}

/// Backend whose captures block until the test releases them.
struct GatedCamera {
    gate: Mutex<Receiver<()>>,
    captures: AtomicUsize,
}

impl GatedCamera {
    fn new() -> (Self, Sender<()>) {
        let (release, gate) = mpsc::channel();
        let camera = Self {
            gate: Mutex::new(gate),
            captures: AtomicUsize::new(0),
        };
        (camera, release)
    }
}

impl Vision for GatedCamera {
    fn capture_frame(&self) -> Result<Frame, VisionError> {
        let _ = self.captures.fetch_add(1, Ordering::SeqCst);
        let gate = self
            .gate
            .lock()
            .map_err(|_| VisionError::FrameRead("gate poisoned".into()))?;
        gate.recv()
            .map_err(|_| VisionError::FrameRead("gate closed".into()))?;
        Ok(Frame::new(1, 1, vec![0, 0, 0]))
    }

    fn detect_faces(&self, _frame: &Frame) -> Result<Vec<RegionOfInterest>, VisionError> {
        Ok(vec![RegionOfInterest::new(0, 0, 1, 1)])
    }

    fn classify_region(
        &self,
        _frame: &Frame,
        _region: &RegionOfInterest,
    ) -> Result<EmotionScores, VisionError> {
        Ok(scores(&[(EmotionLabel::Surprise, 0.9)]))
    }
}

/// Backend that reports a fixed list of faces, some of which fail to classify.
struct ScriptedFaces {
    faces: Vec<Result<EmotionScores, VisionError>>,
    detection: Result<(), VisionError>,
}

impl Vision for ScriptedFaces {
    fn capture_frame(&self) -> Result<Frame, VisionError> {
        Ok(Frame::new(640, 480, Vec::new()))
    }

    fn detect_faces(&self, _frame: &Frame) -> Result<Vec<RegionOfInterest>, VisionError> {
        self.detection.clone()?;
        Ok((0..self.faces.len() as u32)
            .map(|index| RegionOfInterest::new(index * 64, 0, 64, 64))
            .collect())
    }

    fn classify_region(
        &self,
        _frame: &Frame,
        region: &RegionOfInterest,
    ) -> Result<EmotionScores, VisionError> {
        self.faces[(region.x() / 64) as usize].clone()
    }
}

struct BrokenCamera;

impl Vision for BrokenCamera {
    fn capture_frame(&self) -> Result<Frame, VisionError> {
        Err(VisionError::CameraUnavailable("device busy".into()))
    }

    fn detect_faces(&self, _frame: &Frame) -> Result<Vec<RegionOfInterest>, VisionError> {
        unreachable!("no frame was captured")
    }

    fn classify_region(
        &self,
        _frame: &Frame,
        _region: &RegionOfInterest,
    ) -> Result<EmotionScores, VisionError> {
        unreachable!("no frame was captured")
    }
}

struct PanickingCamera;

impl Vision for PanickingCamera {
    fn capture_frame(&self) -> Result<Frame, VisionError> {
        panic!("driver crashed");
    }

    fn detect_faces(&self, _frame: &Frame) -> Result<Vec<RegionOfInterest>, VisionError> {
        Ok(Vec::new())
    }

    fn classify_region(
        &self,
        _frame: &Frame,
        _region: &RegionOfInterest,
    ) -> Result<EmotionScores, VisionError> {
        Ok(EmotionScores::new())
    }
}

#[test]
fn at_most_one_capture_runs_at_a_time() {
    let (camera, release) = GatedCamera::new();
    let mut sampler = EmotionSampler::new(camera, Config::new(1));

    assert_eq!(sampler.tick(), TickOutcome::Launched);
    wait_until(|| sampler.vision().captures.load(Ordering::SeqCst) == 1);

    for _ in 0..50 {
        assert_eq!(sampler.tick(), TickOutcome::Busy);
    }
    assert!(sampler.is_sampling());
    assert_eq!(sampler.vision().captures.load(Ordering::SeqCst), 1);

    release.send(()).expect("capture is waiting");
    wait_idle(&sampler);
    assert_eq!(sampler.buffered(), 1);

    assert_eq!(sampler.tick(), TickOutcome::Launched);
    release.send(()).expect("capture is waiting");
    wait_idle(&sampler);
    assert_eq!(sampler.vision().captures.load(Ordering::SeqCst), 2);
    assert_eq!(sampler.dominant_emotion(), EmotionLabel::Surprise);
}

#[test]
fn draining_does_not_wait_for_a_running_capture() {
    let (camera, release) = GatedCamera::new();
    let mut sampler = EmotionSampler::new(camera, Config::new(1));

    assert_eq!(sampler.tick(), TickOutcome::Launched);
    assert_eq!(sampler.dominant_emotion(), EmotionLabel::Neutral);

    release.send(()).expect("capture is waiting");
    wait_idle(&sampler);
}

#[test]
fn one_capture_aggregates_every_face() {
    let vision = ScriptedFaces {
        faces: vec![
            Ok(scores(&[(EmotionLabel::Happy, 0.8), (EmotionLabel::Sad, 0.2)])),
            Ok(scores(&[(EmotionLabel::Happy, 0.6), (EmotionLabel::Sad, 0.4)])),
        ],
        detection: Ok(()),
    };
    let mut sampler = EmotionSampler::new(vision, Config::new(1));

    assert_eq!(sampler.tick(), TickOutcome::Launched);
    wait_idle(&sampler);

    assert_eq!(sampler.buffered(), 2);
    assert_eq!(sampler.dominant_emotion(), EmotionLabel::Happy);
    assert_eq!(sampler.dominant_emotion(), EmotionLabel::Neutral);
}

#[test]
fn failed_face_is_skipped_without_losing_the_batch() {
    let vision = ScriptedFaces {
        faces: vec![
            Ok(scores(&[(EmotionLabel::Sad, 0.7)])),
            Err(VisionError::Classification("face too small".into())),
            Ok(scores(&[(EmotionLabel::Sad, 0.5), (EmotionLabel::Fear, 0.4)])),
        ],
        detection: Ok(()),
    };
    let mut sampler = EmotionSampler::new(vision, Config::new(1));

    assert_eq!(sampler.tick(), TickOutcome::Launched);
    wait_idle(&sampler);

    assert_eq!(sampler.buffered(), 2);
    assert_eq!(sampler.dominant_emotion(), EmotionLabel::Sad);
}

#[test]
fn detection_failure_yields_no_sample() {
    let vision = ScriptedFaces {
        faces: vec![Ok(scores(&[(EmotionLabel::Happy, 1.0)]))],
        detection: Err(VisionError::FaceDetection("model missing".into())),
    };
    let mut sampler = EmotionSampler::new(vision, Config::new(1));

    assert_eq!(sampler.tick(), TickOutcome::Launched);
    wait_idle(&sampler);

    assert_eq!(sampler.buffered(), 0);
    assert_eq!(sampler.dominant_emotion(), EmotionLabel::Neutral);
}

#[test]
fn camera_failure_frees_the_sampler_for_the_next_cadence() {
    let mut sampler = EmotionSampler::new(BrokenCamera, Config::new(2));

    assert_eq!(sampler.tick(), TickOutcome::Waiting);
    assert_eq!(sampler.tick(), TickOutcome::Launched);
    wait_idle(&sampler);
    assert_eq!(sampler.buffered(), 0);

    assert_eq!(sampler.tick(), TickOutcome::Waiting);
    assert_eq!(sampler.tick(), TickOutcome::Launched);
    wait_idle(&sampler);
    assert_eq!(sampler.dominant_emotion(), EmotionLabel::Neutral);
}

#[test]
fn panicking_backend_releases_the_in_flight_flag() {
    let mut sampler = EmotionSampler::new(PanickingCamera, Config::new(1));

    assert_eq!(sampler.tick(), TickOutcome::Launched);
    wait_idle(&sampler);

    assert_eq!(sampler.buffered(), 0);
    assert_eq!(sampler.tick(), TickOutcome::Launched);
    wait_idle(&sampler);
}
