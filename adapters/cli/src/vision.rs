//! Stand-in camera that reports a scripted sequence of moods.

use std::sync::atomic::{AtomicUsize, Ordering};

use moodscroll_core::{EmotionLabel, EmotionScores};
use moodscroll_system_emotion::{Frame, RegionOfInterest, Vision, VisionError};

const REPORTED_INTENSITY: f32 = 0.9;
const BACKGROUND_INTENSITY: f32 = 0.1;

/// Reports one face per capture, cycling through the configured moods.
#[derive(Debug)]
pub(crate) struct ScriptedVision {
    moods: Vec<EmotionLabel>,
    attached: bool,
    next: AtomicUsize,
}

impl ScriptedVision {
    pub(crate) fn new(moods: Vec<EmotionLabel>) -> Self {
        Self {
            moods,
            attached: true,
            next: AtomicUsize::new(0),
        }
    }

    /// A camera that is never available.
    pub(crate) fn detached() -> Self {
        Self {
            moods: Vec::new(),
            attached: false,
            next: AtomicUsize::new(0),
        }
    }
}

impl Vision for ScriptedVision {
    fn capture_frame(&self) -> Result<Frame, VisionError> {
        if !self.attached {
            return Err(VisionError::CameraUnavailable("no camera attached".into()));
        }
        Ok(Frame::new(0, 0, Vec::new()))
    }

    fn detect_faces(&self, _frame: &Frame) -> Result<Vec<RegionOfInterest>, VisionError> {
        if self.moods.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![RegionOfInterest::new(0, 0, 0, 0)])
    }

    fn classify_region(
        &self,
        _frame: &Frame,
        _region: &RegionOfInterest,
    ) -> Result<EmotionScores, VisionError> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        let mood = self
            .moods
            .get(index % self.moods.len().max(1))
            .copied()
            .ok_or_else(|| VisionError::Classification("no scripted moods".into()))?;

        Ok(EmotionLabel::ALL
            .into_iter()
            .map(|label| {
                let intensity = if label == mood {
                    REPORTED_INTENSITY
                } else {
                    BACKGROUND_INTENSITY
                };
                (label, intensity)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(vision: &ScriptedVision) -> EmotionLabel {
        let frame = vision.capture_frame().expect("attached camera");
        let faces = vision.detect_faces(&frame).expect("faces");
        vision
            .classify_region(&frame, &faces[0])
            .expect("scores")
            .dominant()
    }

    #[test]
    fn moods_cycle_per_capture() {
        let vision = ScriptedVision::new(vec![EmotionLabel::Happy, EmotionLabel::Angry]);
        assert_eq!(classify(&vision), EmotionLabel::Happy);
        assert_eq!(classify(&vision), EmotionLabel::Angry);
        assert_eq!(classify(&vision), EmotionLabel::Happy);
    }

    #[test]
    fn detached_camera_fails_to_capture() {
        let vision = ScriptedVision::detached();
        assert!(matches!(
            vision.capture_frame(),
            Err(VisionError::CameraUnavailable(_))
        ));
    }
}
