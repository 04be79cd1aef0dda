//! Boundary between the sampler and the camera and classifier backends.

use moodscroll_core::{EmotionSample, EmotionScores};
use thiserror::Error;

/// Failures reported by a vision backend. None of them are fatal to the sampler.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VisionError {
    /// The capture device could not be opened.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
    /// The device was open but returned no usable frame.
    #[error("failed to read frame: {0}")]
    FrameRead(String),
    /// Face detection could not process the frame.
    #[error("face detection failed: {0}")]
    FaceDetection(String),
    /// A single region could not be classified.
    #[error("classification failed: {0}")]
    Classification(String),
}

/// Captured image in row-major RGB8 layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Wraps raw pixel data captured by a backend.
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw pixel bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Rectangle around a detected face, in frame pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionOfInterest {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl RegionOfInterest {
    /// Creates a region anchored at its upper-left corner.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Top edge.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Camera plus face detector plus per-face emotion classifier.
///
/// Implementations are called from a worker thread and may block.
pub trait Vision: Send + Sync + 'static {
    /// Acquires one frame from the capture device.
    fn capture_frame(&self) -> Result<Frame, VisionError>;

    /// Locates faces in a frame.
    fn detect_faces(&self, frame: &Frame) -> Result<Vec<RegionOfInterest>, VisionError>;

    /// Scores every emotion label for one face.
    fn classify_region(
        &self,
        frame: &Frame,
        region: &RegionOfInterest,
    ) -> Result<EmotionScores, VisionError>;
}

/// Runs the capture, detection, and classification pipeline once.
///
/// Every failure is logged. Frame and detection failures yield no samples;
/// a region that fails to classify is skipped while the rest of the batch
/// still contributes.
pub(crate) fn observe<V: Vision + ?Sized>(vision: &V) -> Vec<EmotionSample> {
    let frame = match vision.capture_frame() {
        Ok(frame) => frame,
        Err(error) => {
            tracing::warn!(%error, "skipping emotion sample");
            return Vec::new();
        }
    };

    let regions = match vision.detect_faces(&frame) {
        Ok(regions) => regions,
        Err(error) => {
            tracing::warn!(%error, "skipping emotion sample");
            return Vec::new();
        }
    };

    regions
        .iter()
        .enumerate()
        .filter_map(|(index, region)| match vision.classify_region(&frame, region) {
            Ok(scores) => Some(EmotionSample::from_scores(scores)),
            Err(error) => {
                tracing::warn!(%error, region = index, "skipping face");
                None
            }
        })
        .collect()
}
