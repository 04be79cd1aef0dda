#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Background emotion sampler that feeds the level's mood-driven content.
//!
//! The sampler is ticked from the simulation loop. On a fixed frame cadence it
//! hands one capture job to the rayon pool, never more than one at a time, and
//! the job appends whatever faces it classified to a shared buffer. The loop
//! later drains that buffer through [`MoodSource::dominant_emotion`].

mod vision;

pub use vision::{Frame, RegionOfInterest, Vision, VisionError};

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use moodscroll_core::{strongest, EmotionLabel, EmotionSample, MoodSource};

const DEFAULT_CAPTURE_INTERVAL: u64 = 30;

/// Configuration parameters required to construct the sampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    capture_interval: u64,
}

impl Config {
    /// Creates a configuration that captures every `capture_interval` frames.
    /// Zero disables capturing.
    #[must_use]
    pub const fn new(capture_interval: u64) -> Self {
        Self { capture_interval }
    }

    /// Number of frames between capture attempts.
    #[must_use]
    pub const fn capture_interval(&self) -> u64 {
        self.capture_interval
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_INTERVAL)
    }
}

/// What a call to [`EmotionSampler::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame is not on the capture cadence.
    Waiting,
    /// The frame is on the cadence but the previous job is still running.
    Busy,
    /// A capture job was handed to the worker pool.
    Launched,
}

/// Clears the in-flight flag when the capture job ends, however it ends.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Samples the player's emotions off the simulation thread.
pub struct EmotionSampler<V: Vision> {
    vision: Arc<V>,
    samples: Arc<Mutex<Vec<EmotionSample>>>,
    in_flight: Arc<AtomicBool>,
    capture_interval: u64,
    frame: u64,
}

impl<V: Vision> EmotionSampler<V> {
    /// Creates a sampler driving the provided vision backend.
    #[must_use]
    pub fn new(vision: V, config: Config) -> Self {
        Self {
            vision: Arc::new(vision),
            samples: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicBool::new(false)),
            capture_interval: config.capture_interval,
            frame: 0,
        }
    }

    /// Vision backend shared with the capture job.
    #[must_use]
    pub fn vision(&self) -> &V {
        &self.vision
    }

    /// Number of frames ticked so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Reports whether a capture job is currently running.
    #[must_use]
    pub fn is_sampling(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Number of samples waiting to be drained.
    #[must_use]
    pub fn buffered(&self) -> usize {
        lock(&self.samples).len()
    }

    /// Advances the frame counter and launches a capture job when one is due.
    ///
    /// Never blocks on the running job. The in-flight flag is claimed before
    /// the job is spawned, so two ticks can never both launch.
    pub fn tick(&mut self) -> TickOutcome {
        self.frame = self.frame.wrapping_add(1);
        if self.capture_interval == 0 || self.frame % self.capture_interval != 0 {
            return TickOutcome::Waiting;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(frame = self.frame, "previous emotion capture still running");
            return TickOutcome::Busy;
        }

        let guard = InFlight(Arc::clone(&self.in_flight));
        let backend = Arc::clone(&self.vision);
        let samples = Arc::clone(&self.samples);
        rayon::spawn(move || {
            let _guard = guard;
            match panic::catch_unwind(AssertUnwindSafe(|| vision::observe(&*backend))) {
                Ok(observed) if observed.is_empty() => {}
                Ok(observed) => {
                    let count = observed.len();
                    lock(&samples).extend(observed);
                    tracing::debug!(count, "buffered emotion samples");
                }
                Err(_) => tracing::error!("vision backend panicked during capture"),
            }
        });
        TickOutcome::Launched
    }
}

impl<V: Vision> MoodSource for EmotionSampler<V> {
    fn dominant_emotion(&self) -> EmotionLabel {
        let mut samples = lock(&self.samples);
        let label = aggregate(&samples);
        tracing::debug!(samples = samples.len(), %label, "drained emotion buffer");
        samples.clear();
        label
    }
}

fn lock(samples: &Mutex<Vec<EmotionSample>>) -> MutexGuard<'_, Vec<EmotionSample>> {
    samples.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Label with the highest mean intensity. Labels a sample did not score count as zero.
fn aggregate(samples: &[EmotionSample]) -> EmotionLabel {
    if samples.is_empty() {
        return EmotionLabel::Neutral;
    }
    let count = samples.len() as f32;
    strongest(EmotionLabel::ALL.into_iter().map(|label| {
        let total: f32 = samples
            .iter()
            .map(|sample| sample.scores().get(label))
            .sum();
        (label, total / count)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodscroll_core::EmotionScores;

    struct NoCamera;

    impl Vision for NoCamera {
        fn capture_frame(&self) -> Result<Frame, VisionError> {
            Err(VisionError::CameraUnavailable("no device".into()))
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

    fn sample(scores: &[(EmotionLabel, f32)]) -> EmotionSample {
        EmotionSample::from_scores(scores.iter().copied().collect())
    }

    fn buffer(sampler: &EmotionSampler<NoCamera>, samples: Vec<EmotionSample>) {
        lock(&sampler.samples).extend(samples);
    }

    #[test]
    fn mean_intensity_picks_the_dominant_label() {
        let sampler = EmotionSampler::new(NoCamera, Config::default());
        buffer(
            &sampler,
            vec![
                sample(&[(EmotionLabel::Happy, 0.8), (EmotionLabel::Sad, 0.2)]),
                sample(&[(EmotionLabel::Happy, 0.6), (EmotionLabel::Sad, 0.4)]),
            ],
        );
        assert_eq!(sampler.dominant_emotion(), EmotionLabel::Happy);
    }

    #[test]
    fn absent_labels_pull_the_mean_down() {
        let sampler = EmotionSampler::new(NoCamera, Config::default());
        buffer(
            &sampler,
            vec![
                sample(&[(EmotionLabel::Angry, 0.9)]),
                sample(&[(EmotionLabel::Sad, 0.6)]),
                sample(&[(EmotionLabel::Sad, 0.6)]),
            ],
        );
        assert_eq!(sampler.dominant_emotion(), EmotionLabel::Sad);
    }

    #[test]
    fn reading_the_mood_drains_the_buffer() {
        let sampler = EmotionSampler::new(NoCamera, Config::default());
        buffer(&sampler, vec![sample(&[(EmotionLabel::Fear, 0.7)])]);

        assert_eq!(sampler.dominant_emotion(), EmotionLabel::Fear);
        assert_eq!(sampler.buffered(), 0);
        assert_eq!(sampler.dominant_emotion(), EmotionLabel::Neutral);
    }

    #[test]
    fn ties_resolve_in_canonical_order() {
        let sampler = EmotionSampler::new(NoCamera, Config::default());
        buffer(
            &sampler,
            vec![sample(&[(EmotionLabel::Surprise, 0.5), (EmotionLabel::Angry, 0.5)])],
        );
        assert_eq!(sampler.dominant_emotion(), EmotionLabel::Angry);
    }

    #[test]
    fn ticks_wait_for_the_capture_interval() {
        let mut sampler = EmotionSampler::new(NoCamera, Config::new(3));
        assert_eq!(sampler.tick(), TickOutcome::Waiting);
        assert_eq!(sampler.tick(), TickOutcome::Waiting);
        assert_eq!(sampler.tick(), TickOutcome::Launched);
        assert_eq!(sampler.frame(), 3);
    }

    #[test]
    fn zero_interval_never_launches() {
        let mut sampler = EmotionSampler::new(NoCamera, Config::new(0));
        for _ in 0..100 {
            assert_eq!(sampler.tick(), TickOutcome::Waiting);
        }
        assert!(!sampler.is_sampling());
    }

    #[test]
    fn poisoned_buffer_is_recovered() {
        let sampler = EmotionSampler::new(NoCamera, Config::default());
        let samples = Arc::clone(&sampler.samples);
        let _ = std::thread::spawn(move || {
            let _held = samples.lock();
            panic!("poison the buffer");
        })
        .join();

        buffer(&sampler, vec![sample(&[(EmotionLabel::Disgust, 1.0)])]);
        assert_eq!(sampler.dominant_emotion(), EmotionLabel::Disgust);
    }
}
