pub mod classifier;
pub mod ffmpeg;
pub mod frames;

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::error::{AppError, Result};
use classifier::{Classifier, FrameBatch};
use frames::{extract_frames, ExtractOptions, VideoDecoder};

/// Outcome label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Real,
    Deepfake,
}

/// Result of classifying one video
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub verdict: Verdict,
    pub probability: f32,
    pub fake_probability_percent: f32,
}

impl Detection {
    /// Apply the decision rule `probability > threshold => deepfake`
    pub fn from_probability(probability: f32, threshold: f32) -> Self {
        let verdict = if probability > threshold {
            Verdict::Deepfake
        } else {
            Verdict::Real
        };
        Self {
            verdict,
            probability,
            fake_probability_percent: probability * 100.0,
        }
    }

    pub fn is_fake(&self) -> bool {
        self.verdict == Verdict::Deepfake
    }
}

/// Frame sampling plus classification for uploaded videos
#[derive(Clone)]
pub struct Detector {
    decoder: Arc<dyn VideoDecoder>,
    classifier: Arc<dyn Classifier>,
    options: ExtractOptions,
    threshold: f32,
}

impl Detector {
    pub fn new(
        decoder: Arc<dyn VideoDecoder>,
        classifier: Arc<dyn Classifier>,
        options: ExtractOptions,
        threshold: f32,
    ) -> Self {
        Self {
            decoder,
            classifier,
            options,
            threshold,
        }
    }

    /// Build with sampling parameters taken from the configuration
    pub fn from_config(
        config: &Config,
        decoder: Arc<dyn VideoDecoder>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        let options = ExtractOptions {
            target_count: config.frame_count,
            size: config.frame_size,
            channel_order: config.channel_order,
        };
        Self::new(decoder, classifier, options, config.detection_threshold)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn input_shape(&self) -> classifier::InputShape {
        self.classifier.input_shape()
    }

    /// Sample frames from the video at `path` and classify them
    ///
    /// Fails with `InsufficientFrames` without calling the classifier when
    /// fewer than the configured number of frames could be decoded.
    pub async fn detect(&self, path: PathBuf) -> Result<Detection> {
        let decoder = self.decoder.clone();
        let options = self.options;

        let frames = tokio::task::spawn_blocking(move || -> Result<_> {
            let mut source = decoder.open(&path).map_err(AppError::VideoDecode)?;
            Ok(extract_frames(source.as_mut(), &options))
        })
        .await??;

        if frames.len() < options.target_count {
            tracing::info!(
                "Not enough frames for prediction: {}/{}",
                frames.len(),
                options.target_count
            );
            return Err(AppError::InsufficientFrames {
                found: frames.len(),
                required: options.target_count,
            });
        }

        let batch = FrameBatch::new(frames);
        batch.check_shape(self.classifier.input_shape())?;

        let probability = self.classifier.predict(batch).await?;
        let detection = Detection::from_probability(probability, self.threshold);

        tracing::info!(
            "Detection complete: {:?} (p={:.4})",
            detection.verdict,
            probability
        );
        Ok(detection)
    }
}
