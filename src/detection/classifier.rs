//! Adapter for the externally trained deepfake classifier
//!
//! The model is served over a TensorFlow-Serving style REST API. It is checked
//! once at startup and then called once per detection with a single batch.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::frames::Frame;

/// Classifier failures
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Input shape mismatch: expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        expected: InputShape,
        found: InputShape,
    },

    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),
}

/// `frames x height x width x channels` of one batch item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputShape {
    pub frames: usize,
    pub height: u32,
    pub width: u32,
    pub channels: u32,
}

impl InputShape {
    pub fn rgb(frames: usize, size: u32) -> Self {
        Self {
            frames,
            height: size,
            width: size,
            channels: 3,
        }
    }
}

/// One batch item: the sampled frames of one video
#[derive(Debug, Clone)]
pub struct FrameBatch {
    pub frames: Vec<Frame>,
}

impl FrameBatch {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// Shape of the batch, or `None` if the frames disagree on size
    pub fn shape(&self) -> Option<InputShape> {
        let first = self.frames.first();
        let (height, width) = first.map(|f| (f.height, f.width)).unwrap_or((0, 0));
        let uniform = self.frames.iter().all(|f| {
            f.height == height && f.width == width && f.data.len() == (height * width * 3) as usize
        });
        uniform.then_some(InputShape {
            frames: self.frames.len(),
            height,
            width,
            channels: 3,
        })
    }

    /// Fail with `ShapeMismatch` unless the batch matches `expected`
    pub fn check_shape(&self, expected: InputShape) -> Result<(), ClassifierError> {
        let found = self.shape().unwrap_or(InputShape {
            frames: self.frames.len(),
            height: 0,
            width: 0,
            channels: 0,
        });
        if found != expected {
            return Err(ClassifierError::ShapeMismatch { expected, found });
        }
        Ok(())
    }
}

/// Boxed future returned by `Classifier::predict`
pub type PredictFuture<'a> =
    Pin<Box<dyn Future<Output = Result<f32, ClassifierError>> + Send + 'a>>;

/// Binary video classifier producing a fake-probability
pub trait Classifier: Send + Sync {
    /// Input shape the model was built for
    fn input_shape(&self) -> InputShape;

    /// Fake-probability in [0, 1] for one batch item
    fn predict(&self, batch: FrameBatch) -> PredictFuture<'_>;
}

#[derive(Debug, Deserialize)]
struct ModelStatusResponse {
    #[serde(default)]
    model_version_status: Vec<ModelVersionStatus>,
}

#[derive(Debug, Deserialize)]
struct ModelVersionStatus {
    state: String,
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<Vec<Vec<Vec<[f32; 3]>>>>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

/// Pull the single probability out of a predict response
fn probability_from(response: PredictResponse) -> Result<f32, ClassifierError> {
    let p = response
        .predictions
        .first()
        .and_then(|row| row.first())
        .copied()
        .ok_or_else(|| ClassifierError::InvalidResponse("empty predictions".to_string()))?;

    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(ClassifierError::InvalidResponse(format!(
            "probability out of range: {p}"
        )));
    }
    Ok(p)
}

/// Classifier behind a TensorFlow-Serving compatible endpoint
#[derive(Debug, Clone)]
pub struct ServingClassifier {
    client: reqwest::Client,
    model_url: String,
    shape: InputShape,
}

impl ServingClassifier {
    /// Connect to the model and confirm a version is `AVAILABLE`
    ///
    /// Called once at startup; an error here means no detection is possible.
    pub async fn load(
        model_url: &str,
        shape: InputShape,
        timeout: Duration,
    ) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        tracing::info!("Checking classifier model at {}", model_url);
        let status: ModelStatusResponse = client
            .get(model_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !status
            .model_version_status
            .iter()
            .any(|v| v.state.eq_ignore_ascii_case("AVAILABLE"))
        {
            return Err(ClassifierError::Unavailable(format!(
                "no AVAILABLE version at {model_url}"
            )));
        }

        tracing::info!("Classifier model ready (input {:?})", shape);
        Ok(Self {
            client,
            model_url: model_url.to_string(),
            shape,
        })
    }
}

impl Classifier for ServingClassifier {
    fn input_shape(&self) -> InputShape {
        self.shape
    }

    fn predict(&self, batch: FrameBatch) -> PredictFuture<'_> {
        Box::pin(async move {
            batch.check_shape(self.shape)?;

            let request = PredictRequest {
                instances: vec![batch.frames.iter().map(Frame::to_nested).collect()],
            };

            let response: PredictResponse = self
                .client
                .post(format!("{}:predict", self.model_url))
                .json(&request)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            probability_from(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(size: u32) -> Frame {
        Frame {
            width: size,
            height: size,
            data: vec![0.5; (size * size * 3) as usize],
        }
    }

    #[test]
    fn test_batch_shape() {
        let batch = FrameBatch::new(vec![frame(8); 10]);
        assert_eq!(batch.shape(), Some(InputShape::rgb(10, 8)));
        assert!(batch.check_shape(InputShape::rgb(10, 8)).is_ok());
    }

    #[test]
    fn test_short_batch_is_shape_mismatch() {
        let batch = FrameBatch::new(vec![frame(8); 5]);
        assert!(matches!(
            batch.check_shape(InputShape::rgb(10, 8)),
            Err(ClassifierError::ShapeMismatch { found, .. }) if found.frames == 5
        ));
    }

    #[test]
    fn test_mixed_sizes_is_shape_mismatch() {
        let mut frames = vec![frame(8); 9];
        frames.push(frame(4));
        let batch = FrameBatch::new(frames);

        assert_eq!(batch.shape(), None);
        assert!(batch.check_shape(InputShape::rgb(10, 8)).is_err());
    }

    #[test]
    fn test_probability_from_response() {
        let ok: PredictResponse = serde_json::from_str(r#"{"predictions": [[0.8]]}"#).unwrap();
        assert!((probability_from(ok).unwrap() - 0.8).abs() < 1e-6);

        let empty: PredictResponse = serde_json::from_str(r#"{"predictions": []}"#).unwrap();
        assert!(probability_from(empty).is_err());

        let out_of_range: PredictResponse =
            serde_json::from_str(r#"{"predictions": [[1.5]]}"#).unwrap();
        assert!(matches!(
            probability_from(out_of_range),
            Err(ClassifierError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_request_layout() {
        let request = PredictRequest {
            instances: vec![vec![frame(2).to_nested(); 3]],
        };
        let json = serde_json::to_value(&request).unwrap();

        let instance = &json["instances"][0];
        assert_eq!(instance.as_array().unwrap().len(), 3);
        assert_eq!(instance[0].as_array().unwrap().len(), 2);
        assert_eq!(instance[0][0][1].as_array().unwrap().len(), 3);
    }
}
