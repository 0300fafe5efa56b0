//! Recognition adapter boundary.
//!
//! The face matcher itself is an external service. The core only needs a verdict:
//! which student (if any) a captured frame shows, and how confident the matcher is.
//! Every failure mode of the service is reported as an [`AdapterError`]; callers are
//! expected to treat an error exactly like "no match".

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config;

/// A captured camera frame, base64 encoded (an optional `data:image/...;base64,` prefix is tolerated).
#[derive(Debug, Clone)]
pub struct FaceFrame {
    pub image_base64: String,
}

impl FaceFrame {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image_base64: image.into(),
        }
    }

    /// The payload with any data-URL header stripped.
    pub fn payload(&self) -> &str {
        match self.image_base64.split_once(";base64,") {
            Some((head, rest)) if head.starts_with("data:image") => rest,
            _ => &self.image_base64,
        }
    }
}

/// Outcome of a single match attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchVerdict {
    pub recognized: bool,
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl MatchVerdict {
    pub fn no_match() -> Self {
        Self {
            recognized: false,
            student_id: None,
            confidence: None,
        }
    }

    pub fn matched(student_id: i64, confidence: f64) -> Self {
        Self {
            recognized: true,
            student_id: Some(student_id),
            confidence: Some(confidence),
        }
    }

    /// The recognised student, only when the verdict is a positive match.
    pub fn student(&self) -> Option<i64> {
        if self.recognized { self.student_id } else { None }
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("recognition service is not configured")]
    Disabled,

    #[error("recognition service unreachable: {0}")]
    Unavailable(String),

    #[error("recognition service returned HTTP {0}")]
    BadStatus(u16),

    #[error("malformed recognition response: {0}")]
    Malformed(String),

    #[error("invalid sample: {0}")]
    InvalidSample(String),
}

/// Turns a captured sample into a verdict.
///
/// `candidates` is the session roster; implementations may use it to narrow the
/// search and must never return a student outside of it.
#[async_trait]
pub trait RecognitionAdapter: Send + Sync {
    async fn identify(
        &self,
        frame: &FaceFrame,
        candidates: &[i64],
    ) -> Result<MatchVerdict, AdapterError>;
}

/// Adapter used when no recognition service is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRecognitionAdapter;

#[async_trait]
impl RecognitionAdapter for DisabledRecognitionAdapter {
    async fn identify(&self, _: &FaceFrame, _: &[i64]) -> Result<MatchVerdict, AdapterError> {
        Err(AdapterError::Disabled)
    }
}

#[derive(Serialize)]
struct IdentifyRequest<'a> {
    image: &'a str,
    candidates: &'a [i64],
}

/// Talks to the face recognition service over HTTP (`POST {base}/identify`).
///
/// Confidence thresholding happens here, so the recorder only ever sees
/// verdicts it should act on.
#[derive(Debug, Clone)]
pub struct HttpRecognitionAdapter {
    client: Client,
    endpoint: String,
    min_confidence: f64,
}

impl HttpRecognitionAdapter {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        min_confidence: f64,
    ) -> Result<Self, AdapterError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/identify", base_url.trim_end_matches('/')),
            min_confidence,
        })
    }

    fn threshold(&self, verdict: MatchVerdict, candidates: &[i64]) -> MatchVerdict {
        let Some(student_id) = verdict.student() else {
            return MatchVerdict::no_match();
        };
        let confidence = verdict.confidence.unwrap_or(0.0);
        if confidence < self.min_confidence || !candidates.contains(&student_id) {
            return MatchVerdict::no_match();
        }
        MatchVerdict::matched(student_id, confidence)
    }
}

#[async_trait]
impl RecognitionAdapter for HttpRecognitionAdapter {
    async fn identify(
        &self,
        frame: &FaceFrame,
        candidates: &[i64],
    ) -> Result<MatchVerdict, AdapterError> {
        let image = frame.payload();
        if image.trim().is_empty() {
            return Err(AdapterError::InvalidSample("empty image".into()));
        }

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&IdentifyRequest { image, candidates })
            .send()
            .await
            .map_err(|e| AdapterError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AdapterError::BadStatus(resp.status().as_u16()));
        }

        let verdict = resp
            .json::<MatchVerdict>()
            .await
            .map_err(|e| AdapterError::Malformed(e.to_string()))?;

        Ok(self.threshold(verdict, candidates))
    }
}

/// Builds the adapter described by the current configuration.
pub fn adapter_from_config() -> std::sync::Arc<dyn RecognitionAdapter> {
    let url = config::recognition_url();
    if url.trim().is_empty() {
        return std::sync::Arc::new(DisabledRecognitionAdapter);
    }

    let timeout = Duration::from_millis(config::recognition_timeout_ms());
    match HttpRecognitionAdapter::new(&url, timeout, config::recognition_min_confidence()) {
        Ok(adapter) => std::sync::Arc::new(adapter),
        Err(e) => {
            tracing::warn!(error = %e, "Falling back to disabled recognition adapter");
            std::sync::Arc::new(DisabledRecognitionAdapter)
        }
    }
}
