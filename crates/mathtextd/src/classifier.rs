//! Intent classifier boundary.
//!
//! The classifier is an opaque oracle returning ranked labels. Production
//! code talks to it over HTTP; tests use `FakeIntentClassifier`.

use async_trait::async_trait;
use mathtext_shared::IntentResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid classifier response: {0}")]
    InvalidResponse(String),

    #[error("Classifier unavailable")]
    Unavailable,
}

// ============================================================================
// Classifier Trait
// ============================================================================

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Ranked labels, highest confidence first.
    async fn classify(&self, text: &str) -> Result<Vec<IntentResult>, ClassifierError>;

    fn name(&self) -> &str;
}

/// Sorts by descending confidence, keeping the original order of ties.
pub fn rank(mut intents: Vec<IntentResult>) -> Vec<IntentResult> {
    intents.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    intents
}

// ============================================================================
// HTTP Classifier (Production)
// ============================================================================

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireIntent {
    data: String,
    confidence: f64,
}

/// Either a ranked list or a single top prediction.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Ranked { intents: Vec<WireIntent> },
    Single(WireIntent),
}

impl ClassifyResponse {
    fn into_ranked(self) -> Vec<IntentResult> {
        let wire = match self {
            ClassifyResponse::Ranked { intents } => intents,
            ClassifyResponse::Single(intent) => vec![intent],
        };
        rank(
            wire.into_iter()
                .map(|w| IntentResult::new(w.data, w.confidence))
                .collect(),
        )
    }
}

/// Classifier served over HTTP: POST `{"text": ...}`.
pub struct HttpIntentClassifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpIntentClassifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl IntentClassifier for HttpIntentClassifier {
    async fn classify(&self, text: &str) -> Result<Vec<IntentResult>, ClassifierError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { text })
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        let parsed: ClassifyResponse = serde_json::from_str(&body)
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;
        let ranked = parsed.into_ranked();
        debug!(count = ranked.len(), "Classifier responded");
        Ok(ranked)
    }

    fn name(&self) -> &str {
        "http"
    }
}

// ============================================================================
// Unavailable Classifier
// ============================================================================

/// Used when no endpoint is configured. Every call fails, so evaluations
/// that reach the classifier degrade to `out_of_scope`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableClassifier;

#[async_trait]
impl IntentClassifier for UnavailableClassifier {
    async fn classify(&self, _text: &str) -> Result<Vec<IntentResult>, ClassifierError> {
        Err(ClassifierError::Unavailable)
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

// ============================================================================
// Fake Classifier (Testing)
// ============================================================================

/// Canned classifier for deterministic tests.
///
/// ```rust,ignore
/// let fake = FakeIntentClassifier::new()
///     .respond("odd", vec![IntentResult::new("math_answer", 0.9)]);
/// ```
#[derive(Clone, Default)]
pub struct FakeIntentClassifier {
    /// Exact text -> ranked response
    responses: HashMap<String, Vec<IntentResult>>,
    /// Response for texts without an entry
    default_response: Vec<IntentResult>,
    delay: Option<Duration>,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl FakeIntentClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, text: &str, intents: Vec<IntentResult>) -> Self {
        self.responses.insert(text.to_string(), intents);
        self
    }

    pub fn respond_by_default(mut self, intents: Vec<IntentResult>) -> Self {
        self.default_response = intents;
        self
    }

    /// Sleep before answering (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every call returns an error
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentClassifier for FakeIntentClassifier {
    async fn classify(&self, text: &str) -> Result<Vec<IntentResult>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ClassifierError::InvalidResponse("fake failure".to_string()));
        }
        let intents = self
            .responses
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone());
        Ok(rank(intents))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_prediction_shape() {
        let body = r#"{"type": "intent", "data": "help", "confidence": 0.93}"#;
        let parsed: ClassifyResponse = serde_json::from_str(body).unwrap();
        let ranked = parsed.into_ranked();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].label, "help");
    }

    #[test]
    fn test_ranked_shape_is_sorted() {
        let body = r#"{"intents": [
            {"type": "intent", "data": "stop", "confidence": 0.2},
            {"type": "intent", "data": "math_answer", "confidence": 0.7}
        ]}"#;
        let parsed: ClassifyResponse = serde_json::from_str(body).unwrap();
        let ranked = parsed.into_ranked();
        assert_eq!(ranked[0].label, "math_answer");
        assert_eq!(ranked[1].label, "stop");
    }
}
