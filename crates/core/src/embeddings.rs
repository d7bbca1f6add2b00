use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use url::Url;

use crate::error::ModelError;
use crate::lazy::LazyModel;
pub use crate::traits::Embedder;

const DEFAULT: usize = 384;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = DEFAULT;

/// Hashed character-trigram embedder. Deterministic and offline, so it backs
/// tests and any run without a configured embedding endpoint.
#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl Embedder for CharacterNgramEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return Ok(vector);
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        Ok(vector)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    data: Option<Vec<EmbeddingDatum>>,
}

/// Sentence-embedding service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    model: Option<String>,
    dimensions: usize,
}

impl HttpEmbedder {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        model: Option<String>,
        dimensions: usize,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            client: Client::new(),
            endpoint: Url::parse(endpoint.trim())?,
            api_key,
            model,
            dimensions,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Embedder for HttpEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let payload = EmbeddingRequest {
            input: text,
            model: self.model.as_deref(),
        };

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("content-type", "application/json")
            .json(&payload);

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send()?;
        if !response.status().is_success() {
            return Err(ModelError::EmbeddingResponse(format!(
                "embedding request to {} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let payload: EmbeddingResponse = response.json()?;
        vector_from_response(payload, self.dimensions)
    }
}

fn vector_from_response(
    payload: EmbeddingResponse,
    expected: usize,
) -> Result<Vec<f32>, ModelError> {
    let vector = payload
        .embedding
        .or_else(|| {
            payload
                .data
                .and_then(|data| data.into_iter().next())
                .map(|datum| datum.embedding)
        })
        .filter(|vector| !vector.is_empty())
        .ok_or_else(|| {
            ModelError::EmbeddingResponse("response carried no embedding".to_string())
        })?;

    if expected > 0 && vector.len() != expected {
        return Err(ModelError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }

    Ok(vector)
}

type EmbedderCell = LazyModel<Result<Box<dyn Embedder>, ModelError>>;

/// Process-wide embedder handle. The wrapped model is constructed on first
/// use and shared by every clone.
#[derive(Clone)]
pub struct SharedEmbedder {
    dimensions: usize,
    model: Arc<EmbedderCell>,
}

impl SharedEmbedder {
    pub fn new(
        dimensions: usize,
        factory: impl Fn() -> Result<Box<dyn Embedder>, ModelError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            dimensions,
            model: Arc::new(LazyModel::new(factory)),
        }
    }

    pub fn from_embedder(embedder: impl Embedder + 'static) -> Self {
        let dimensions = embedder.dimensions();
        let boxed: Box<dyn Embedder> = Box::new(embedder);
        Self {
            dimensions,
            model: Arc::new(LazyModel::ready(Ok(boxed))),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_initialized()
    }
}

impl Embedder for SharedEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        match self.model.get() {
            Ok(model) => model.embed(text),
            Err(error) => Err(ModelError::Unavailable(error.to_string())),
        }
    }
}

/// Cosine similarity of two embeddings. Vectors of different lengths are
/// compared over their common prefix; a zero-magnitude side yields 0.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    if left.len() != right.len() {
        warn!(
            left = left.len(),
            right = right.len(),
            "embedding dimensions differ; comparing common prefix"
        );
    }

    let (mut dot, mut left_norm, mut right_norm) = (0f32, 0f32, 0f32);
    for (a, b) in left.iter().zip(right) {
        dot += a * b;
        left_norm += a * a;
        right_norm += b * b;
    }

    let magnitude = left_norm.sqrt() * right_norm.sqrt();
    if magnitude > 0.0 {
        dot / magnitude
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn embedder_is_deterministic() -> Result<(), ModelError> {
        let embedder = CharacterNgramEmbedder::default();
        let first = embedder.embed("Data analyst with SQL and Power BI")?;
        let second = embedder.embed("Data analyst with SQL and Power BI")?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn embedder_outputs_expected_length() -> Result<(), ModelError> {
        let embedder = CharacterNgramEmbedder { dimensions: 32 };
        assert_eq!(embedder.embed("abc")?.len(), 32);
        assert_eq!(CharacterNgramEmbedder::default().embed("")?.len(), 384);
        Ok(())
    }

    #[test]
    fn cosine_handles_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[0.0; 4], &[1.0; 4]), 0.0);
        assert!((cosine_similarity(&[0.5; 8], &[0.5; 8]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0, 9.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn response_accepts_both_payload_shapes() -> Result<(), Box<dyn std::error::Error>> {
        let flat: EmbeddingResponse = serde_json::from_str(r#"{"embedding": [0.1, 0.2]}"#)?;
        assert_eq!(vector_from_response(flat, 2)?, vec![0.1, 0.2]);

        let listed: EmbeddingResponse =
            serde_json::from_str(r#"{"data": [{"embedding": [1.0, 2.0, 3.0]}]}"#)?;
        assert_eq!(vector_from_response(listed, 0)?.len(), 3);

        let empty: EmbeddingResponse = serde_json::from_str(r#"{"data": []}"#)?;
        assert!(matches!(
            vector_from_response(empty, 0),
            Err(ModelError::EmbeddingResponse(_))
        ));

        let short: EmbeddingResponse = serde_json::from_str(r#"{"embedding": [1.0]}"#)?;
        assert!(matches!(
            vector_from_response(short, 384),
            Err(ModelError::DimensionMismatch { expected: 384, actual: 1 })
        ));
        Ok(())
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let result = HttpEmbedder::new("not a url", None, None, 384);
        assert!(matches!(result, Err(ModelError::InvalidEndpoint(_))));
    }

    #[test]
    fn shared_embedder_builds_once() -> Result<(), ModelError> {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let shared = SharedEmbedder::new(16, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CharacterNgramEmbedder { dimensions: 16 }) as Box<dyn Embedder>)
        });
        let clone = shared.clone();

        assert!(!shared.is_loaded());
        shared.embed("first")?;
        clone.embed("second")?;
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(clone.is_loaded());
        Ok(())
    }

    #[test]
    fn failed_model_load_surfaces_as_unavailable() {
        let shared = SharedEmbedder::new(8, || {
            Err(ModelError::Unavailable("weights missing".to_string()))
        });
        assert!(matches!(shared.embed("text"), Err(ModelError::Unavailable(_))));
    }
}
