use crate::error::{ModelError, ReadError};
use crate::models::PipelineOptions;

/// Converts the bytes of one document format into plain text.
pub trait DocumentReader {
    fn read(&self, bytes: &[u8], name: &str) -> Result<String, ReadError>;
}

/// One rung of the skill-extraction ladder.
///
/// Receives text already normalized for skill matching and returns raw
/// candidate surface forms. The extractor applies the morphology filter and
/// deduplication on top, so implementations may be noisy.
pub trait SkillStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn candidates(
        &self,
        normalized: &str,
        options: &PipelineOptions,
    ) -> Result<Vec<String>, ModelError>;
}

pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError>;
}
