use std::path::PathBuf;
use tracing::info;

use crate::embeddings::{
    CharacterNgramEmbedder, HttpEmbedder, SharedEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
};
use crate::error::PipelineError;
use crate::models::PipelineOptions;
use crate::skills::{SkillDatabaseStrategy, SkillExtractor};
use crate::traits::Embedder;

/// Where the model-backed services come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelConfig {
    pub skill_db_path: Option<PathBuf>,
    pub embedding_endpoint: Option<String>,
    pub embedding_api_key: Option<String>,
    pub embedding_model: Option<String>,
    pub embedding_dimensions: Option<usize>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

impl ModelConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            skill_db_path: non_blank(lookup("SKILL_DB_PATH")).map(PathBuf::from),
            embedding_endpoint: non_blank(lookup("EMBEDDING_ENDPOINT")),
            embedding_api_key: non_blank(lookup("EMBEDDING_API_KEY")),
            embedding_model: non_blank(lookup("EMBEDDING_MODEL")),
            embedding_dimensions: non_blank(lookup("EMBEDDING_DIMENSIONS"))
                .and_then(|value| value.parse().ok()),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.embedding_dimensions.unwrap_or(DEFAULT_EMBEDDING_DIMENSIONS)
    }
}

/// The injected model layer: one skill extractor and one shared embedder,
/// both reused across cache builds and matches.
pub struct ModelServices {
    pub skills: SkillExtractor,
    pub embedder: SharedEmbedder,
}

impl ModelServices {
    pub fn new(skills: SkillExtractor, embedder: SharedEmbedder) -> Self {
        Self { skills, embedder }
    }

    /// Skill extraction always tries a database first: the one at
    /// `skill_db_path`, or the bundled one when unset.
    pub fn from_config(
        config: &ModelConfig,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        let database = match &config.skill_db_path {
            Some(path) => SkillDatabaseStrategy::from_path(path.clone()),
            None => SkillDatabaseStrategy::bundled(),
        };
        let skills = SkillExtractor::with_database(database, options)?;

        let dimensions = config.dimensions();
        let embedder = match &config.embedding_endpoint {
            Some(endpoint) => {
                let http = HttpEmbedder::new(
                    endpoint,
                    config.embedding_api_key.clone(),
                    config.embedding_model.clone(),
                    dimensions,
                )?;
                info!(endpoint = %http.endpoint(), dimensions, "using remote embedding model");
                SharedEmbedder::new(dimensions, move || {
                    Ok(Box::new(http.clone()) as Box<dyn Embedder>)
                })
            }
            None => SharedEmbedder::from_embedder(CharacterNgramEmbedder { dimensions }),
        };

        Ok(Self::new(skills, embedder))
    }

    /// Offline services: the bundled skill database and the character n-gram
    /// embedder.
    pub fn offline(options: PipelineOptions) -> Result<Self, PipelineError> {
        Self::from_config(&ModelConfig::default(), options)
    }
}
