pub mod database;
pub mod morphology;

pub use database::{SkillAnnotation, SkillDatabase, SkillDatabaseStrategy, SkillHit, SkillRecord};
pub use morphology::{is_skill_like, MorphologyStrategy};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

use crate::chunking::SkillTextNormalizer;
use crate::error::PipelineError;
use crate::models::PipelineOptions;
use crate::traits::SkillStrategy;

const KEY_ALIASES: [(&str, &str); 5] = [
    ("c++", "cpp"),
    ("c#", "csharp"),
    ("node.js", "nodejs"),
    ("react.js", "reactjs"),
    (".js", "js"),
];

/// Comparison-safe form of a skill name: lowercase, known aliases collapsed,
/// everything but ASCII letters and digits removed.
pub fn canonical_key(surface: &str) -> String {
    let mut key = surface.trim().to_lowercase();
    for (alias, replacement) in KEY_ALIASES {
        key = key.replace(alias, replacement);
    }
    key.chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        .collect()
}

/// Canonical keys of `skills`, empty keys dropped.
pub fn normalize_skills<S: AsRef<str>>(skills: &[S]) -> BTreeSet<String> {
    skills
        .iter()
        .map(|skill| canonical_key(skill.as_ref()))
        .filter(|key| !key.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillToken {
    pub surface: String,
    pub key: String,
}

impl SkillToken {
    pub fn new(surface: impl Into<String>) -> Self {
        let surface = surface.into();
        let key = canonical_key(&surface);
        Self { surface, key }
    }
}

pub fn tokens_from_surfaces<S: AsRef<str>>(surfaces: &[S]) -> Vec<SkillToken> {
    surfaces
        .iter()
        .map(|surface| SkillToken::new(surface.as_ref()))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillComparison {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

/// Intersects two skill sets by canonical key. Both lists carry the job
/// description's surface forms.
pub fn compare_skills(resume: &[SkillToken], jd: &[SkillToken]) -> SkillComparison {
    let resume_keys: HashSet<&str> = resume.iter().map(|token| token.key.as_str()).collect();
    let mut seen = HashSet::new();
    let mut comparison = SkillComparison::default();

    for token in jd {
        if token.key.is_empty() || !seen.insert(token.key.as_str()) {
            continue;
        }
        if resume_keys.contains(token.key.as_str()) {
            comparison.matched.push(token.surface.clone());
        } else {
            comparison.missing.push(token.surface.clone());
        }
    }

    comparison.matched.sort_by_key(|skill| skill.to_lowercase());
    comparison.missing.sort_by_key(|skill| skill.to_lowercase());
    comparison
}

/// Runs the strategy ladder: the first strategy yielding at least one
/// shape-accepted candidate wins. Strategy failures count as "no candidates".
pub struct SkillExtractor {
    strategies: Vec<Box<dyn SkillStrategy>>,
    normalizer: SkillTextNormalizer,
    options: PipelineOptions,
}

impl SkillExtractor {
    pub fn new(
        strategies: Vec<Box<dyn SkillStrategy>>,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        if strategies.is_empty() {
            return Err(PipelineError::InvalidArgument(
                "skill extractor needs at least one strategy".to_string(),
            ));
        }
        Ok(Self {
            strategies,
            normalizer: SkillTextNormalizer::new()?,
            options,
        })
    }

    pub fn morphology_only(options: PipelineOptions) -> Result<Self, PipelineError> {
        Self::new(vec![Box::new(MorphologyStrategy::new()?)], options)
    }

    pub fn with_database(
        database: SkillDatabaseStrategy,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        Self::new(
            vec![Box::new(database), Box::new(MorphologyStrategy::new()?)],
            options,
        )
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Sorted (case-insensitively), key-unique skill surface forms found in `text`.
    pub fn extract_skills(&self, text: &str) -> Vec<String> {
        let cleaned = self.normalizer.normalize(text);
        if cleaned.is_empty() {
            return Vec::new();
        }

        for strategy in &self.strategies {
            let candidates = match strategy.candidates(&cleaned, &self.options) {
                Ok(candidates) => candidates,
                Err(error) => {
                    warn!(strategy = strategy.name(), %error, "skill strategy failed");
                    continue;
                }
            };

            let accepted = self.dedupe(candidates);
            if !accepted.is_empty() {
                debug!(
                    strategy = strategy.name(),
                    skill_count = accepted.len(),
                    "skills extracted"
                );
                return accepted;
            }
        }

        Vec::new()
    }

    pub fn extract_tokens(&self, text: &str) -> Vec<SkillToken> {
        tokens_from_surfaces(&self.extract_skills(text))
    }

    fn dedupe(&self, candidates: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        for candidate in candidates {
            let surface = candidate.trim();
            if !is_skill_like(surface) {
                continue;
            }
            let key = canonical_key(surface);
            if key.len() < self.options.min_skill_key_len {
                continue;
            }
            if seen.insert(key) {
                kept.push(surface.to_string());
            }
        }
        kept.sort_by_key(|skill| skill.to_lowercase());
        kept
    }
}
