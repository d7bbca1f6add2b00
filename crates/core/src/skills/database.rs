//! Phrase-matching skill database.
//!
//! The database is a JSON document of canonical skill names with optional
//! aliases. Text is matched token-by-token: exact (case-insensitive) phrase
//! hits become full matches, and the remaining n-grams are scored against
//! phrases of the same length by character-bigram similarity.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::chunking::chunk_chars;
use crate::error::ModelError;
use crate::lazy::LazyModel;
use crate::models::PipelineOptions;
use crate::traits::SkillStrategy;

/// Skill database shipped with the crate, used when no other is configured.
pub const BUNDLED_SKILL_DB: &str = include_str!("../../data/skills.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRecord {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SkillDatabaseFile {
    skills: Vec<SkillRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillHit {
    /// Text exactly as it appeared in the document.
    pub surface: String,
    pub skill_name: String,
    pub score: f32,
}

impl SkillHit {
    pub fn label(&self) -> &str {
        if self.surface.trim().is_empty() {
            &self.skill_name
        } else {
            &self.surface
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SkillAnnotation {
    pub full_matches: Vec<SkillHit>,
    pub ngram_scored: Vec<SkillHit>,
}

#[derive(Debug, Clone)]
struct Token {
    start: usize,
    end: usize,
    lowered: String,
}

pub struct SkillDatabase {
    records: Vec<SkillRecord>,
    phrases: HashMap<Vec<String>, usize>,
    phrases_by_len: BTreeMap<usize, Vec<(String, usize)>>,
    max_phrase_tokens: usize,
    token_re: Regex,
}

impl SkillDatabase {
    pub fn from_records(records: Vec<SkillRecord>) -> Result<Self, ModelError> {
        let token_re = Regex::new(r"\.?[A-Za-z0-9][A-Za-z0-9+#.\-]*")
            .map_err(|error| ModelError::SkillDatabase(error.to_string()))?;

        let mut phrases = HashMap::new();
        let mut phrases_by_len: BTreeMap<usize, Vec<(String, usize)>> = BTreeMap::new();
        let mut max_phrase_tokens = 0;

        for (index, record) in records.iter().enumerate() {
            for phrase in std::iter::once(&record.name).chain(record.aliases.iter()) {
                let tokens = tokenize(&token_re, phrase)
                    .into_iter()
                    .map(|token| token.lowered)
                    .collect::<Vec<_>>();
                if tokens.is_empty() {
                    continue;
                }
                max_phrase_tokens = max_phrase_tokens.max(tokens.len());
                phrases_by_len
                    .entry(tokens.len())
                    .or_default()
                    .push((tokens.join(" "), index));
                phrases.entry(tokens).or_insert(index);
            }
        }

        if phrases.is_empty() {
            return Err(ModelError::SkillDatabase(
                "skill database contains no phrases".to_string(),
            ));
        }

        Ok(Self {
            records,
            phrases,
            phrases_by_len,
            max_phrase_tokens,
            token_re,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let file: SkillDatabaseFile = serde_json::from_str(json)
            .map_err(|error| ModelError::SkillDatabase(error.to_string()))?;
        Self::from_records(file.skills)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let json = std::fs::read_to_string(path).map_err(|error| {
            ModelError::SkillDatabase(format!("{}: {error}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Number of canonical skills, aliases not counted.
    pub fn skill_count(&self) -> usize {
        self.records.len()
    }

    pub fn annotate(&self, text: &str) -> SkillAnnotation {
        let tokens = tokenize(&self.token_re, text);
        let mut covered = vec![false; tokens.len()];
        let mut annotation = SkillAnnotation::default();

        let mut index = 0;
        while index < tokens.len() {
            let longest = self.max_phrase_tokens.min(tokens.len() - index);
            let hit = (1..=longest).rev().find_map(|len| {
                let key = tokens[index..index + len]
                    .iter()
                    .map(|token| token.lowered.clone())
                    .collect::<Vec<_>>();
                self.phrases.get(&key).map(|record| (len, *record))
            });

            match hit {
                Some((len, record)) => {
                    annotation.full_matches.push(SkillHit {
                        surface: text[tokens[index].start..tokens[index + len - 1].end].to_string(),
                        skill_name: self.records[record].name.clone(),
                        score: 1.0,
                    });
                    covered[index..index + len].fill(true);
                    index += len;
                }
                None => index += 1,
            }
        }

        for (&len, phrases) in &self.phrases_by_len {
            if len > tokens.len() {
                break;
            }
            for start in 0..=tokens.len() - len {
                if covered[start..start + len].iter().any(|flag| *flag) {
                    continue;
                }
                let candidate = tokens[start..start + len]
                    .iter()
                    .map(|token| token.lowered.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                let first = candidate.chars().next();

                let best = phrases
                    .iter()
                    .filter(|(phrase, _)| phrase.chars().next() == first)
                    .map(|(phrase, record)| (bigram_dice(&candidate, phrase), *record))
                    .max_by(|left, right| left.0.total_cmp(&right.0));

                if let Some((score, record)) = best.filter(|(score, _)| *score > 0.0) {
                    annotation.ngram_scored.push(SkillHit {
                        surface: text[tokens[start].start..tokens[start + len - 1].end]
                            .to_string(),
                        skill_name: self.records[record].name.clone(),
                        score,
                    });
                }
            }
        }

        annotation
    }
}

fn tokenize(token_re: &Regex, text: &str) -> Vec<Token> {
    token_re
        .find_iter(text)
        .filter_map(|found| {
            let trimmed = found.as_str().trim_end_matches(['.', '-']);
            if trimmed.is_empty() {
                return None;
            }
            Some(Token {
                start: found.start(),
                end: found.start() + trimmed.len(),
                lowered: trimmed.to_lowercase(),
            })
        })
        .collect()
}

/// Sørensen–Dice coefficient over character bigrams.
fn bigram_dice(left: &str, right: &str) -> f32 {
    if left == right {
        return 1.0;
    }
    let left_chars: Vec<char> = left.chars().collect();
    let right_chars: Vec<char> = right.chars().collect();
    if left_chars.len() < 2 || right_chars.len() < 2 {
        return 0.0;
    }

    let mut counts: HashMap<(char, char), usize> = HashMap::new();
    for pair in left_chars.windows(2) {
        *counts.entry((pair[0], pair[1])).or_default() += 1;
    }

    let mut shared = 0usize;
    for pair in right_chars.windows(2) {
        if let Some(count) = counts.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                shared += 1;
            }
        }
    }

    (2 * shared) as f32 / (left_chars.len() - 1 + right_chars.len() - 1) as f32
}

/// Primary rung: annotates the text chunk by chunk against a lazily loaded
/// [`SkillDatabase`].
pub struct SkillDatabaseStrategy {
    database: Arc<LazyModel<Result<SkillDatabase, ModelError>>>,
}

impl SkillDatabaseStrategy {
    pub fn new(database: Arc<LazyModel<Result<SkillDatabase, ModelError>>>) -> Self {
        Self { database }
    }

    /// Loads the database from `path` on first use.
    pub fn from_path(path: impl Into<std::path::PathBuf>) -> Self {
        let path = path.into();
        Self::new(Arc::new(LazyModel::new(move || {
            log_loaded(&path.display().to_string(), SkillDatabase::load(&path))
        })))
    }

    /// Parses [`BUNDLED_SKILL_DB`] on first use.
    pub fn bundled() -> Self {
        Self::new(Arc::new(LazyModel::new(|| {
            log_loaded("bundled", SkillDatabase::from_json(BUNDLED_SKILL_DB))
        })))
    }

    pub fn from_database(database: SkillDatabase) -> Self {
        Self::new(Arc::new(LazyModel::ready(Ok(database))))
    }
}

fn log_loaded(
    source: &str,
    database: Result<SkillDatabase, ModelError>,
) -> Result<SkillDatabase, ModelError> {
    if let Ok(loaded) = &database {
        info!(source, skills = loaded.skill_count(), "skill database loaded");
    }
    database
}

impl SkillStrategy for SkillDatabaseStrategy {
    fn name(&self) -> &'static str {
        "skill-database"
    }

    fn candidates(
        &self,
        normalized: &str,
        options: &PipelineOptions,
    ) -> Result<Vec<String>, ModelError> {
        let database = self
            .database
            .get()
            .as_ref()
            .map_err(|error| ModelError::Unavailable(error.to_string()))?;

        let mut found = Vec::new();
        for part in chunk_chars(normalized, options.skill_chunk_chars) {
            let annotation = database.annotate(&part);
            found.extend(
                annotation
                    .full_matches
                    .iter()
                    .map(|hit| hit.label().trim().to_string()),
            );
            found.extend(
                annotation
                    .ngram_scored
                    .iter()
                    .filter(|hit| hit.score >= options.ngram_score_threshold)
                    .map(|hit| hit.label().trim().to_string()),
            );
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DB_JSON: &str = r#"{
        "skills": [
            {"name": "Power BI", "aliases": ["PowerBI"]},
            {"name": "SQL"},
            {"name": "Machine Learning"},
            {"name": "Kubernetes", "aliases": ["K8s"]},
            {"name": "C++"}
        ]
    }"#;

    #[test]
    fn exact_phrases_prefer_the_longest_match() -> Result<(), Box<dyn std::error::Error>> {
        let db = SkillDatabase::from_json(DB_JSON)?;
        let annotation = db.annotate("Shipped Machine Learning models, SQL and power bi reports.");

        let surfaces: Vec<&str> = annotation
            .full_matches
            .iter()
            .map(|hit| hit.surface.as_str())
            .collect();
        assert_eq!(surfaces, vec!["Machine Learning", "SQL", "power bi"]);
        assert_eq!(annotation.full_matches[2].skill_name, "Power BI");
        Ok(())
    }

    #[test]
    fn near_misses_are_scored() -> Result<(), Box<dyn std::error::Error>> {
        let db = SkillDatabase::from_json(DB_JSON)?;
        let annotation = db.annotate("Operated Kubernetess clusters");

        let hit = annotation
            .ngram_scored
            .iter()
            .find(|hit| hit.skill_name == "Kubernetes")
            .ok_or("expected a scored Kubernetes hit")?;
        assert!(hit.score >= 0.85, "score was {}", hit.score);
        assert_eq!(hit.surface, "Kubernetess");
        Ok(())
    }

    #[test]
    fn dice_is_symmetric_and_bounded() {
        assert_eq!(bigram_dice("sql", "sql"), 1.0);
        let forward = bigram_dice("night", "nacht");
        let backward = bigram_dice("nacht", "night");
        assert!((forward - backward).abs() < f32::EPSILON);
        assert!((0.0..=1.0).contains(&forward));
    }

    #[test]
    fn bundled_database_parses_and_knows_common_tools() -> Result<(), Box<dyn std::error::Error>> {
        let db = SkillDatabase::from_json(BUNDLED_SKILL_DB)?;
        assert!(db.skill_count() > 100);

        let strategy = SkillDatabaseStrategy::bundled();
        let found = strategy.candidates(
            "Shipped PowerBI reports, Node.js services and Apache Kafka consumers",
            &PipelineOptions::default(),
        )?;
        assert_eq!(found, vec!["PowerBI", "Node.js", "Apache Kafka"]);
        Ok(())
    }

    #[test]
    fn empty_database_is_rejected() {
        assert!(SkillDatabase::from_json(r#"{"skills": []}"#).is_err());
        assert!(SkillDatabase::from_json("not json").is_err());
    }

    #[test]
    fn missing_database_file_surfaces_as_unavailable() {
        let strategy = SkillDatabaseStrategy::from_path("/nonexistent/skills.json");
        let result = strategy.candidates("SQL", &PipelineOptions::default());
        assert!(matches!(result, Err(ModelError::Unavailable(_))));
    }

    #[test]
    fn strategy_keeps_exact_and_confident_matches() -> Result<(), Box<dyn std::error::Error>> {
        let strategy = SkillDatabaseStrategy::from_database(SkillDatabase::from_json(DB_JSON)?);
        let found = strategy.candidates(
            "Wrote C++ and SQL on K8s",
            &PipelineOptions::default(),
        )?;
        assert_eq!(found, vec!["C++", "SQL", "K8s"]);
        Ok(())
    }
}
