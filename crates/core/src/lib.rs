pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod jd_cache;
pub mod lazy;
pub mod location;
pub mod matcher;
pub mod models;
pub mod periods;
pub mod reader;
pub mod sections;
pub mod skills;
pub mod traits;

pub use chunking::{chunk_chars, normalize_whitespace, SkillTextNormalizer};
pub use config::{ModelConfig, ModelServices};
pub use embeddings::{
    cosine_similarity, CharacterNgramEmbedder, HttpEmbedder, SharedEmbedder,
    DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{ModelError, PipelineError, ReadError, Result};
pub use jd_cache::{
    digest_bytes, discover_jd_files, CacheBuildReport, JdCache, JdCacheBuilder, SkippedDocument,
};
pub use lazy::LazyModel;
pub use location::LocationExtractor;
pub use matcher::{similarity_percent, MatchEngine};
pub use models::{
    Gap, JdCacheEntry, MatchResult, Period, PeriodEnd, PeriodMode, PipelineOptions, ResumeProfile,
    YearMonth,
};
pub use periods::{calculate_gaps, education_to_first_job_gap, months_between, PeriodExtractor};
pub use reader::{extract_text, extract_text_from_bytes, DocumentKind};
pub use sections::{split_sections, ResumeSections};
pub use skills::{
    canonical_key, compare_skills, is_skill_like, normalize_skills, SkillComparison,
    SkillDatabase, SkillDatabaseStrategy, SkillExtractor, SkillToken,
};
pub use traits::{DocumentReader, Embedder, SkillStrategy};
