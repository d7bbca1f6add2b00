use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use resume_match_core::{
    extract_text, JdCache, JdCacheBuilder, MatchEngine, ModelConfig, ModelServices,
    PipelineOptions,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "resume-match", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON skill database used before the shape-based fallback.
    #[arg(long, global = true, env = "SKILL_DB_PATH")]
    skill_db: Option<PathBuf>,

    /// Sentence-embedding endpoint; the offline n-gram embedder is used when unset.
    #[arg(long, global = true, env = "EMBEDDING_ENDPOINT")]
    embedding_endpoint: Option<String>,

    /// Bearer token for the embedding endpoint.
    #[arg(long, global = true, env = "EMBEDDING_API_KEY", hide_env_values = true)]
    embedding_api_key: Option<String>,

    /// Model name sent to the embedding endpoint.
    #[arg(long, global = true, env = "EMBEDDING_MODEL")]
    embedding_model: Option<String>,

    /// Embedding vector length.
    #[arg(long, global = true, env = "EMBEDDING_DIMENSIONS")]
    embedding_dimensions: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Build a job-description cache from a folder and save it as JSON.
    BuildCache {
        /// Folder that contains job descriptions recursively.
        #[arg(long)]
        jd_dir: PathBuf,
        /// Where the cache is written.
        #[arg(long, default_value = "jd_cache.json")]
        cache: PathBuf,
        /// Rebuild even when the saved cache is current.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Match a résumé against every cached job description.
    Match {
        /// Résumé file (pdf, docx, txt or md).
        #[arg(long)]
        resume: PathBuf,
        /// Folder of job descriptions; reused from `--cache` when unchanged.
        #[arg(long)]
        jd_dir: Option<PathBuf>,
        /// Saved job-description cache.
        #[arg(long)]
        cache: Option<PathBuf>,
    },
    /// Print the education and experience timeline of a résumé.
    Timeline {
        #[arg(long)]
        resume: PathBuf,
    },
    /// Print the skills found in a document.
    Skills {
        #[arg(long)]
        file: PathBuf,
    },
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Cli {
    fn model_config(&self) -> ModelConfig {
        ModelConfig {
            skill_db_path: self
                .skill_db
                .clone()
                .filter(|path| !path.as_os_str().is_empty()),
            embedding_endpoint: non_blank(self.embedding_endpoint.clone()),
            embedding_api_key: non_blank(self.embedding_api_key.clone()),
            embedding_model: non_blank(self.embedding_model.clone()),
            embedding_dimensions: self.embedding_dimensions,
        }
    }
}

fn load_cache(
    builder: &JdCacheBuilder<'_>,
    jd_dir: Option<&Path>,
    cache: Option<&Path>,
) -> anyhow::Result<JdCache> {
    match (jd_dir, cache) {
        (Some(dir), Some(cache)) => Ok(builder.load_or_build(dir, cache)?.cache),
        (Some(dir), None) => {
            let report = builder.build_from_dir(dir)?;
            for skipped in &report.skipped {
                warn!(
                    path = %skipped.path.display(),
                    reason = %skipped.reason,
                    "skipped job description"
                );
            }
            Ok(report.cache)
        }
        (None, Some(cache)) => JdCache::load(cache)
            .with_context(|| format!("reading job description cache {}", cache.display())),
        (None, None) => anyhow::bail!("either --jd-dir or --cache is required"),
    }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.model_config();
    let services = ModelServices::from_config(&config, PipelineOptions::default())?;

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        skill_db = config.skill_db_path.is_some(),
        remote_embeddings = config.embedding_endpoint.is_some(),
        "resume-match boot"
    );

    match cli.command {
        Command::BuildCache { jd_dir, cache, force } => {
            let builder = JdCacheBuilder::new(&services);
            let report = if force {
                let report = builder.build_from_dir(&jd_dir)?;
                report.cache.save(&cache)?;
                report
            } else {
                builder.load_or_build(&jd_dir, &cache)?
            };

            print_json(&json!({
                "cache": cache.display().to_string(),
                "cached": report.cache.filenames().collect::<Vec<_>>(),
                "skipped": report
                    .skipped
                    .iter()
                    .map(|skipped| json!({
                        "path": skipped.path.display().to_string(),
                        "reason": skipped.reason,
                    }))
                    .collect::<Vec<_>>(),
            }))?;
        }
        Command::Match {
            resume,
            jd_dir,
            cache,
        } => {
            let builder = JdCacheBuilder::new(&services);
            let jd_cache = load_cache(&builder, jd_dir.as_deref(), cache.as_deref())?;
            if jd_cache.is_empty() {
                warn!("job description cache is empty; no matches to report");
            }

            let engine = MatchEngine::new(services)?;
            let results = engine
                .match_resume_to_jds(&resume, &jd_cache)
                .with_context(|| format!("matching {}", resume.display()))?;
            print_json(&results)?;
        }
        Command::Timeline { resume } => {
            let engine = MatchEngine::new(services)?;
            let profile = engine
                .analyze_file(&resume)
                .with_context(|| format!("reading {}", resume.display()))?;

            print_json(&json!({
                "resume": resume.display().to_string(),
                "location": profile.location,
                "education_periods": profile.education,
                "experience_periods": profile.experience,
                "education_gaps": profile.education_gaps,
                "experience_gaps": profile.experience_gaps,
                "education_to_first_job_gap_months": profile.education_to_first_job_months,
            }))?;
        }
        Command::Skills { file } => {
            let text = extract_text(&file).with_context(|| format!("reading {}", file.display()))?;
            print_json(&services.skills.extract_skills(&text))?;
        }
    }

    Ok(())
}
