use std::path::Path;
use tracing::debug;

use crate::config::ModelServices;
use crate::embeddings::cosine_similarity;
use crate::error::PipelineError;
use crate::jd_cache::JdCache;
use crate::location::LocationExtractor;
use crate::models::{JdCacheEntry, MatchResult, PeriodMode, ResumeProfile};
use crate::periods::{calculate_gaps, education_to_first_job_gap, PeriodExtractor};
use crate::reader::extract_text;
use crate::sections::split_sections;
use crate::skills::compare_skills;
use crate::traits::Embedder;

/// Scores one résumé against every cached job description.
pub struct MatchEngine {
    services: ModelServices,
    periods: PeriodExtractor,
    location: LocationExtractor,
}

impl MatchEngine {
    pub fn new(services: ModelServices) -> Result<Self, PipelineError> {
        let window = services.skills.options().context_window;
        Ok(Self {
            periods: PeriodExtractor::new(window)?,
            location: LocationExtractor::new()?,
            services,
        })
    }

    pub fn services(&self) -> &ModelServices {
        &self.services
    }

    /// Skills, timelines, gaps and location of a single résumé.
    pub fn analyze_text(&self, text: &str) -> ResumeProfile {
        let sections = split_sections(text);
        let education_lines = sections.education_lines(self.periods.label_rules());
        let experience_lines = sections.experience_lines(text, &education_lines);

        let education = self
            .periods
            .extract_periods(&education_lines, PeriodMode::Education);
        let experience = self
            .periods
            .extract_periods(&experience_lines, PeriodMode::Experience);

        ResumeProfile {
            text: text.to_string(),
            skills: self.services.skills.extract_tokens(text),
            education_gaps: calculate_gaps(&education),
            experience_gaps: calculate_gaps(&experience),
            education_to_first_job_months: education_to_first_job_gap(&education, &experience),
            location: self.location.extract(text),
            education,
            experience,
        }
    }

    pub fn analyze_file(&self, path: &Path) -> Result<ResumeProfile, PipelineError> {
        Ok(self.analyze_text(&extract_text(path)?))
    }

    /// One result per cache entry, in file-name order.
    pub fn match_resume_to_jds(
        &self,
        resume: &Path,
        cache: &JdCache,
    ) -> Result<Vec<MatchResult>, PipelineError> {
        self.match_text_to_jds(&extract_text(resume)?, cache)
    }

    pub fn match_text_to_jds(
        &self,
        text: &str,
        cache: &JdCache,
    ) -> Result<Vec<MatchResult>, PipelineError> {
        let profile = self.analyze_text(text);
        let embedding = self.services.embedder.embed(text)?;
        Ok(cache
            .iter()
            .map(|entry| self.match_profile(&profile, &embedding, entry))
            .collect())
    }

    pub fn match_profile(
        &self,
        profile: &ResumeProfile,
        embedding: &[f32],
        jd: &JdCacheEntry,
    ) -> MatchResult {
        let skills = compare_skills(&profile.skills, &jd.skills);
        let similarity_score_percent = similarity_percent(embedding, &jd.embedding);
        debug!(
            jd = %jd.filename,
            similarity_score_percent,
            matched = skills.matched.len(),
            missing = skills.missing.len(),
            "scored job description"
        );

        MatchResult {
            jd_file: jd.filename.clone(),
            similarity_score_percent,
            matched_skills: skills.matched,
            missing_skills: skills.missing,
            resume_location: profile.location.clone(),
            jd_location: self.location.extract(&jd.text),
            education_periods: profile.education.clone(),
            experience_periods: profile.experience.clone(),
            education_gaps: profile.education_gaps.clone(),
            experience_gaps: profile.experience_gaps.clone(),
            education_to_first_job_gap_months: profile.education_to_first_job_months,
        }
    }
}

/// Cosine similarity as a percentage rounded to two decimals. Not clamped.
pub fn similarity_percent(resume: &[f32], jd: &[f32]) -> f64 {
    let percent = f64::from(cosine_similarity(resume, jd)) * 100.0;
    (percent * 100.0).round() / 100.0
}
