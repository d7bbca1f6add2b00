use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::skills::SkillToken;

/// Calendar month, the granularity every timeline computation works at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Returns `None` when `month` is outside 1..=12 or the year is out of range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Whole months from `self` to `later`, floored at zero.
    pub fn months_until(&self, later: YearMonth) -> u32 {
        let delta = (later.year - self.year) * 12 + later.month as i32 - self.month as i32;
        delta.max(0) as u32
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first_day() {
            Some(day) => write!(f, "{}", day.format("%b %Y")),
            None => write!(f, "{:04}-{:02}", self.year, self.month),
        }
    }
}

/// End of a period. `Ongoing` sorts after every concrete month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodEnd {
    Month(YearMonth),
    Ongoing,
}

impl PeriodEnd {
    pub fn is_ongoing(&self) -> bool {
        matches!(self, PeriodEnd::Ongoing)
    }

    pub fn as_month(&self) -> Option<YearMonth> {
        match self {
            PeriodEnd::Month(month) => Some(*month),
            PeriodEnd::Ongoing => None,
        }
    }
}

impl fmt::Display for PeriodEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodEnd::Month(month) => write!(f, "{month}"),
            PeriodEnd::Ongoing => write!(f, "Present"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub label: String,
    pub start: YearMonth,
    pub end: PeriodEnd,
}

impl Period {
    pub fn new(label: impl Into<String>, start: YearMonth, end: PeriodEnd) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} - {})", self.label, self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    pub between: String,
    pub months: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodMode {
    Education,
    Experience,
}

/// Precomputed features of one job-description document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JdCacheEntry {
    pub filename: String,
    pub text: String,
    pub skills: Vec<SkillToken>,
    pub embedding: Vec<f32>,
    pub checksum: String,
    pub built_at: DateTime<Utc>,
}

/// Everything extracted from a single résumé, independent of any job description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeProfile {
    pub text: String,
    pub skills: Vec<SkillToken>,
    pub education: Vec<Period>,
    pub experience: Vec<Period>,
    pub education_gaps: Vec<Gap>,
    pub experience_gaps: Vec<Gap>,
    /// `None` when either timeline is empty; distinct from a computed zero.
    pub education_to_first_job_months: Option<u32>,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub jd_file: String,
    /// Cosine similarity scaled by 100. Not clamped: degenerate embeddings may leave [0, 100].
    pub similarity_score_percent: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub resume_location: String,
    pub jd_location: String,
    pub education_periods: Vec<Period>,
    pub experience_periods: Vec<Period>,
    pub education_gaps: Vec<Gap>,
    pub experience_gaps: Vec<Gap>,
    pub education_to_first_job_gap_months: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub skill_chunk_chars: usize,
    pub ngram_score_threshold: f32,
    pub context_window: usize,
    pub min_skill_key_len: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            skill_chunk_chars: 5_000,
            ngram_score_threshold: 0.85,
            context_window: 6,
            min_skill_key_len: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_months_are_rejected() {
        assert!(YearMonth::new(2020, 0).is_none());
        assert!(YearMonth::new(2020, 13).is_none());
        assert!(YearMonth::new(2020, 12).is_some());
    }

    #[test]
    fn months_until_floors_at_zero() {
        let earlier = YearMonth::new(2020, 1).unwrap();
        let later = YearMonth::new(2021, 3).unwrap();
        assert_eq!(earlier.months_until(later), 14);
        assert_eq!(later.months_until(earlier), 0);
    }

    #[test]
    fn ongoing_end_sorts_after_any_month() {
        let far = PeriodEnd::Month(YearMonth::new(9000, 12).unwrap());
        assert!(PeriodEnd::Ongoing > far);
        assert_eq!(PeriodEnd::Ongoing.as_month(), None);
    }

    #[test]
    fn period_display_uses_month_names() {
        let period = Period::new(
            "Data Analyst",
            YearMonth::new(2020, 7).unwrap(),
            PeriodEnd::Ongoing,
        );
        assert_eq!(period.to_string(), "Data Analyst (Jul 2020 - Present)");
    }
}
