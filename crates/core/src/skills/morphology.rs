//! Shape-only skill detection. No keyword or stop-word lists are involved:
//! a token is accepted purely on how it is spelled.

use regex::Regex;

use crate::error::ModelError;
use crate::models::PipelineOptions;
use crate::traits::SkillStrategy;

const TECH_SUFFIXES: [&str; 7] = ["sql", "js", "ml", "db", "ops", "api", "sdk"];

fn is_tech_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '+' | '.' | '#' | '-')
}

/// Returns true when `candidate` is shaped like a technology or tool name.
pub fn is_skill_like(candidate: &str) -> bool {
    let s = candidate
        .trim()
        .trim_start_matches(|ch: char| !is_tech_char(ch))
        .trim_end_matches(|ch: char| !is_tech_char(ch));
    if s.is_empty() {
        return false;
    }

    // C#, C++, .NET, Node.js, S3
    if s.chars().any(|ch| ch.is_ascii_digit() || matches!(ch, '+' | '#' | '.')) {
        return true;
    }

    let len = s.chars().count();

    // SQL, AWS, NLP
    if (2..=6).contains(&len) && s.chars().all(|ch| ch.is_ascii_uppercase()) {
        return true;
    }

    // ReactJS, iOS, PowerShell, "Power BI"
    if s.chars().skip(1).any(|ch| ch.is_ascii_uppercase()) {
        return true;
    }

    if !s.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return false;
    }

    // all-lowercase words are ordinary prose
    if s.chars().all(|ch| ch.is_ascii_lowercase()) {
        return false;
    }

    if len <= 2 {
        return true;
    }

    let capitalized = s.chars().next().is_some_and(|ch| ch.is_ascii_uppercase());
    if (3..=4).contains(&len) && capitalized {
        return true;
    }

    let lowered = s.to_ascii_lowercase();
    len >= 5 && TECH_SUFFIXES.iter().any(|suffix| lowered.ends_with(suffix))
}

/// Fallback rung: tokenizes by word shape and keeps whatever passes
/// [`is_skill_like`].
pub struct MorphologyStrategy {
    token_re: Regex,
}

impl MorphologyStrategy {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token_re: Regex::new(r"[A-Za-z][A-Za-z0-9+#.\-]{1,30}")?,
        })
    }
}

impl SkillStrategy for MorphologyStrategy {
    fn name(&self) -> &'static str {
        "morphology"
    }

    fn candidates(
        &self,
        normalized: &str,
        _options: &PipelineOptions,
    ) -> Result<Vec<String>, ModelError> {
        Ok(self
            .token_re
            .find_iter(normalized)
            .map(|token| token.as_str().trim_end_matches(['.', '-']))
            .filter(|token| is_skill_like(token))
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_and_digits_are_strong_signals() {
        for token in ["C++", "C#", ".NET", "Node.js", "S3", "HTML5"] {
            assert!(is_skill_like(token), "{token} should be accepted");
        }
    }

    #[test]
    fn acronyms_and_mixed_case_are_accepted() {
        for token in ["SQL", "AWS", "NLP", "ReactJS", "PowerShell", "iOS", "Power BI"] {
            assert!(is_skill_like(token), "{token} should be accepted");
        }
    }

    #[test]
    fn lowercase_prose_is_rejected() {
        for token in ["development", "in", "of", "processes", "python"] {
            assert!(!is_skill_like(token), "{token} should be rejected");
        }
    }

    #[test]
    fn plain_capitalized_words_follow_length_rules() {
        assert!(is_skill_like("Go"));
        assert!(is_skill_like("R"));
        assert!(is_skill_like("Java"));
        assert!(is_skill_like("Git"));
        assert!(is_skill_like("MySql"));
        assert!(is_skill_like("Mongodb"));
        assert!(is_skill_like("Devops"));
        assert!(!is_skill_like("Python"));
        assert!(!is_skill_like("Analyst"));
    }

    #[test]
    fn surrounding_punctuation_is_ignored() {
        assert!(is_skill_like("(SQL)"));
        assert!(!is_skill_like("***"));
        assert!(!is_skill_like(""));
    }

    #[test]
    fn fallback_scans_by_shape() -> Result<(), Box<dyn std::error::Error>> {
        let strategy = MorphologyStrategy::new()?;
        let found = strategy.candidates(
            "Built dashboards in Power BI with SQL and C++ services. Node.js.",
            &PipelineOptions::default(),
        )?;
        assert!(found.contains(&"SQL".to_string()));
        assert!(found.contains(&"C++".to_string()));
        assert!(found.contains(&"Node.js".to_string()));
        assert!(found.contains(&"BI".to_string()));
        assert!(!found.iter().any(|token| token == "dashboards"));
        Ok(())
    }
}
