use std::collections::{BTreeMap, HashSet};

use crate::periods::LabelRules;

pub const DEFAULT_SECTION: &str = "misc";

const HEADERS: [&str; 8] = [
    "education",
    "experience",
    "work experience",
    "professional experience",
    "projects",
    "skills",
    "certifications",
    "achievements",
];

const EXPERIENCE_SECTIONS: [&str; 3] = ["experience", "work experience", "professional experience"];

/// Trimmed résumé lines grouped under the last header seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeSections {
    sections: BTreeMap<String, Vec<String>>,
}

fn header_name(line: &str) -> Option<&'static str> {
    let lowered = line.trim().trim_end_matches(':').trim_end().to_lowercase();
    HEADERS.into_iter().find(|header| *header == lowered)
}

pub fn split_sections(text: &str) -> ResumeSections {
    let mut sections: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut current = DEFAULT_SECTION;
    sections.insert(current.to_string(), Vec::new());

    for line in text.lines().map(str::trim) {
        match header_name(line) {
            Some(header) => {
                current = header;
                sections.entry(current.to_string()).or_default();
            }
            None => sections
                .entry(current.to_string())
                .or_default()
                .push(line.to_string()),
        }
    }

    ResumeSections { sections }
}

impl ResumeSections {
    pub fn get(&self, name: &str) -> &[String] {
        self.sections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The education section plus unsectioned lines that mention a degree or
    /// institution.
    pub fn education_lines(&self, rules: &LabelRules) -> Vec<String> {
        let mut lines = self.get("education").to_vec();
        lines.extend(
            self.get(DEFAULT_SECTION)
                .iter()
                .filter(|line| rules.is_education_line(line))
                .cloned(),
        );
        lines
    }

    /// The experience sections in order, or, when the résumé has none, every
    /// non-blank line of `text` not already used for education.
    pub fn experience_lines(&self, text: &str, education: &[String]) -> Vec<String> {
        let lines: Vec<String> = EXPERIENCE_SECTIONS
            .iter()
            .flat_map(|name| self.get(name).iter().cloned())
            .collect();
        if !lines.is_empty() {
            return lines;
        }

        let used: HashSet<&str> = education.iter().map(String::as_str).collect();
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !used.contains(line))
            .map(str::to_string)
            .collect()
    }
}
