//! Label composition for extracted periods.
//!
//! Date ranges rarely sit on the same line as the degree or job title they
//! belong to, so labels are assembled from a small window of neighbouring
//! lines. Education and experience use different rules; both share
//! [`find_nearest_line`].

use regex::Regex;
use std::collections::BTreeSet;

use crate::chunking::normalize_whitespace;
use crate::models::PeriodMode;

/// Line indices already consumed by an earlier period.
pub type ClaimedLines = BTreeSet<usize>;

const LABEL_BULLETS: &[char] = &['•', '\u{2023}', '\u{25e6}', '\u{2043}', '\u{2219}'];
const EDGE_NOISE: &[char] = &[' ', '-', '–', '—', '|', '\t', ',', ';', ':'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    AboveFirst,
    BelowFirst,
}

/// The line holding a date match plus the text on either side of the match.
#[derive(Debug, Clone, Copy)]
pub struct LabelContext<'a> {
    pub lines: &'a [&'a str],
    pub index: usize,
    pub before: &'a str,
    pub after: &'a str,
}

impl<'a> LabelContext<'a> {
    fn fragment(&self) -> &'a str {
        let before = self.before.trim();
        if before.is_empty() {
            self.after.trim()
        } else {
            before
        }
    }
}

/// Strips bullets, collapses whitespace and trims separator and unbalanced
/// bracket debris from both ends.
pub fn clean_entry_name(raw: &str) -> String {
    let without_bullets: String = raw.chars().filter(|ch| !LABEL_BULLETS.contains(ch)).collect();
    let collapsed = normalize_whitespace(&without_bullets);
    let mut current = collapsed.as_str();

    loop {
        let mut next = current.trim_matches(EDGE_NOISE);
        if let Some(stripped) = next.strip_suffix(['(', '[']) {
            next = stripped;
        }
        if let Some(stripped) = next.strip_prefix([')', ']']) {
            next = stripped;
        }
        if next.ends_with(')') && next.matches('(').count() < next.matches(')').count() {
            next = &next[..next.len() - 1];
        }
        if next.starts_with('(') && next.matches('(').count() > next.matches(')').count() {
            next = &next[1..];
        }
        if next.len() == current.len() {
            break;
        }
        current = next;
    }

    current.to_string()
}

/// Nearest non-blank, unclaimed line within `window` of `anchor` accepted by
/// `accept`, searching one side completely before the other.
pub fn find_nearest_line(
    lines: &[&str],
    anchor: usize,
    window: usize,
    order: SearchOrder,
    claimed: &ClaimedLines,
    accept: impl Fn(&str) -> bool,
) -> Option<usize> {
    let above = (1..=window).filter_map(|offset| anchor.checked_sub(offset));
    let below = (1..=window)
        .map(|offset| anchor + offset)
        .filter(|index| *index < lines.len());

    let candidates: Vec<usize> = match order {
        SearchOrder::AboveFirst => above.chain(below).collect(),
        SearchOrder::BelowFirst => below.chain(above).collect(),
    };

    candidates.into_iter().find(|index| {
        if claimed.contains(index) {
            return false;
        }
        let line = lines[*index].trim();
        !line.is_empty() && accept(line)
    })
}

pub struct LabelRules {
    degree: Regex,
    institution: Regex,
    gpa: Regex,
    title: Regex,
    company: Regex,
    separator: Regex,
    window: usize,
}

impl LabelRules {
    pub fn new(window: usize) -> Result<Self, regex::Error> {
        Ok(Self {
            degree: Regex::new(
                r"(?i)\b(?:masters?|bachelors?|b\.?e|b\.?tech|m\.?s|m\.?tech|bsc|msc|engineering|technology|science)\b",
            )?,
            institution: Regex::new(
                r"(?i)\b(?:university|college|institute|school|academy|mahavidyalaya|viswa|visva)\b",
            )?,
            gpa: Regex::new(r"(?i)\b(?:cgpa|gpa|score)\b")?,
            title: Regex::new(
                r"(?i)\b(?:engineer|developer|intern|analyst|manager|consultant|architect|administrator|tester|lead)\b",
            )?,
            company: Regex::new(
                r"(?i)\b(?:inc|llc|ltd|pvt|limited|solutions|technologies|systems|labs|software|corp)\b",
            )?,
            separator: Regex::new(r"(?i)\s+[-–—|]\s+|[,;(|]|\s+at\s+|\s+from\s+")?,
            window,
        })
    }

    pub fn is_education_line(&self, line: &str) -> bool {
        self.institution.is_match(line) || self.degree.is_match(line)
    }

    fn is_role_line(&self, line: &str) -> bool {
        self.title.is_match(line) || self.company.is_match(line)
    }

    pub fn label(
        &self,
        mode: PeriodMode,
        context: &LabelContext<'_>,
        claimed: &mut ClaimedLines,
    ) -> String {
        match mode {
            PeriodMode::Education => self.education_label(context, claimed),
            PeriodMode::Experience => self.experience_label(context),
        }
    }

    /// Splits "Degree - Name University" into its degree and institution parts.
    /// The institution starts after the last separator preceding its keyword.
    pub fn split_degree_and_institution(&self, line: &str) -> (String, String) {
        let Some(keyword) = self.institution.find(line) else {
            return (clean_entry_name(line), String::new());
        };

        let head = &line[..keyword.start()];
        let (degree_end, institution_start) = self
            .separator
            .find_iter(head)
            .last()
            .map(|sep| (sep.start(), sep.end()))
            .unwrap_or((keyword.start(), keyword.start()));

        (
            clean_entry_name(&line[..degree_end]),
            clean_entry_name(&line[institution_start..]),
        )
    }

    pub fn education_label(
        &self,
        context: &LabelContext<'_>,
        claimed: &mut ClaimedLines,
    ) -> String {
        let mut fragment = context.fragment();
        if self.gpa.is_match(fragment) {
            fragment = "";
        }

        let mut degree = String::new();
        let mut institution = String::new();
        let mut degree_index = None;

        if self.degree.is_match(fragment) {
            (degree, institution) = self.split_degree_and_institution(fragment);
            degree_index = Some(context.index);
        } else if let Some(found) = find_nearest_line(
            context.lines,
            context.index,
            self.window,
            SearchOrder::AboveFirst,
            claimed,
            |line| !self.gpa.is_match(line) && self.degree.is_match(line),
        ) {
            claimed.insert(found);
            (degree, institution) = self.split_degree_and_institution(context.lines[found]);
            degree_index = Some(found);
        }

        if !degree.is_empty() && institution.is_empty() {
            if let Some(anchor) = degree_index {
                let found = find_nearest_line(
                    context.lines,
                    anchor,
                    self.window,
                    SearchOrder::BelowFirst,
                    &ClaimedLines::new(),
                    |line| {
                        !self.gpa.is_match(line)
                            && !self.degree.is_match(line)
                            && self.institution.is_match(line)
                    },
                );
                if let Some(found) = found {
                    institution = clean_entry_name(context.lines[found]);
                }
            }
        }

        let label = match (degree.is_empty(), institution.is_empty()) {
            (false, false) => format!("{degree} | {institution}"),
            (false, true) => degree,
            (true, false) => institution,
            (true, true) => fragment.to_string(),
        };

        let cleaned = clean_entry_name(&label);
        if cleaned.is_empty() {
            "Education".to_string()
        } else {
            cleaned
        }
    }

    pub fn experience_label(&self, context: &LabelContext<'_>) -> String {
        let fragment = context.fragment();
        let mut picks: Vec<String> = Vec::new();
        let mut add = |line: &str| {
            let cleaned = clean_entry_name(line);
            if !cleaned.is_empty() && !picks.contains(&cleaned) {
                picks.push(cleaned);
            }
        };

        if self.is_role_line(fragment) {
            add(fragment);
        }
        for index in (context.index.saturating_sub(2)..context.index).rev() {
            if self.is_role_line(context.lines[index]) {
                add(context.lines[index]);
            }
        }
        if let Some(next) = context.lines.get(context.index + 1) {
            if self.is_role_line(next) {
                add(next);
            }
        }

        // Nearest title, then the nearest line that names only a company.
        let title = picks.iter().find(|pick| self.title.is_match(pick));
        let company = picks
            .iter()
            .find(|pick| self.company.is_match(pick) && !self.title.is_match(pick));

        match (title, company) {
            (Some(title), Some(company)) => format!("{title} | {company}"),
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => {
                let cleaned = clean_entry_name(fragment);
                if cleaned.is_empty() {
                    "Experience".to_string()
                } else {
                    cleaned
                }
            }
        }
    }
}
