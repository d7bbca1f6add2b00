use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::models::{PeriodEnd, YearMonth};

const MONTHS: &str = r"(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)";
const SEASONS: &str = r"(?:Spring|Summer|Fall|Autumn|Winter)";
const CONNECTORS: &str = r"(?:-|–|—|\bto\b|\buntil\b|\bthrough\b|\bthru\b)";
const OPEN_ENDED: &str = r"(?:\bpresent\b|\bcurrent\b|\bnow\b)";

/// Years outside this window are treated as noise (phone numbers, IDs).
const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 1900..=2100;

fn date_token() -> String {
    format!(r"(?:\b(?:{MONTHS}|{SEASONS})\.?\s+\d{{4}}\b|\b\d{{1,2}}[/-]\d{{4}}\b|\b\d{{4}}\b)")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateMatch<'a> {
    pub start: &'a str,
    pub end: Option<&'a str>,
    pub span: (usize, usize),
}

pub struct DatePatterns {
    range: Regex,
    single: Regex,
}

impl DatePatterns {
    pub fn new() -> Result<Self, regex::Error> {
        let token = date_token();
        Ok(Self {
            range: Regex::new(&format!(
                r"(?i)(?P<start>{token})\s*{CONNECTORS}\s*(?P<end>{token}|{OPEN_ENDED})"
            ))?,
            single: Regex::new(&format!(
                r"(?i)\b(?P<single>(?:{MONTHS}|{SEASONS})\.?\s+\d{{4}})\b"
            ))?,
        })
    }

    /// Every explicit `<date> <connector> <date|present>` range in `line`.
    pub fn ranges<'a>(&self, line: &'a str) -> Vec<DateMatch<'a>> {
        self.range
            .captures_iter(line)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                Some(DateMatch {
                    start: captures.name("start")?.as_str(),
                    end: Some(captures.name("end")?.as_str()),
                    span: (whole.start(), whole.end()),
                })
            })
            .collect()
    }

    /// First lone month-or-season + year token in `line`.
    pub fn single<'a>(&self, line: &'a str) -> Option<DateMatch<'a>> {
        let captures = self.single.captures(line)?;
        let token = captures.name("single")?;
        Some(DateMatch {
            start: token.as_str(),
            end: None,
            span: (token.start(), token.end()),
        })
    }
}

fn season_month(word: &str) -> Option<u32> {
    match word {
        "spring" => Some(3),
        "summer" => Some(6),
        "fall" | "autumn" => Some(9),
        "winter" => Some(12),
        _ => None,
    }
}

/// Month of an English month name. Only the three-letter abbreviation is
/// read, so "Sept" and "September" both resolve.
fn month_number(word: &str) -> Option<u32> {
    let abbreviation: String = word.chars().take(3).collect();
    NaiveDate::parse_from_str(&format!("1 {abbreviation} 2000"), "%d %b %Y")
        .ok()
        .map(|date| date.month())
}

fn parse_year(value: &str) -> Option<i32> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|year| PLAUSIBLE_YEARS.contains(year))
}

/// Parses a concrete date token to month granularity. Missing months default
/// to January; seasons map to their representative month.
pub fn parse_month(token: &str) -> Option<YearMonth> {
    let lowered = token.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    if let Some((word, year)) = lowered.split_once(char::is_whitespace) {
        let word = word.trim_end_matches('.');
        let month = season_month(word).or_else(|| month_number(word))?;
        return YearMonth::new(parse_year(year)?, month);
    }

    if let Some((month, year)) = lowered.split_once(['/', '-']) {
        let month = month.parse::<u32>().ok()?;
        return YearMonth::new(parse_year(year)?, month);
    }

    YearMonth::new(parse_year(&lowered)?, 1)
}

/// Like [`parse_month`], but also understands the open-ended markers.
pub fn parse_end(token: &str) -> Option<PeriodEnd> {
    match token.trim().to_lowercase().as_str() {
        "present" | "current" | "now" => Some(PeriodEnd::Ongoing),
        _ => parse_month(token).map(PeriodEnd::Month),
    }
}
