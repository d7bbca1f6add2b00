//! Education and experience timelines extracted from free text.

pub mod dates;
pub mod gaps;
pub mod labels;

pub use dates::{parse_end, parse_month, DateMatch, DatePatterns};
pub use gaps::{calculate_gaps, education_to_first_job_gap, months_between};
pub use labels::{
    clean_entry_name, find_nearest_line, ClaimedLines, LabelContext, LabelRules, SearchOrder,
};

use std::collections::HashSet;
use tracing::debug;

use crate::error::PipelineError;
use crate::models::{Period, PeriodEnd, PeriodMode, YearMonth};

pub struct PeriodExtractor {
    dates: DatePatterns,
    labels: LabelRules,
}

impl PeriodExtractor {
    pub fn new(context_window: usize) -> Result<Self, PipelineError> {
        Ok(Self {
            dates: DatePatterns::new()?,
            labels: LabelRules::new(context_window)?,
        })
    }

    pub fn label_rules(&self) -> &LabelRules {
        &self.labels
    }

    /// Labeled periods found in `lines`, deduplicated and sorted by
    /// (start, end). Unparseable or reversed date candidates are dropped.
    pub fn extract_periods<S: AsRef<str>>(&self, lines: &[S], mode: PeriodMode) -> Vec<Period> {
        let lines: Vec<&str> = lines.iter().map(|line| line.as_ref()).collect();
        let mut claimed = ClaimedLines::new();
        let mut periods = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let mut matches = self.dates.ranges(line);
            if matches.is_empty() {
                matches.extend(self.dates.single(line));
            }

            for found in matches {
                let Some((start, end)) = resolve(&found) else {
                    debug!(line = index, candidate = found.start, "discarded date candidate");
                    continue;
                };
                let context = LabelContext {
                    lines: &lines,
                    index,
                    before: &line[..found.span.0],
                    after: &line[found.span.1..],
                };
                let label = self.labels.label(mode, &context, &mut claimed);
                periods.push(Period::new(label, start, end));
            }
        }

        let mut seen = HashSet::new();
        periods.retain(|period| {
            seen.insert((period.label.to_lowercase(), period.start, period.end))
        });
        periods.sort_by_key(|period| (period.start, period.end));
        periods
    }
}

fn resolve(found: &DateMatch<'_>) -> Option<(YearMonth, PeriodEnd)> {
    let start = parse_month(found.start)?;
    let end = match found.end {
        Some(token) => parse_end(token)?,
        None => PeriodEnd::Ongoing,
    };
    (end >= PeriodEnd::Month(start)).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Bachelor of Technology in Computer Science - ABC University (2016 - 2020)\nData Analyst at XYZ Solutions (Jul 2020 - Present)";

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn sample_education_and_experience() -> Result<(), Box<dyn std::error::Error>> {
        let extractor = PeriodExtractor::new(6)?;
        let lines: Vec<&str> = SAMPLE.lines().collect();

        let education = extractor.extract_periods(&lines[..1], PeriodMode::Education);
        assert_eq!(education.len(), 1);
        assert!(education[0].label.contains("Bachelor of Technology in Computer Science"));
        assert!(education[0].label.contains("ABC University"));
        assert_eq!(education[0].start, ym(2016, 1));
        assert_eq!(education[0].end, PeriodEnd::Month(ym(2020, 1)));

        let experience = extractor.extract_periods(&lines[1..], PeriodMode::Experience);
        assert_eq!(experience.len(), 1);
        assert!(experience[0].end.is_ongoing());
        assert_eq!(experience[0].label, "Data Analyst at XYZ Solutions");

        let gap = education_to_first_job_gap(&education, &experience);
        assert!(matches!(gap, Some(months) if months <= 6));
        Ok(())
    }

    #[test]
    fn periods_are_sorted_and_never_reversed() -> Result<(), Box<dyn std::error::Error>> {
        let extractor = PeriodExtractor::new(6)?;
        let lines = [
            "Senior Engineer, Beta Labs",
            "Mar 2021 - Present",
            "Junior Developer, Alpha Inc",
            "Jan 2018 - Feb 2021",
            "Reviewer 2022 - 2019",
            "Intern 13/2015 - 2016",
        ];
        let periods = extractor.extract_periods(&lines, PeriodMode::Experience);

        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].start, ym(2018, 1));
        assert_eq!(periods[1].start, ym(2021, 3));
        for period in &periods {
            assert!(period.end >= PeriodEnd::Month(period.start));
        }
        Ok(())
    }

    #[test]
    fn duplicates_collapse_case_insensitively() -> Result<(), Box<dyn std::error::Error>> {
        let extractor = PeriodExtractor::new(6)?;
        let lines = [
            "Data Engineer at Acme Systems (2019 - 2021)",
            "",
            "",
            "",
            "DATA ENGINEER AT ACME SYSTEMS (2019 - 2021)",
        ];
        let periods = extractor.extract_periods(&lines, PeriodMode::Experience);
        assert_eq!(periods.len(), 1);
        Ok(())
    }

    #[test]
    fn single_dates_are_open_ended() -> Result<(), Box<dyn std::error::Error>> {
        let extractor = PeriodExtractor::new(6)?;
        let lines = ["Master of Science, Stanford University", "Expected May 2025"];
        let periods = extractor.extract_periods(&lines, PeriodMode::Education);

        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].start, ym(2025, 5));
        assert!(periods[0].end.is_ongoing());
        assert_eq!(periods[0].label, "Master of Science | Stanford University");
        Ok(())
    }

    #[test]
    fn blank_and_dateless_lines_yield_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let extractor = PeriodExtractor::new(6)?;
        let lines = ["", "   ", "Python, SQL, Tableau", "Call 555-1234"];
        assert!(extractor
            .extract_periods(&lines, PeriodMode::Education)
            .is_empty());
        Ok(())
    }

    #[test]
    fn two_ranges_do_not_share_a_degree_line() -> Result<(), Box<dyn std::error::Error>> {
        let extractor = PeriodExtractor::new(6)?;
        let lines = [
            "Master of Science in Data Science",
            "Bachelor of Engineering",
            "2019 - 2021",
            "2015 - 2019",
        ];
        let periods = extractor.extract_periods(&lines, PeriodMode::Education);
        let labels: Vec<&str> = periods.iter().map(|period| period.label.as_str()).collect();
        assert_eq!(labels, vec!["Master of Science in Data Science", "Bachelor of Engineering"]);
        Ok(())
    }
}
