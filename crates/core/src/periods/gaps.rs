use crate::models::{Gap, Period, PeriodEnd, YearMonth};

/// Whole months from `from` to `to`, floored at zero.
pub fn months_between(from: YearMonth, to: YearMonth) -> u32 {
    from.months_until(to)
}

/// Positive gaps between consecutive periods once sorted by start. Overlaps
/// and back-to-back periods produce no gap, and an ongoing predecessor
/// never does.
pub fn calculate_gaps(periods: &[Period]) -> Vec<Gap> {
    let mut ordered: Vec<&Period> = periods.iter().collect();
    ordered.sort_by_key(|period| period.start);

    ordered
        .windows(2)
        .filter_map(|pair| {
            let (previous, next) = (pair[0], pair[1]);
            let PeriodEnd::Month(previous_end) = previous.end else {
                return None;
            };
            let months = months_between(previous_end, next.start);
            (months > 0).then(|| Gap {
                between: format!("{} → {}", previous.label, next.label),
                months,
            })
        })
        .collect()
}

/// Months from the latest education end that precedes the earliest job start
/// to that start. `None` unless both sides have at least one period; zero
/// when no education period finished before the first job.
pub fn education_to_first_job_gap(education: &[Period], experience: &[Period]) -> Option<u32> {
    if education.is_empty() {
        return None;
    }
    let first_job_start = experience.iter().map(|period| period.start).min()?;
    let months = education
        .iter()
        .filter_map(|period| period.end.as_month())
        .filter(|end| *end <= first_job_start)
        .max()
        .map_or(0, |end| months_between(end, first_job_start));
    Some(months)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    fn period(label: &str, start: YearMonth, end: PeriodEnd) -> Period {
        Period::new(label, start, end)
    }

    #[test]
    fn gaps_follow_start_order() {
        let periods = vec![
            period("B", ym(2021, 3), PeriodEnd::Month(ym(2022, 1))),
            period("A", ym(2019, 1), PeriodEnd::Month(ym(2020, 6))),
        ];
        let gaps = calculate_gaps(&periods);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].between, "A → B");
        assert_eq!(gaps[0].months, 9);
    }

    #[test]
    fn overlaps_and_ongoing_predecessors_yield_nothing() {
        let periods = vec![
            period("A", ym(2019, 1), PeriodEnd::Ongoing),
            period("B", ym(2019, 6), PeriodEnd::Month(ym(2020, 1))),
            period("C", ym(2019, 12), PeriodEnd::Month(ym(2021, 1))),
        ];
        assert!(calculate_gaps(&periods).is_empty());
        assert!(calculate_gaps(&periods[..1]).is_empty());
        assert!(calculate_gaps(&[]).is_empty());
    }

    #[test]
    fn gaps_are_never_negative() {
        let periods = vec![
            period("A", ym(2018, 1), PeriodEnd::Month(ym(2022, 1))),
            period("B", ym(2019, 1), PeriodEnd::Month(ym(2019, 6))),
        ];
        let gaps = calculate_gaps(&periods);
        assert!(gaps.iter().all(|gap| gap.months > 0));
        assert!(gaps.len() < periods.len());
    }

    #[test]
    fn education_to_first_job_uses_latest_end_and_earliest_start() {
        let education = vec![
            period("BSc", ym(2012, 9), PeriodEnd::Month(ym(2016, 6))),
            period("MSc", ym(2016, 9), PeriodEnd::Month(ym(2018, 6))),
        ];
        let experience = vec![
            period("Engineer", ym(2019, 2), PeriodEnd::Ongoing),
            period("Intern", ym(2018, 9), PeriodEnd::Month(ym(2018, 12))),
        ];
        assert_eq!(education_to_first_job_gap(&education, &experience), Some(3));
        assert_eq!(education_to_first_job_gap(&education, &[]), None);
        assert_eq!(education_to_first_job_gap(&[], &experience), None);
    }

    #[test]
    fn only_education_finished_before_the_first_job_counts() {
        let education = vec![
            period("BSc", ym(2012, 9), PeriodEnd::Month(ym(2016, 6))),
            period("MSc", ym(2018, 9), PeriodEnd::Month(ym(2020, 6))),
        ];
        let experience = vec![period("Analyst", ym(2019, 6), PeriodEnd::Ongoing)];
        assert_eq!(education_to_first_job_gap(&education, &experience), Some(36));
    }

    #[test]
    fn job_before_any_graduation_counts_as_zero() {
        let education = vec![period("BSc", ym(2016, 9), PeriodEnd::Month(ym(2020, 6)))];
        let experience = vec![period("Intern", ym(2019, 6), PeriodEnd::Month(ym(2019, 9)))];
        assert_eq!(education_to_first_job_gap(&education, &experience), Some(0));
    }

    #[test]
    fn ongoing_education_never_precedes_a_job() {
        let education = vec![period("PhD", ym(2020, 9), PeriodEnd::Ongoing)];
        let experience = vec![period("Intern", ym(2021, 6), PeriodEnd::Month(ym(2021, 9)))];
        assert_eq!(education_to_first_job_gap(&education, &experience), Some(0));
        assert_eq!(months_between(ym(2020, 9), ym(2021, 3)), 6);
        assert_eq!(months_between(ym(2021, 3), ym(2020, 9)), 0);
    }
}
