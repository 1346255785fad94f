//! Habit compliance arithmetic.

use chrono::{Duration, NaiveDate};

/// Number of completion slots a day can carry.
pub const MAX_SLOTS: usize = 4;

/// Derived compliance score for one day of one habit, in [0, 1].
///
/// `done` carries the four slot flags as supplied by the caller; a habit
/// tracks `slots_per_day` of them (1..=4). The score is completed slots
/// over tracked slots.
pub fn compliance_score(done: &[Option<bool>; MAX_SLOTS], slots_per_day: u8) -> f64 {
    let tracked = slots_per_day.clamp(1, MAX_SLOTS as u8) as f64;
    let completed = done.iter().flatten().filter(|flag| **flag).count() as f64;
    (completed / tracked).clamp(0.0, 1.0)
}

/// Length of the unbroken run of tracked days ending at `today` (or
/// yesterday, so an un-logged current day does not break a streak).
///
/// `dates` must be distinct; order does not matter.
pub fn current_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut sorted: Vec<NaiveDate> = dates.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut cursor = if sorted.last() == Some(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    for date in sorted.iter().rev() {
        if *date == cursor {
            streak += 1;
            cursor = cursor - Duration::days(1);
        } else if *date < cursor {
            break;
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_score_full_day() {
        let done = [Some(true), Some(true), Some(true), Some(true)];
        assert_eq!(compliance_score(&done, 4), 1.0);
    }

    #[test]
    fn test_score_partial_day() {
        let done = [Some(true), Some(false), None, None];
        assert_eq!(compliance_score(&done, 4), 0.25);
        assert_eq!(compliance_score(&done, 2), 0.5);
    }

    #[test]
    fn test_score_clamps_excess_completions() {
        // A habit tracking one slot with several flags set stays at 1.0.
        let done = [Some(true), Some(true), None, None];
        assert_eq!(compliance_score(&done, 1), 1.0);
    }

    #[test]
    fn test_score_zero_slots_treated_as_one() {
        let done = [Some(true), None, None, None];
        assert_eq!(compliance_score(&done, 0), 1.0);
    }

    #[test]
    fn test_streak_counts_back_from_today() {
        let dates = [day("2026-08-02"), day("2026-08-03"), day("2026-08-04")];
        assert_eq!(current_streak(&dates, day("2026-08-04")), 3);
    }

    #[test]
    fn test_streak_survives_unlogged_today() {
        let dates = [day("2026-08-02"), day("2026-08-03")];
        assert_eq!(current_streak(&dates, day("2026-08-04")), 2);
    }

    #[test]
    fn test_streak_broken_by_gap() {
        let dates = [day("2026-08-01"), day("2026-08-03"), day("2026-08-04")];
        assert_eq!(current_streak(&dates, day("2026-08-04")), 2);
    }

    #[test]
    fn test_streak_empty() {
        assert_eq!(current_streak(&[], day("2026-08-04")), 0);
    }
}
