//! Enrollment eligibility rules. Pure logic, no store access.
//!
//! The workflow fetches the student's active slots and completed
//! prerequisite codes, then evaluates here. Conflict check runs first;
//! the first failure wins.

use crate::domain::TimeSlot;
use std::collections::HashSet;

/// First active enrollment whose slot collides with the target, if any.
///
/// A target course without a recorded slot can never collide, and a
/// student with no active enrollments is always clear.
pub fn find_schedule_conflict<'a>(
    active: &'a [(String, TimeSlot)],
    target: Option<&TimeSlot>,
) -> Option<&'a str> {
    let target = target?;
    active
        .iter()
        .find(|(_, slot)| slot.conflicts_with(target))
        .map(|(code, _)| code.as_str())
}

/// Distinct, non-blank course codes from a prerequisite list.
///
/// Duplicates must never inflate the requirement, so everything
/// downstream (the completed-codes query included) works on this set.
pub fn distinct_codes(prerequisites: &[String]) -> Vec<String> {
    let mut codes: Vec<String> = prerequisites
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_owned)
        .collect();
    codes.sort_unstable();
    codes.dedup();
    codes
}

/// Distinct required codes the student has not completed. Empty means
/// the prerequisite check passes.
pub fn missing_prerequisites(
    prerequisites: &[String],
    completed: &HashSet<String>,
) -> Vec<String> {
    distinct_codes(prerequisites)
        .into_iter()
        .filter(|code| !completed.contains(code))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(s: &str) -> TimeSlot {
        s.parse().unwrap()
    }

    #[test]
    fn test_conflict_on_shared_weekday_and_period() {
        let active = vec![
            ("CS101".to_string(), slot("周一-1,2")),
            ("MA201".to_string(), slot("周二-3,4")),
        ];
        let target = slot("周二-4,5");
        assert_eq!(
            find_schedule_conflict(&active, Some(&target)),
            Some("MA201")
        );
    }

    #[test]
    fn test_no_conflict_on_disjoint_periods_or_weekdays() {
        let active = vec![("CS101".to_string(), slot("周二-1,2"))];
        assert_eq!(find_schedule_conflict(&active, Some(&slot("周二-3,4"))), None);
        assert_eq!(find_schedule_conflict(&active, Some(&slot("周三-1,2"))), None);
    }

    #[test]
    fn test_no_conflict_without_target_slot_or_active_enrollments() {
        let active = vec![("CS101".to_string(), slot("周二-1,2"))];
        assert_eq!(find_schedule_conflict(&active, None), None);
        assert_eq!(find_schedule_conflict(&[], Some(&slot("周二-1,2"))), None);
    }

    #[test]
    fn test_distinct_codes_drops_blanks_and_duplicates() {
        let prereqs = vec![
            "CS101".to_string(),
            "".to_string(),
            " ".to_string(),
            "CS101".to_string(),
            "MA101".to_string(),
        ];
        assert_eq!(distinct_codes(&prereqs), vec!["CS101", "MA101"]);
    }

    #[test]
    fn test_missing_prerequisites_duplicates_never_inflate() {
        let prereqs = vec!["CS101".to_string(), "CS101".to_string()];
        let completed = HashSet::from(["CS101".to_string()]);
        assert!(missing_prerequisites(&prereqs, &completed).is_empty());
    }

    #[test]
    fn test_missing_prerequisites_reports_unmet_codes() {
        let prereqs = vec!["CS101".to_string(), "MA101".to_string()];
        let completed = HashSet::from(["CS101".to_string()]);
        assert_eq!(missing_prerequisites(&prereqs, &completed), vec!["MA101"]);
    }

    #[test]
    fn test_empty_prerequisites_pass_trivially() {
        assert!(missing_prerequisites(&[], &HashSet::new()).is_empty());
    }
}
