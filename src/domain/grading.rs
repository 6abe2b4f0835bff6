//! Score-to-grade-point mapping and credit aggregation. Pure math.

use crate::domain::{CourseType, CreditSummary, TranscriptRow};

/// Credits needed to graduate.
pub const GRADUATION_CREDITS: f64 = 160.0;

/// Inclusive lower bounds, highest matching band wins.
const GRADE_BANDS: &[(f64, f64)] = &[
    (90.0, 4.0),
    (85.0, 3.7),
    (82.0, 3.3),
    (78.0, 3.0),
    (75.0, 2.7),
    (72.0, 2.3),
    (68.0, 2.0),
    (64.0, 1.5),
    (60.0, 1.0),
];

/// Map a percentage score to the 4.0 scale.
pub fn grade_point(score: f64) -> f64 {
    GRADE_BANDS
        .iter()
        .find(|(min, _)| score >= *min)
        .map(|(_, point)| *point)
        .unwrap_or(0.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Credit-weighted GPA over approved `(credit, score)` pairs, rounded to
/// two decimals. Zero total credits yields 0.0, not an error.
pub fn weighted_gpa(rows: &[(f64, f64)]) -> f64 {
    let credits: f64 = rows.iter().map(|(credit, _)| credit).sum();
    if credits <= 0.0 {
        return 0.0;
    }
    let points: f64 = rows
        .iter()
        .map(|(credit, score)| credit * grade_point(*score))
        .sum();
    round2(points / credits)
}

/// Split approved credits by course type and derive graduation progress.
pub fn summarize_credits(rows: &[TranscriptRow]) -> CreditSummary {
    let mut required = 0.0;
    let mut elective = 0.0;
    for row in rows {
        match row.kind {
            CourseType::Required => required += row.credit,
            CourseType::Elective => elective += row.credit,
        }
    }
    let total = required + elective;
    CreditSummary {
        total: round2(total),
        required: round2(required),
        elective: round2(elective),
        remaining: round2(GRADUATION_CREDITS - total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(credit: f64, score: f64, kind: CourseType) -> TranscriptRow {
        TranscriptRow {
            course_name: "x".into(),
            credit,
            score,
            kind,
            semester: "2023-1".into(),
        }
    }

    #[test]
    fn test_grade_point_band_edges() {
        let cases = [
            (100.0, 4.0),
            (90.0, 4.0),
            (89.9, 3.7),
            (85.0, 3.7),
            (82.0, 3.3),
            (78.0, 3.0),
            (75.0, 2.7),
            (72.0, 2.3),
            (68.0, 2.0),
            (64.0, 1.5),
            (60.0, 1.0),
            (59.9, 0.0),
            (0.0, 0.0),
        ];
        for (score, expected) in cases {
            assert_eq!(grade_point(score), expected, "score {score}");
        }
    }

    #[test]
    fn test_weighted_gpa_zero_credits() {
        assert_eq!(weighted_gpa(&[]), 0.0);
    }

    #[test]
    fn test_weighted_gpa_single_course() {
        assert_eq!(weighted_gpa(&[(4.0, 92.0)]), 4.0);
    }

    #[test]
    fn test_weighted_gpa_mixed_and_rounded() {
        // (4*4.0 + 2*1.0) / 6 = 3.0
        assert_eq!(weighted_gpa(&[(4.0, 95.0), (2.0, 61.0)]), 3.0);
        // (3*3.7 + 1*2.0) / 4 = 3.275 -> 3.28
        assert_eq!(weighted_gpa(&[(3.0, 86.0), (1.0, 70.0)]), 3.28);
    }

    #[test]
    fn test_summarize_credits_splits_by_type() {
        let rows = vec![
            row(4.0, 92.0, CourseType::Required),
            row(2.0, 80.0, CourseType::Elective),
            row(3.0, 75.0, CourseType::Required),
        ];
        let summary = summarize_credits(&rows);
        assert_eq!(summary.total, 9.0);
        assert_eq!(summary.required, 7.0);
        assert_eq!(summary.elective, 2.0);
        assert_eq!(summary.remaining, 151.0);
        assert_eq!(summary.total, summary.required + summary.elective);
    }

    #[test]
    fn test_summarize_credits_empty() {
        let summary = summarize_credits(&[]);
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.remaining, GRADUATION_CREDITS);
    }
}
