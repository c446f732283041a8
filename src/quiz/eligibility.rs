// src/quiz/eligibility.rs

//! Per (learner, course) quiz state, derived from the valid part of the result
//! ledger and the retest log. Nothing here touches the database.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::AppError,
    models::{
        result::QuizResult,
        retest::{RetestRequest, TargetType},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizState {
    NeverAttempted,
    InProgress,
    Passed,
    Exhausted,
    RetestGranted,
}

/// The learner attributes retest directives are matched against.
#[derive(Debug, Clone, Copy)]
pub struct Learner<'a> {
    pub email: &'a str,
    pub department: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Eligibility {
    pub state: QuizState,
    pub attempt_count: i64,
    pub max_attempts: i64,
    pub has_passed: bool,
    pub retest_granted: bool,
    pub can_take_quiz: bool,
}

impl Eligibility {
    /// Maps a closed state to the error shown to the learner.
    pub fn ensure_can_take(&self) -> Result<(), AppError> {
        match self.state {
            QuizState::NeverAttempted | QuizState::InProgress | QuizState::RetestGranted => Ok(()),
            QuizState::Passed => Err(AppError::AlreadyPassed),
            QuizState::Exhausted => Err(AppError::AttemptsExhausted {
                max_attempts: self.max_attempts,
            }),
        }
    }

    /// Attempt number the next submission will be recorded with.
    pub fn next_attempt_number(&self) -> i64 {
        if self.retest_granted {
            1
        } else {
            self.attempt_count + 1
        }
    }
}

/// Whether `directive` reaches `learner`.
///
/// Department directives match the learner's *current* department, so moving
/// department after a grant changes who it applies to.
pub fn retest_targets(directive: &RetestRequest, learner: &Learner<'_>) -> bool {
    match directive.target_type {
        TargetType::All => true,
        TargetType::Department => directive.target_value.as_deref() == Some(learner.department),
        TargetType::Individual => directive
            .target_value
            .as_deref()
            .is_some_and(|email| email.eq_ignore_ascii_case(learner.email)),
    }
}

/// Derives the quiz state.
///
/// `results` may contain invalidated rows; only valid ones count. Directives
/// dated after `now` are ignored.
pub fn evaluate(
    learner: &Learner<'_>,
    max_attempts: i64,
    results: &[QuizResult],
    retests: &[RetestRequest],
    now: DateTime<Utc>,
) -> Eligibility {
    let max_attempts = max_attempts.max(1);
    let valid: Vec<&QuizResult> = results.iter().filter(|r| r.is_valid).collect();
    let attempt_count = valid.len() as i64;
    let has_passed = valid.iter().any(|r| r.passed);
    let last_completion = valid.iter().map(|r| r.completed_at).max();

    let retest_granted = retests.iter().any(|directive| {
        directive.created_at <= now
            && retest_targets(directive, learner)
            && last_completion.is_none_or(|last| directive.created_at > last)
    });

    let state = if retest_granted {
        QuizState::RetestGranted
    } else if has_passed {
        QuizState::Passed
    } else if attempt_count >= max_attempts {
        QuizState::Exhausted
    } else if attempt_count == 0 {
        QuizState::NeverAttempted
    } else {
        QuizState::InProgress
    };

    Eligibility {
        state,
        attempt_count,
        max_attempts,
        has_passed,
        retest_granted,
        can_take_quiz: matches!(
            state,
            QuizState::NeverAttempted | QuizState::InProgress | QuizState::RetestGranted
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use sqlx::types::Json;

    const EMAIL: &str = "learner@corp.com";
    const DEPT: &str = "Back-office";

    fn learner() -> Learner<'static> {
        Learner {
            email: EMAIL,
            department: DEPT,
        }
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn result(minute: i64, passed: bool, valid: bool) -> QuizResult {
        QuizResult {
            id: minute,
            user_email: EMAIL.to_string(),
            course_id: 1,
            score: if passed { 4 } else { 1 },
            total: 4,
            passed,
            answers_json: Json(Default::default()),
            attempt_number: 1,
            is_valid: valid,
            completed_at: at(minute),
        }
    }

    fn retest(minute: i64, target_type: TargetType, value: Option<&str>) -> RetestRequest {
        RetestRequest {
            id: minute,
            course_id: 1,
            target_type,
            target_value: value.map(str::to_string),
            requested_by: "admin@corp.com".to_string(),
            created_at: at(minute),
        }
    }

    fn now() -> DateTime<Utc> {
        at(10_000)
    }

    #[test]
    fn test_never_attempted() {
        let e = evaluate(&learner(), 3, &[], &[], now());
        assert_eq!(e.state, QuizState::NeverAttempted);
        assert!(e.can_take_quiz);
        assert_eq!(e.next_attempt_number(), 1);
    }

    #[test]
    fn test_in_progress_after_failures() {
        let results = [result(1, false, true), result(2, false, true)];
        let e = evaluate(&learner(), 3, &results, &[], now());
        assert_eq!(e.state, QuizState::InProgress);
        assert_eq!(e.attempt_count, 2);
        assert_eq!(e.next_attempt_number(), 3);
    }

    #[test]
    fn test_exhausted_at_max_attempts() {
        let results = [
            result(1, false, true),
            result(2, false, true),
            result(3, false, true),
        ];
        let e = evaluate(&learner(), 3, &results, &[], now());
        assert_eq!(e.state, QuizState::Exhausted);
        assert!(!e.can_take_quiz);
        assert!(matches!(
            e.ensure_can_take(),
            Err(AppError::AttemptsExhausted { max_attempts: 3 })
        ));
    }

    #[test]
    fn test_passed_blocks_further_attempts() {
        let results = [result(1, false, true), result(2, true, true)];
        let e = evaluate(&learner(), 3, &results, &[], now());
        assert_eq!(e.state, QuizState::Passed);
        assert!(matches!(e.ensure_can_take(), Err(AppError::AlreadyPassed)));
    }

    #[test]
    fn test_invalid_results_are_ignored() {
        let results = [
            result(1, true, false),
            result(2, false, false),
            result(3, false, false),
        ];
        let e = evaluate(&learner(), 3, &results, &[], now());
        assert_eq!(e.state, QuizState::NeverAttempted);
        assert_eq!(e.attempt_count, 0);
    }

    #[test]
    fn test_retest_after_last_result_overrides_exhausted() {
        let results = [
            result(1, false, true),
            result(2, false, true),
            result(3, false, true),
        ];
        let retests = [retest(5, TargetType::All, None)];
        let e = evaluate(&learner(), 3, &results, &retests, now());
        assert_eq!(e.state, QuizState::RetestGranted);
        assert!(e.can_take_quiz);
        assert_eq!(e.next_attempt_number(), 1);
    }

    #[test]
    fn test_retest_overrides_passed() {
        let results = [result(1, true, true)];
        let retests = [retest(2, TargetType::Individual, Some("Learner@Corp.com"))];
        let e = evaluate(&learner(), 3, &results, &retests, now());
        assert_eq!(e.state, QuizState::RetestGranted);
        assert!(e.has_passed);
    }

    #[test]
    fn test_retest_before_last_result_is_consumed() {
        let results = [result(1, true, false), result(10, true, true)];
        let retests = [retest(5, TargetType::All, None)];
        let e = evaluate(&learner(), 3, &results, &retests, now());
        assert_eq!(e.state, QuizState::Passed);
    }

    #[test]
    fn test_retest_timestamp_equal_to_completion_does_not_grant() {
        let results = [result(5, true, true)];
        let retests = [retest(5, TargetType::All, None)];
        let e = evaluate(&learner(), 3, &results, &retests, now());
        assert_eq!(e.state, QuizState::Passed);
    }

    #[test]
    fn test_retest_with_no_prior_result_is_granted() {
        let retests = [retest(5, TargetType::All, None)];
        let e = evaluate(&learner(), 3, &[], &retests, now());
        assert_eq!(e.state, QuizState::RetestGranted);
    }

    #[test]
    fn test_department_retest_matches_current_department_only() {
        let results = [result(1, true, true)];
        let other = [retest(2, TargetType::Department, Some("Management"))];
        assert_eq!(
            evaluate(&learner(), 3, &results, &other, now()).state,
            QuizState::Passed
        );

        let mine = [retest(2, TargetType::Department, Some(DEPT))];
        assert_eq!(
            evaluate(&learner(), 3, &results, &mine, now()).state,
            QuizState::RetestGranted
        );
    }

    #[test]
    fn test_individual_retest_for_someone_else_is_ignored() {
        let results = [result(1, true, true)];
        let retests = [retest(2, TargetType::Individual, Some("other@corp.com"))];
        let e = evaluate(&learner(), 3, &results, &retests, now());
        assert_eq!(e.state, QuizState::Passed);
    }

    #[test]
    fn test_future_dated_retest_is_ignored() {
        let results = [result(1, true, true)];
        let retests = [retest(20_000, TargetType::All, None)];
        let e = evaluate(&learner(), 3, &results, &retests, now());
        assert_eq!(e.state, QuizState::Passed);
    }

    #[test]
    fn test_non_positive_max_attempts_allows_one() {
        let e = evaluate(&learner(), 0, &[result(1, false, true)], &[], now());
        assert_eq!(e.max_attempts, 1);
        assert_eq!(e.state, QuizState::Exhausted);
    }
}
