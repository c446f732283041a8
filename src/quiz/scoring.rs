// src/quiz/scoring.rs

use std::collections::{BTreeMap, HashMap, HashSet};

/// Outcome of scoring one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scored {
    pub score: i64,

    /// Number of presented questions that belong to the course.
    pub total: i64,

    /// Question id -> chosen letter, empty for unanswered.
    pub answers: BTreeMap<i64, String>,
}

/// Scores a submission against the course's answer keys.
///
/// `presented` is the ordered list of ids shown to the learner. Ids missing from
/// `answer_keys` are dropped without error and repeated ids count once.
/// A missing answer counts as wrong. Letters are compared trimmed and lower-cased.
pub fn score_submission(
    presented: &[i64],
    answer_keys: &HashMap<i64, String>,
    submitted: &HashMap<i64, String>,
) -> Scored {
    let mut seen = HashSet::new();
    let mut answers = BTreeMap::new();
    let mut score = 0;

    for id in presented {
        let Some(correct) = answer_keys.get(id) else {
            continue;
        };
        if !seen.insert(*id) {
            continue;
        }
        let chosen = submitted
            .get(id)
            .map(|a| a.trim().to_lowercase())
            .unwrap_or_default();
        if !chosen.is_empty() && chosen == correct.trim().to_lowercase() {
            score += 1;
        }
        answers.insert(*id, chosen);
    }

    Scored {
        score,
        total: answers.len() as i64,
        answers,
    }
}

/// Inclusive pass threshold.
pub fn is_passing(score: i64, pass_score: i64) -> bool {
    score >= pass_score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(pairs: &[(i64, &str)]) -> HashMap<i64, String> {
        pairs.iter().map(|(id, a)| (*id, a.to_string())).collect()
    }

    #[test]
    fn test_three_of_four() {
        let answer_keys = keys(&[(1, "b"), (2, "c"), (3, "c"), (4, "c")]);
        let submitted = keys(&[(1, "b"), (2, "c"), (3, "a"), (4, "c")]);
        let scored = score_submission(&[1, 2, 3, 4], &answer_keys, &submitted);
        assert_eq!(scored.score, 3);
        assert_eq!(scored.total, 4);
        assert!(is_passing(scored.score, 3));
        assert!(!is_passing(scored.score, 4));
    }

    #[test]
    fn test_unknown_ids_are_dropped() {
        let answer_keys = keys(&[(1, "a"), (2, "b")]);
        let submitted = keys(&[(1, "a"), (2, "b"), (99, "a")]);
        let scored = score_submission(&[1, 99, 2], &answer_keys, &submitted);
        assert_eq!(scored.score, 2);
        assert_eq!(scored.total, 2);
        assert!(!scored.answers.contains_key(&99));
    }

    #[test]
    fn test_missing_answer_counts_wrong() {
        let answer_keys = keys(&[(1, "a"), (2, "b")]);
        let submitted = keys(&[(1, "a")]);
        let scored = score_submission(&[1, 2], &answer_keys, &submitted);
        assert_eq!(scored.score, 1);
        assert_eq!(scored.total, 2);
        assert_eq!(scored.answers.get(&2).map(String::as_str), Some(""));
    }

    #[test]
    fn test_duplicate_ids_count_once() {
        let answer_keys = keys(&[(1, "a")]);
        let submitted = keys(&[(1, "a")]);
        let scored = score_submission(&[1, 1, 1], &answer_keys, &submitted);
        assert_eq!(scored.score, 1);
        assert_eq!(scored.total, 1);
    }

    #[test]
    fn test_letters_are_case_insensitive() {
        let answer_keys = keys(&[(1, "c")]);
        let submitted = keys(&[(1, " C ")]);
        assert_eq!(score_submission(&[1], &answer_keys, &submitted).score, 1);
    }

    #[test]
    fn test_answers_for_unpresented_questions_are_ignored() {
        let answer_keys = keys(&[(1, "a"), (2, "a")]);
        let submitted = keys(&[(1, "a"), (2, "a")]);
        let scored = score_submission(&[1], &answer_keys, &submitted);
        assert_eq!(scored.score, 1);
        assert_eq!(scored.total, 1);
    }
}
