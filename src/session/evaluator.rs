//! Session Evaluator
//!
//! Turns the tally of a finished session into a verdict. Each mode has its
//! own completion rule:
//!
//! - NewLesson: pass with 5+ passed slots; XP only when no Recall/Produce slot
//!   was explicitly failed
//! - Review: always succeeds, never awards XP, completes nothing
//! - UnitTest: pass with 10+ passed slots; XP iff passed
//! - SkipAttempt: pass with 70%+ Recognize accuracy; completes the whole unit

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::overrides::recognize_accuracy;
use crate::types::{FailureReason, LessonId, RecognizeResult, SessionMode, Verdict};

/// Running pass accounting of a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTally {
    pub passed_slot_count: u32,
    /// Set only by an explicit Recall/Produce failure
    pub recall_or_produce_failed: bool,
    /// Recognize-only log, in slot order
    pub raw_results: Vec<RecognizeResult>,
}

/// What the session is for: which lesson it completes and what it is worth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTarget {
    /// The lesson, or the unit checkpoint for tests and skip attempts
    pub lesson_id: LessonId,
    pub full_xp: u32,
    /// Every lesson of the unit; completed together by a passed skip attempt
    pub unit_lesson_ids: BTreeSet<LessonId>,
}

/// Verdict of a finished session. `deck_len == 0` means the session had
/// nothing to practice and passes through.
pub fn evaluate(
    mode: SessionMode,
    tally: &SessionTally,
    target: &SessionTarget,
    deck_len: usize,
    config: &EngineConfig,
) -> Verdict {
    let pass_through = deck_len == 0;

    match mode {
        SessionMode::Review => Verdict {
            mode,
            passed: true,
            xp_awarded: 0,
            completed_lesson_ids: BTreeSet::new(),
            failure_reason: None,
        },
        SessionMode::NewLesson => {
            let passed = pass_through || tally.passed_slot_count >= config.lesson_pass_slots;
            if !passed {
                return failed(mode, FailureReason::Lesson);
            }
            Verdict {
                mode,
                passed,
                xp_awarded: if tally.recall_or_produce_failed { 0 } else { target.full_xp },
                completed_lesson_ids: BTreeSet::from([target.lesson_id]),
                failure_reason: None,
            }
        }
        SessionMode::UnitTest => {
            let passed = pass_through || tally.passed_slot_count >= config.unit_test_pass_slots;
            if !passed {
                return failed(mode, FailureReason::UnitTest);
            }
            Verdict {
                mode,
                passed,
                xp_awarded: target.full_xp,
                completed_lesson_ids: BTreeSet::from([target.lesson_id]),
                failure_reason: None,
            }
        }
        SessionMode::SkipAttempt => {
            let passed = pass_through
                || recognize_accuracy(&tally.raw_results)
                    .is_some_and(|accuracy| accuracy >= config.skip_pass_accuracy);
            if !passed {
                return failed(mode, FailureReason::Skip);
            }
            let mut completed = target.unit_lesson_ids.clone();
            completed.insert(target.lesson_id);
            Verdict {
                mode,
                passed,
                xp_awarded: target.full_xp,
                completed_lesson_ids: completed,
                failure_reason: None,
            }
        }
    }
}

fn failed(mode: SessionMode, reason: FailureReason) -> Verdict {
    Verdict {
        mode,
        passed: false,
        xp_awarded: 0,
        completed_lesson_ids: BTreeSet::new(),
        failure_reason: Some(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> SessionTarget {
        SessionTarget {
            lesson_id: 4,
            full_xp: 25,
            unit_lesson_ids: BTreeSet::from([1, 2, 3, 4]),
        }
    }

    fn tally(passed: u32, failed_judged: bool) -> SessionTally {
        SessionTally {
            passed_slot_count: passed,
            recall_or_produce_failed: failed_judged,
            raw_results: Vec::new(),
        }
    }

    fn recognize_log(correct: usize, total: usize) -> Vec<RecognizeResult> {
        (0..total)
            .map(|i| RecognizeResult {
                word: format!("w{i}"),
                ordinal: i,
                was_correct: i < correct,
            })
            .collect()
    }

    #[test]
    fn test_new_lesson_threshold_boundary() {
        let config = EngineConfig::default();
        let pass = evaluate(SessionMode::NewLesson, &tally(5, false), &target(), 6, &config);
        assert!(pass.passed);
        assert_eq!(pass.xp_awarded, 25);

        let fail = evaluate(SessionMode::NewLesson, &tally(4, false), &target(), 6, &config);
        assert!(!fail.passed);
        assert_eq!(fail.failure_reason, Some(FailureReason::Lesson));
        assert!(fail.completed_lesson_ids.is_empty());
    }

    #[test]
    fn test_new_lesson_xp_gate_is_independent_of_threshold() {
        let verdict = evaluate(SessionMode::NewLesson, &tally(6, true), &target(), 6, &EngineConfig::default());
        assert!(verdict.passed);
        assert_eq!(verdict.xp_awarded, 0);
        assert_eq!(verdict.completed_lesson_ids, BTreeSet::from([4]));
    }

    #[test]
    fn test_review_never_fails() {
        let verdict = evaluate(SessionMode::Review, &tally(0, true), &target(), 6, &EngineConfig::default());
        assert!(verdict.passed);
        assert_eq!(verdict.xp_awarded, 0);
        assert!(verdict.failure_reason.is_none());
        assert!(verdict.completed_lesson_ids.is_empty());
    }

    #[test]
    fn test_unit_test_threshold() {
        let config = EngineConfig::default();
        let pass = evaluate(SessionMode::UnitTest, &tally(10, true), &target(), 12, &config);
        assert!(pass.passed);
        assert_eq!(pass.xp_awarded, 25);

        let fail = evaluate(SessionMode::UnitTest, &tally(9, false), &target(), 12, &config);
        assert_eq!(fail.failure_reason, Some(FailureReason::UnitTest));
        assert_eq!(fail.xp_awarded, 0);
    }

    #[test]
    fn test_skip_attempt_accuracy() {
        let config = EngineConfig::default();
        let mut t = tally(0, true);

        t.raw_results = recognize_log(7, 10);
        let pass = evaluate(SessionMode::SkipAttempt, &t, &target(), 12, &config);
        assert!(pass.passed);
        assert_eq!(pass.completed_lesson_ids, BTreeSet::from([1, 2, 3, 4]));

        t.raw_results = recognize_log(6, 10);
        let fail = evaluate(SessionMode::SkipAttempt, &t, &target(), 12, &config);
        assert_eq!(fail.failure_reason, Some(FailureReason::Skip));
        assert!(fail.completed_lesson_ids.is_empty());
    }

    #[test]
    fn test_skip_attempt_without_recognize_results_fails() {
        let verdict = evaluate(SessionMode::SkipAttempt, &tally(12, false), &target(), 12, &EngineConfig::default());
        assert!(!verdict.passed);
    }

    #[test]
    fn test_empty_deck_passes_through() {
        let config = EngineConfig::default();
        for mode in [SessionMode::NewLesson, SessionMode::UnitTest, SessionMode::SkipAttempt] {
            let verdict = evaluate(mode, &SessionTally::default(), &target(), 0, &config);
            assert!(verdict.passed, "{mode:?} should pass through");
            assert!(verdict.completed_lesson_ids.contains(&4));
        }
    }
}
