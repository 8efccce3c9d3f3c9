//! Practice session state machine
//!
//! A session walks its deck one slot at a time. Each completion updates the
//! mastery map, may revise the pending part of a lesson deck at a checkpoint,
//! and on the last slot yields the verdict.

mod evaluator;

pub use evaluator::{evaluate, SessionTally, SessionTarget};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::mastery::MasteryMap;
use crate::overrides::{override_after_second_recall, override_before_final};
use crate::types::{
    Checkpoint, Deck, DeckKind, RecognizeResult, SessionMode, Slot, SlotKind, SlotOutcome, SlotVerdict,
    Verdict, Word,
};

/// Result of completing one slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotCompletion {
    /// The slot that was resolved
    pub slot: Slot,
    pub slot_passed: bool,
    /// Updated map; the caller persists it
    pub mastery: MasteryMap,
    /// Checkpoint that changed the pending slots, if any
    pub deck_revised: Option<Checkpoint>,
    /// Present once the deck is exhausted
    pub verdict: Option<Verdict>,
}

#[derive(Debug, Clone)]
pub struct Session {
    mode: SessionMode,
    target: SessionTarget,
    words: Vec<Word>,
    deck: Deck,
    cursor: usize,
    tally: SessionTally,
    config: EngineConfig,
}

impl Session {
    /// Open a session over `deck`. An empty deck is complete right away.
    ///
    /// # Panics
    /// When the deck kind does not fit the mode.
    pub fn start(
        mode: SessionMode,
        deck: Deck,
        words: Vec<Word>,
        target: SessionTarget,
        config: EngineConfig,
    ) -> Self {
        assert_eq!(
            deck.kind,
            mode.deck_kind(),
            "{mode:?} sessions need a {:?} deck",
            mode.deck_kind()
        );
        tracing::debug!(
            ?mode,
            lesson_id = target.lesson_id,
            slots = deck.len(),
            "session started"
        );
        Self {
            mode,
            target,
            words,
            deck,
            cursor: 0,
            tally: SessionTally::default(),
            config,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn target(&self) -> &SessionTarget {
        &self.target
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Index of the next slot to attempt
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn tally(&self) -> &SessionTally {
        &self.tally
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.deck.len()
    }

    pub fn current_slot(&self) -> Option<&Slot> {
        if self.is_complete() {
            None
        } else {
            Some(self.deck.slot(self.cursor))
        }
    }

    /// Resolve the current slot with `outcome`.
    ///
    /// On error nothing changes and the slot stays current.
    ///
    /// # Panics
    /// When the outcome does not match the slot kind.
    pub fn complete_slot(
        &mut self,
        outcome: SlotOutcome,
        mastery: &MasteryMap,
        now: DateTime<Utc>,
    ) -> Result<SlotCompletion, SessionError> {
        let Some(slot) = self.current_slot().cloned() else {
            return Err(SessionError::AlreadyComplete);
        };

        let slot_passed = match (slot.kind, outcome) {
            (SlotKind::Recognize, SlotOutcome::Recognized { first_answer_correct }) => {
                self.tally.raw_results.push(RecognizeResult {
                    word: slot.word.text.clone(),
                    ordinal: slot.ordinal,
                    was_correct: first_answer_correct,
                });
                first_answer_correct
            }
            (SlotKind::Recall | SlotKind::Produce, SlotOutcome::Judged { verdict }) => match verdict {
                SlotVerdict::Pass => true,
                SlotVerdict::Fail => {
                    self.tally.recall_or_produce_failed = true;
                    false
                }
                SlotVerdict::NotYetJudged if self.config.require_judge_verdict => {
                    return Err(SessionError::VerdictPending {
                        ordinal: slot.ordinal,
                    });
                }
                SlotVerdict::NotYetJudged => true,
            },
            (kind, outcome) => panic!("outcome {outcome:?} does not fit a {kind:?} slot"),
        };

        if slot_passed {
            self.tally.passed_slot_count += 1;
        }
        let mastery = mastery.update(&slot.word, slot.kind, slot_passed, now);

        let deck_revised = self.apply_checkpoint(&slot, slot_passed, &mastery);
        self.cursor += 1;

        let verdict = self.is_complete().then(|| self.verdict());
        if let Some(verdict) = &verdict {
            tracing::info!(
                mode = ?verdict.mode,
                passed = verdict.passed,
                xp = verdict.xp_awarded,
                "session finished"
            );
        }

        Ok(SlotCompletion {
            slot,
            slot_passed,
            mastery,
            deck_revised,
            verdict,
        })
    }

    /// Verdict of the finished session.
    ///
    /// # Panics
    /// When slots remain.
    pub fn verdict(&self) -> Verdict {
        assert!(
            self.is_complete(),
            "session still has {} pending slots",
            self.deck.len() - self.cursor
        );
        evaluate(
            self.mode,
            &self.tally,
            &self.target,
            self.deck.len(),
            &self.config,
        )
    }

    /// Drop the session without a verdict. Mastery already returned by
    /// `complete_slot` stays with the caller.
    pub fn abandon(self) {
        tracing::debug!(
            mode = ?self.mode,
            cursor = self.cursor,
            slots = self.deck.len(),
            "session abandoned"
        );
    }

    fn apply_checkpoint(&mut self, slot: &Slot, slot_passed: bool, mastery: &MasteryMap) -> Option<Checkpoint> {
        if self.deck.kind != DeckKind::Lesson {
            return None;
        }
        let checkpoint = self.deck.checkpoint_after(slot.ordinal)?;

        let revised = match checkpoint {
            Checkpoint::AfterSecondRecall => {
                override_after_second_recall(&self.deck, &self.words, &slot.word.text, slot_passed)
            }
            Checkpoint::BeforeFinal => override_before_final(
                &self.deck,
                &self.words,
                &self.tally.raw_results,
                mastery,
                &self.config,
            ),
        };

        if revised == self.deck {
            return None;
        }
        self.deck = revised;
        Some(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::DeckGenerator;
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn word(text: &str) -> Word {
        Word::new(text, format!("{text}.mp4"), ["Hello", "Goodbye", "Please", "Sorry"])
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn target() -> SessionTarget {
        SessionTarget {
            lesson_id: 1,
            full_xp: 10,
            unit_lesson_ids: BTreeSet::from([1, 2]),
        }
    }

    fn lesson_session(mode: SessionMode, config: EngineConfig) -> Session {
        let words = vec![word("Boy"), word("Girl")];
        let deck = DeckGenerator::with_seed(42).build_lesson_deck(&words, &MasteryMap::new());
        Session::start(mode, deck, words, target(), config)
    }

    fn pass_outcome(slot: &Slot) -> SlotOutcome {
        match slot.kind {
            SlotKind::Recognize => SlotOutcome::Recognized {
                first_answer_correct: true,
            },
            _ => SlotOutcome::Judged {
                verdict: SlotVerdict::Pass,
            },
        }
    }

    #[test]
    fn test_all_passed_lesson() {
        let mut session = lesson_session(SessionMode::NewLesson, EngineConfig::default());
        let mut mastery = MasteryMap::new();
        let mut verdict = None;

        while let Some(slot) = session.current_slot().cloned() {
            let completion = session.complete_slot(pass_outcome(&slot), &mastery, now()).unwrap();
            mastery = completion.mastery;
            verdict = completion.verdict;
        }

        let verdict = verdict.unwrap();
        assert!(verdict.passed);
        assert_eq!(verdict.xp_awarded, 10);
        assert_eq!(verdict.completed_lesson_ids, BTreeSet::from([1]));
        assert_eq!(session.tally().passed_slot_count, 6);
        assert_eq!(mastery.get("Boy").unwrap().attempts, 3);
    }

    #[test]
    fn test_recall_failure_retargets_pending_slots() {
        let mut session = lesson_session(SessionMode::NewLesson, EngineConfig::default());
        let mut mastery = MasteryMap::new();

        for _ in 0..2 {
            let slot = session.current_slot().cloned().unwrap();
            mastery = session.complete_slot(pass_outcome(&slot), &mastery, now()).unwrap().mastery;
        }
        let failed = session
            .complete_slot(
                SlotOutcome::Judged {
                    verdict: SlotVerdict::Fail,
                },
                &mastery,
                now(),
            )
            .unwrap();

        assert!(!failed.slot_passed);
        assert!(session.tally().recall_or_produce_failed);
        let failed_word = failed.slot.word.text.clone();
        assert_eq!(session.deck().slots[3].word.text, failed_word);
        assert_eq!(session.deck().slots[4].kind, SlotKind::Recall);
        assert_eq!(session.deck().slots[4].word.text, failed_word);
    }

    #[test]
    fn test_not_yet_judged_counts_as_pass() {
        let mut session = lesson_session(SessionMode::NewLesson, EngineConfig::default());
        let completion = session
            .complete_slot(
                SlotOutcome::Judged {
                    verdict: SlotVerdict::NotYetJudged,
                },
                &MasteryMap::new(),
                now(),
            )
            .unwrap();
        assert!(completion.slot_passed);
        assert!(!session.tally().recall_or_produce_failed);
    }

    #[test]
    fn test_required_verdict_keeps_slot_current() {
        let config = EngineConfig {
            require_judge_verdict: true,
            ..EngineConfig::default()
        };
        let mut session = lesson_session(SessionMode::NewLesson, config);
        let err = session
            .complete_slot(
                SlotOutcome::Judged {
                    verdict: SlotVerdict::NotYetJudged,
                },
                &MasteryMap::new(),
                now(),
            )
            .unwrap_err();

        assert_eq!(err, SessionError::VerdictPending { ordinal: 0 });
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.tally(), &SessionTally::default());
    }

    #[test]
    fn test_empty_deck_is_complete_at_start() {
        let session = Session::start(
            SessionMode::NewLesson,
            Deck::empty(DeckKind::Lesson),
            Vec::new(),
            target(),
            EngineConfig::default(),
        );
        assert!(session.is_complete());
        assert!(session.current_slot().is_none());
        assert!(session.verdict().passed);
    }

    #[test]
    fn test_complete_after_end_is_rejected() {
        let mut session = Session::start(
            SessionMode::Review,
            Deck::empty(DeckKind::Lesson),
            Vec::new(),
            target(),
            EngineConfig::default(),
        );
        let err = session
            .complete_slot(
                SlotOutcome::Recognized {
                    first_answer_correct: true,
                },
                &MasteryMap::new(),
                now(),
            )
            .unwrap_err();
        assert_eq!(err, SessionError::AlreadyComplete);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_mismatched_outcome_panics() {
        let mut session = lesson_session(SessionMode::NewLesson, EngineConfig::default());
        // Slot 0 is a Recall
        let _ = session.complete_slot(
            SlotOutcome::Recognized {
                first_answer_correct: true,
            },
            &MasteryMap::new(),
            now(),
        );
    }

    #[test]
    #[should_panic(expected = "pending slots")]
    fn test_verdict_of_unfinished_session_panics() {
        let session = lesson_session(SessionMode::NewLesson, EngineConfig::default());
        session.verdict();
    }

    #[test]
    fn test_input_mastery_is_not_mutated() {
        let mut session = lesson_session(SessionMode::Review, EngineConfig::default());
        let before = MasteryMap::new();
        let completion = session
            .complete_slot(
                SlotOutcome::Judged {
                    verdict: SlotVerdict::Fail,
                },
                &before,
                now(),
            )
            .unwrap();
        assert!(before.is_empty());
        assert_eq!(completion.mastery.len(), 1);
    }
}
