//! Session controller
//!
//! Ties the engine together for a single learner: picks the session mode for
//! a lesson, builds its deck, feeds slot outcomes through the session,
//! persists mastery after every slot and progress after every verdict.
//! Storage failures never interrupt practice; they are logged and reported
//! back in the step report.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::course::{Course, LearnerProgress, LessonKind, LessonStatus};
use crate::deck::{DeckGenerator, DeckGeneratorOptions};
use crate::error::{StorageError, TrainerError};
use crate::judge::Evaluation;
use crate::mastery::MasteryMap;
use crate::persistence::{KeyValueStore, ProgressStore};
use crate::session::{Session, SessionTarget};
use crate::types::{
    Checkpoint, Deck, DeckKind, LessonId, SessionMode, Slot, SlotOutcome, Verdict, Word,
};

/// What happened on one step of a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    /// Resolved slot; `None` when the session completed without any
    pub slot: Option<Slot>,
    pub slot_passed: bool,
    pub deck_revised: Option<Checkpoint>,
    /// Set when the session ended on this step
    pub verdict: Option<Verdict>,
    /// Non-fatal persistence failures
    pub storage_errors: Vec<String>,
}

/// Result of opening a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStart {
    /// Slots are waiting; drive them with `submit`
    Active { mode: SessionMode, slots: usize },
    /// Nothing to practice; the verdict is already applied
    Completed(StepReport),
}

pub struct Trainer<S: KeyValueStore> {
    course: Course,
    store: ProgressStore<S>,
    config: EngineConfig,
    generator: DeckGenerator,
    clock: Arc<dyn Clock>,
    mastery: MasteryMap,
    progress: LearnerProgress,
    session: Option<Session>,
}

impl<S: KeyValueStore> Trainer<S> {
    /// Trainer over persisted learner state. Unreadable state starts fresh.
    pub fn new(course: Course, store: S, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let generator = DeckGenerator::with_options(DeckGeneratorOptions {
            seed: None,
            produce_mastery_threshold: Some(config.produce_mastery_threshold),
        });
        let store = ProgressStore::new(store);
        let mastery = store.load_mastery();
        let progress = store.load_progress();

        tracing::info!(
            words = mastery.len(),
            completed = progress.completed_lessons.len(),
            total_xp = progress.total_xp,
            "learner state loaded"
        );

        Self {
            course,
            store,
            config,
            generator,
            clock,
            mastery,
            progress,
            session: None,
        }
    }

    /// Replace the deck generator, e.g. with a seeded one
    pub fn with_generator(mut self, generator: DeckGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mastery(&self) -> &MasteryMap {
        &self.mastery
    }

    pub fn progress(&self) -> &LearnerProgress {
        &self.progress
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn store(&self) -> &S {
        self.store.inner()
    }

    pub fn current_slot(&self) -> Option<&Slot> {
        self.session.as_ref().and_then(Session::current_slot)
    }

    pub fn lesson_statuses(&self) -> Vec<(LessonId, LessonStatus)> {
        self.course.lesson_statuses(&self.progress.completed_lessons)
    }

    /// Open a lesson. Practice lessons run as NewLesson, or Review once
    /// completed; checkpoints run the unit test; achievements and lessons
    /// without words complete immediately.
    pub fn start_lesson(&mut self, lesson_id: LessonId) -> Result<SessionStart, TrainerError> {
        self.ensure_idle()?;
        let lesson = self.course.lesson(lesson_id)?.clone();
        let target = SessionTarget {
            lesson_id,
            full_xp: lesson.xp,
            unit_lesson_ids: self.course.unit_lesson_ids(lesson.unit),
        };

        let (mode, words, deck) = match lesson.kind {
            LessonKind::Checkpoint => {
                let words = self.course.unit_words(lesson.unit);
                let deck = if words.is_empty() {
                    Deck::empty(DeckKind::UnitTest)
                } else {
                    self.mastery = self.mastery.init_all(&words);
                    self.generator.build_unit_test_deck(&words, &self.mastery)
                };
                (SessionMode::UnitTest, words, deck)
            }
            LessonKind::Lesson | LessonKind::Achievement => {
                let mode = if self.progress.is_completed(lesson_id) {
                    SessionMode::Review
                } else {
                    SessionMode::NewLesson
                };
                let words: Vec<Word> = match lesson.kind {
                    LessonKind::Lesson => self.course.words_for(lesson_id).to_vec(),
                    _ => Vec::new(),
                };
                let deck = if words.is_empty() {
                    Deck::empty(DeckKind::Lesson)
                } else {
                    self.mastery = self.mastery.init_all(&words);
                    self.generator.build_lesson_deck(&words, &self.mastery)
                };
                (mode, words, deck)
            }
        };

        Ok(self.open(mode, deck, words, target))
    }

    /// Test out of a unit: a unit-test deck judged on Recognize accuracy that
    /// completes every lesson of the unit when passed.
    pub fn start_skip_attempt(&mut self, unit: u32) -> Result<SessionStart, TrainerError> {
        self.ensure_idle()?;
        let checkpoint = self.course.checkpoint_for_unit(unit)?.clone();
        let words = self.course.unit_words(unit);
        if words.is_empty() {
            return Err(TrainerError::EmptyUnit(unit));
        }

        self.mastery = self.mastery.init_all(&words);
        let deck = self.generator.build_unit_test_deck(&words, &self.mastery);
        let target = SessionTarget {
            lesson_id: checkpoint.id,
            full_xp: checkpoint.xp,
            unit_lesson_ids: self.course.unit_lesson_ids(unit),
        };

        Ok(self.open(SessionMode::SkipAttempt, deck, words, target))
    }

    /// Complete the current slot
    pub fn submit(&mut self, outcome: SlotOutcome) -> Result<StepReport, TrainerError> {
        let session = self.session.as_mut().ok_or(TrainerError::NoSession)?;
        let completion = session.complete_slot(outcome, &self.mastery, self.clock.now())?;

        self.mastery = completion.mastery;
        let mut report = StepReport {
            slot: Some(completion.slot),
            slot_passed: completion.slot_passed,
            deck_revised: completion.deck_revised,
            verdict: None,
            storage_errors: Vec::new(),
        };
        if let Err(e) = self.store.save_mastery(&self.mastery) {
            record_storage_error(&mut report, "mastery", e);
        }

        if let Some(verdict) = completion.verdict {
            self.session = None;
            self.finish(verdict, &mut report);
        }
        Ok(report)
    }

    /// Answer the current Recognize slot with the option the learner picked
    ///
    /// # Panics
    /// When the current slot is not a Recognize slot.
    pub fn answer_choice(&mut self, answer: &str) -> Result<StepReport, TrainerError> {
        let slot = self.current_slot().ok_or(TrainerError::NoSession)?;
        let choices = slot
            .choices
            .as_ref()
            .unwrap_or_else(|| panic!("slot {} is a {:?} slot, not Recognize", slot.ordinal, slot.kind));
        let first_answer_correct = choices.is_correct(answer);
        self.submit(SlotOutcome::Recognized { first_answer_correct })
    }

    /// Resolve the current Recall/Produce slot with an evaluator reply
    pub fn submit_evaluation(&mut self, evaluation: &Evaluation) -> Result<StepReport, TrainerError> {
        let verdict = evaluation.verdict(self.config.judge_pass_score);
        self.submit(SlotOutcome::Judged { verdict })
    }

    /// Leave the session. Mastery already recorded is kept.
    pub fn back_out(&mut self) -> Result<(), TrainerError> {
        let session = self.session.take().ok_or(TrainerError::NoSession)?;
        session.abandon();
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), TrainerError> {
        if self.session.is_some() {
            return Err(TrainerError::SessionActive);
        }
        Ok(())
    }

    fn open(&mut self, mode: SessionMode, deck: Deck, words: Vec<Word>, target: SessionTarget) -> SessionStart {
        let slots = deck.len();
        let session = Session::start(mode, deck, words, target, self.config.clone());

        if session.is_complete() {
            let mut report = StepReport {
                slot_passed: true,
                ..StepReport::default()
            };
            self.finish(session.verdict(), &mut report);
            return SessionStart::Completed(report);
        }

        if let Err(e) = self.store.save_mastery(&self.mastery) {
            tracing::warn!(error = %e, "failed to persist initialized mastery");
        }
        self.session = Some(session);
        SessionStart::Active { mode, slots }
    }

    fn finish(&mut self, verdict: Verdict, report: &mut StepReport) {
        self.progress.apply(&verdict);
        if let Err(e) = self.store.save_progress(&self.progress) {
            record_storage_error(report, "progress", e);
        }
        tracing::info!(
            mode = ?verdict.mode,
            passed = verdict.passed,
            xp = verdict.xp_awarded,
            failure = verdict.failure_reason.map(|r| r.as_str()),
            total_xp = self.progress.total_xp,
            "verdict applied"
        );
        report.verdict = Some(verdict);
    }
}

fn record_storage_error(report: &mut StepReport, what: &str, error: StorageError) {
    tracing::warn!(what, error = %error, "failed to persist learner state");
    report.storage_errors.push(format!("{what}: {error}"));
}
