use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Number of slots in a lesson deck
pub const LESSON_DECK_LEN: usize = 6;

/// Number of slots in a unit-test or skip-attempt deck
pub const UNIT_TEST_DECK_LEN: usize = 12;

/// Maximum number of decoys shown next to the correct answer
pub const MAX_DECOYS: usize = 4;

pub type LessonId = u32;

// ==================== Content ====================

/// A practice target. Defined by lesson content, never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    /// Unique key of the word
    pub text: String,
    /// Opaque reference to the demonstration clip
    pub media_ref: String,
    pub correct_answer: String,
    #[serde(default)]
    pub decoys: Vec<String>,
}

impl Word {
    pub fn new(
        text: impl Into<String>,
        media_ref: impl Into<String>,
        decoys: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let text = text.into();
        Self {
            correct_answer: text.clone(),
            text,
            media_ref: media_ref.into(),
            decoys: decoys.into_iter().map(Into::into).collect(),
        }
    }
}

// ==================== Slots ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotKind {
    /// Watch the demonstration, then sign it back
    Recall,
    /// Pick the meaning of a clip from a set of options
    Recognize,
    /// Sign the word from its text alone
    Produce,
}

impl SlotKind {
    /// Recall and Produce are judged by an external evaluator
    pub fn is_judged(&self) -> bool {
        matches!(self, SlotKind::Recall | SlotKind::Produce)
    }
}

/// Snapshotted option set of a Recognize slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceSet {
    pub correct_answer: String,
    pub decoys: Vec<String>,
    /// Correct answer and decoys in presentation order
    pub options: Vec<String>,
}

impl ChoiceSet {
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub ordinal: usize,
    pub kind: SlotKind,
    pub word: Word,
    /// Present only for `SlotKind::Recognize`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<ChoiceSet>,
}

// ==================== Decks ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeckKind {
    Lesson,
    UnitTest,
}

/// Named points in a lesson deck where pending slots may be replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Checkpoint {
    /// Reached once the Recall of the second word resolves
    AfterSecondRecall,
    /// Reached right before the final slot
    BeforeFinal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointMark {
    pub after_ordinal: usize,
    pub checkpoint: Checkpoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub kind: DeckKind,
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub checkpoints: Vec<CheckpointMark>,
}

impl Deck {
    pub fn empty(kind: DeckKind) -> Self {
        Self {
            kind,
            slots: Vec::new(),
            checkpoints: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot at `index`.
    ///
    /// # Panics
    /// When `index` is outside `[0, len)`: the caller and the deck are out of sync.
    pub fn slot(&self, index: usize) -> &Slot {
        assert!(
            index < self.slots.len(),
            "slot index {index} out of range for deck of {} slots",
            self.slots.len()
        );
        &self.slots[index]
    }

    /// Checkpoint reached when the slot at `ordinal` resolves, if any
    pub fn checkpoint_after(&self, ordinal: usize) -> Option<Checkpoint> {
        self.checkpoints
            .iter()
            .find(|mark| mark.after_ordinal == ordinal)
            .map(|mark| mark.checkpoint)
    }

    /// Ordinal the given checkpoint is attached to
    pub fn checkpoint_ordinal(&self, checkpoint: Checkpoint) -> Option<usize> {
        self.checkpoints
            .iter()
            .find(|mark| mark.checkpoint == checkpoint)
            .map(|mark| mark.after_ordinal)
    }
}

// ==================== Outcomes ====================

/// External judge result for a Recall/Produce attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotVerdict {
    Pass,
    Fail,
    NotYetJudged,
}

/// What the learner did on a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SlotOutcome {
    /// Recognize slot: only the first answer counts
    Recognized { first_answer_correct: bool },
    /// Recall or Produce slot
    Judged { verdict: SlotVerdict },
}

/// One Recognize result recorded during a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeResult {
    pub word: String,
    pub ordinal: usize,
    pub was_correct: bool,
}

// ==================== Sessions & verdicts ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    NewLesson,
    Review,
    UnitTest,
    SkipAttempt,
}

impl SessionMode {
    pub fn deck_kind(&self) -> DeckKind {
        match self {
            SessionMode::NewLesson | SessionMode::Review => DeckKind::Lesson,
            SessionMode::UnitTest | SessionMode::SkipAttempt => DeckKind::UnitTest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    #[serde(rename = "lesson")]
    Lesson,
    #[serde(rename = "unit-test")]
    UnitTest,
    #[serde(rename = "skip")]
    Skip,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Lesson => "lesson",
            FailureReason::UnitTest => "unit-test",
            FailureReason::Skip => "skip",
        }
    }
}

/// End-of-session outcome consumed by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub mode: SessionMode,
    pub passed: bool,
    pub xp_awarded: u32,
    pub completed_lesson_ids: BTreeSet<LessonId>,
    pub failure_reason: Option<FailureReason>,
}
