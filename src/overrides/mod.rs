//! Runtime Override Engine
//!
//! Replaces not-yet-attempted slots of a lesson deck at its two checkpoints.
//! Both overrides are pure: identical inputs give identical decks, and a slot
//! at or before the checkpoint is never touched.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::EngineConfig;
use crate::deck::make_slot;
use crate::mastery::MasteryMap;
use crate::types::{Checkpoint, Deck, DeckKind, RecognizeResult, Slot, SlotKind, Word};

/// Checkpoint after the Recall of the second word.
///
/// A failed Recall steers the next two slots onto the same word: the
/// Recognize that follows targets it, and the fifth slot becomes a Recall of
/// it. A successful Recall leaves the deck as generated.
///
/// # Panics
/// When `deck` is not a lesson deck carrying this checkpoint.
pub fn override_after_second_recall(
    deck: &Deck,
    words: &[Word],
    just_completed_word: &str,
    was_correct: bool,
) -> Deck {
    let checkpoint_ordinal = expect_checkpoint(deck, Checkpoint::AfterSecondRecall);
    if was_correct {
        return deck.clone();
    }

    let target = resolve_word(deck, words, just_completed_word, checkpoint_ordinal);
    let mut next = deck.clone();

    let recognize_ordinal = checkpoint_ordinal + 1;
    if recognize_ordinal < next.len() {
        next.slots[recognize_ordinal] =
            retarget(&next.slots[recognize_ordinal], SlotKind::Recognize, &target);
    }

    if let Some(before_final) = deck.checkpoint_ordinal(Checkpoint::BeforeFinal) {
        if before_final > recognize_ordinal && before_final < next.len() {
            next.slots[before_final] = retarget(&next.slots[before_final], SlotKind::Recall, &target);
        }
    }

    tracing::debug!(word = %target.text, "recall failed, re-targeting pending slots");
    next
}

/// Checkpoint before the final slot.
///
/// When the Recognize accuracy of the session so far is below
/// `config.low_accuracy_threshold`, the final slot becomes a Produce of the
/// weakest word of the lesson.
///
/// # Panics
/// When `deck` is not a lesson deck carrying this checkpoint.
pub fn override_before_final(
    deck: &Deck,
    words: &[Word],
    recognize_results: &[RecognizeResult],
    mastery: &MasteryMap,
    config: &EngineConfig,
) -> Deck {
    let checkpoint_ordinal = expect_checkpoint(deck, Checkpoint::BeforeFinal);
    let Some(accuracy) = recognize_accuracy(recognize_results) else {
        return deck.clone();
    };
    if accuracy >= config.low_accuracy_threshold {
        return deck.clone();
    }
    let Some(weakest) = mastery.weakest(words) else {
        return deck.clone();
    };

    let final_ordinal = deck.len() - 1;
    if final_ordinal <= checkpoint_ordinal {
        return deck.clone();
    }

    let mut next = deck.clone();
    next.slots[final_ordinal] = retarget(&next.slots[final_ordinal], SlotKind::Produce, weakest);

    tracing::debug!(
        accuracy,
        word = %weakest.text,
        "low recognize accuracy, final slot forced to weakest word"
    );
    next
}

/// Share of correct Recognize answers, `None` when there are none yet
pub fn recognize_accuracy(results: &[RecognizeResult]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }
    let correct = results.iter().filter(|r| r.was_correct).count();
    Some(correct as f64 / results.len() as f64)
}

fn expect_checkpoint(deck: &Deck, checkpoint: Checkpoint) -> usize {
    assert_eq!(
        deck.kind,
        DeckKind::Lesson,
        "overrides only apply to lesson decks"
    );
    deck.checkpoint_ordinal(checkpoint)
        .unwrap_or_else(|| panic!("deck carries no {checkpoint:?} checkpoint"))
}

fn resolve_word(deck: &Deck, words: &[Word], text: &str, ordinal: usize) -> Word {
    words
        .iter()
        .find(|word| word.text == text)
        .cloned()
        .unwrap_or_else(|| deck.slot(ordinal).word.clone())
}

/// Replacement slot at the same ordinal. An unchanged slot is returned as is,
/// so its choice set keeps the order the learner may already have seen.
fn retarget(slot: &Slot, kind: SlotKind, word: &Word) -> Slot {
    if slot.kind == kind && slot.word.text == word.text {
        return slot.clone();
    }
    let mut rng = ChaCha8Rng::seed_from_u64(stable_seed(&word.text, slot.ordinal));
    make_slot(slot.ordinal, kind, word, &mut rng)
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the word text and ordinal; identical across builds and platforms
fn stable_seed(text: &str, ordinal: usize) -> u64 {
    text.bytes()
        .chain((ordinal as u64).to_le_bytes())
        .fold(FNV_OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME))
}
