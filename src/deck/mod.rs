//! Slot Deck Generator
//!
//! Builds the initial slot sequence of a session from a word set and the
//! learner's mastery.
//!
//! Core principles:
//! - Weakest words first: lower smoothed accuracy and more recent failures win
//! - Every word of the input appears once before any word repeats
//! - Randomness is limited to decoy order and unit-test sampling, and comes
//!   from a seedable ChaCha RNG

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::mastery::MasteryMap;
use crate::types::{
    Checkpoint, CheckpointMark, ChoiceSet, Deck, DeckKind, Slot, SlotKind, Word, LESSON_DECK_LEN,
    MAX_DECOYS, UNIT_TEST_DECK_LEN,
};

// ==================== Constants ====================

/// Default mastery score a word needs before the fifth lesson slot asks for Produce
pub const DEFAULT_PRODUCE_MASTERY_THRESHOLD: f64 = 0.5;

const KIND_BLOCK: [SlotKind; 3] = [SlotKind::Recall, SlotKind::Recognize, SlotKind::Produce];

// ==================== Options ====================

#[derive(Clone, Debug)]
pub struct DeckGeneratorOptions {
    /// Random seed for reproducibility (optional)
    pub seed: Option<u64>,
    /// Mastery score above which slot 4 of a lesson becomes Produce
    pub produce_mastery_threshold: Option<f64>,
}

impl Default for DeckGeneratorOptions {
    fn default() -> Self {
        Self {
            seed: None,
            produce_mastery_threshold: Some(DEFAULT_PRODUCE_MASTERY_THRESHOLD),
        }
    }
}

// ==================== Generator ====================

pub struct DeckGenerator {
    rng: ChaCha8Rng,
    produce_mastery_threshold: f64,
}

impl Default for DeckGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckGenerator {
    pub fn new() -> Self {
        Self::with_options(DeckGeneratorOptions::default())
    }

    pub fn with_options(options: DeckGeneratorOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng,
            produce_mastery_threshold: options
                .produce_mastery_threshold
                .unwrap_or(DEFAULT_PRODUCE_MASTERY_THRESHOLD),
        }
    }

    /// Generator with a fixed seed (tests, replays)
    pub fn with_seed(seed: u64) -> Self {
        Self::with_options(DeckGeneratorOptions {
            seed: Some(seed),
            ..Default::default()
        })
    }

    /// Six-slot lesson deck:
    ///
    /// | # | kind | word |
    /// |---|------|------|
    /// | 0 | Recall | A |
    /// | 1 | Recognize | A |
    /// | 2 | Recall | B (checkpoint) |
    /// | 3 | Recognize | B |
    /// | 4 | Produce or Recall | A (checkpoint) |
    /// | 5 | Produce | B |
    ///
    /// A and B are the two weakest distinct words; with a single word A == B.
    pub fn build_lesson_deck(&mut self, words: &[Word], mastery: &MasteryMap) -> Deck {
        let words = distinct_words(words);
        if words.is_empty() {
            tracing::debug!("lesson has no words, returning empty deck");
            return Deck::empty(DeckKind::Lesson);
        }

        let ranked = mastery.rank_weakest(&words);
        let first = ranked[0].clone();
        let second = ranked.get(1).copied().unwrap_or(ranked[0]).clone();

        let first_stats = mastery.stats_or_default(&first.text);
        let fifth_kind = if !first_stats.is_unseen()
            && first_stats.mastery_score() >= self.produce_mastery_threshold
        {
            SlotKind::Produce
        } else {
            SlotKind::Recall
        };

        let plan = [
            (SlotKind::Recall, &first),
            (SlotKind::Recognize, &first),
            (SlotKind::Recall, &second),
            (SlotKind::Recognize, &second),
            (fifth_kind, &first),
            (SlotKind::Produce, &second),
        ];
        let slots: Vec<Slot> = plan
            .into_iter()
            .enumerate()
            .map(|(ordinal, (kind, word))| make_slot(ordinal, kind, word, &mut self.rng))
            .collect();
        debug_assert_eq!(slots.len(), LESSON_DECK_LEN);

        tracing::debug!(
            first = %first.text,
            second = %second.text,
            fifth = ?fifth_kind,
            "lesson deck built"
        );

        Deck {
            kind: DeckKind::Lesson,
            slots,
            checkpoints: vec![
                CheckpointMark {
                    after_ordinal: 2,
                    checkpoint: Checkpoint::AfterSecondRecall,
                },
                CheckpointMark {
                    after_ordinal: 4,
                    checkpoint: Checkpoint::BeforeFinal,
                },
            ],
        }
    }

    /// Twelve-slot deck over the pooled words of a unit. Shared by unit tests
    /// and skip attempts.
    pub fn build_unit_test_deck(&mut self, pooled_words: &[Word], mastery: &MasteryMap) -> Deck {
        let pool = distinct_words(pooled_words);
        if pool.is_empty() {
            tracing::debug!("unit pool is empty, returning empty deck");
            return Deck::empty(DeckKind::UnitTest);
        }

        let targets = self.sample_targets(&pool, mastery, UNIT_TEST_DECK_LEN);
        let kinds = self.interleaved_kinds(UNIT_TEST_DECK_LEN);

        let slots: Vec<Slot> = targets
            .into_iter()
            .zip(kinds)
            .enumerate()
            .map(|(ordinal, (word_idx, kind))| make_slot(ordinal, kind, &pool[word_idx], &mut self.rng))
            .collect();

        tracing::debug!(pool = pool.len(), slots = slots.len(), "unit test deck built");

        Deck {
            kind: DeckKind::UnitTest,
            slots,
            checkpoints: Vec::new(),
        }
    }

    /// Weighted sampling without replacement until the pool is exhausted,
    /// then with replacement. Returns indices into `pool`.
    fn sample_targets(&mut self, pool: &[Word], mastery: &MasteryMap, count: usize) -> Vec<usize> {
        let weights: Vec<f64> = pool
            .iter()
            .map(|word| mastery.stats_or_default(&word.text).weakness_weight())
            .collect();

        let mut targets = Vec::with_capacity(count);
        let mut remaining: Vec<usize> = (0..pool.len()).collect();

        while targets.len() < count && !remaining.is_empty() {
            let pick = self.weighted_pick(&remaining, &weights);
            targets.push(remaining.remove(pick));
        }

        while targets.len() < count {
            let previous = targets.last().copied();
            let candidates: Vec<usize> = (0..pool.len())
                .filter(|&idx| pool.len() == 1 || Some(idx) != previous)
                .collect();
            let pick = self.weighted_pick(&candidates, &weights);
            targets.push(candidates[pick]);
        }

        targets
    }

    /// Position within `candidates`, drawn proportionally to `weights[candidate]`
    fn weighted_pick(&mut self, candidates: &[usize], weights: &[f64]) -> usize {
        let total: f64 = candidates.iter().map(|&idx| weights[idx]).sum();
        let mut target = self.rng.gen::<f64>() * total;
        for (pos, &idx) in candidates.iter().enumerate() {
            target -= weights[idx];
            if target <= 0.0 {
                return pos;
            }
        }
        candidates.len() - 1
    }

    /// Kinds in shuffled blocks of three: each kind equally often, never three in a row
    fn interleaved_kinds(&mut self, count: usize) -> Vec<SlotKind> {
        let mut kinds = Vec::with_capacity(count);
        let mut previous: Option<SlotKind> = None;
        while kinds.len() < count {
            let mut block = KIND_BLOCK;
            block.shuffle(&mut self.rng);
            // Avoid a doubled kind across the block boundary when it can be helped
            if previous == Some(block[0]) {
                block.swap(0, 1);
            }
            previous = block.last().copied();
            kinds.extend(block);
        }
        kinds.truncate(count);
        kinds
    }
}

// ==================== Helpers ====================

/// Input words with duplicates (by text) removed, first occurrence kept
fn distinct_words(words: &[Word]) -> Vec<Word> {
    let mut seen = std::collections::HashSet::new();
    words
        .iter()
        .filter(|word| seen.insert(word.text.as_str()))
        .cloned()
        .collect()
}

pub(crate) fn make_slot<R: Rng + ?Sized>(
    ordinal: usize,
    kind: SlotKind,
    word: &Word,
    rng: &mut R,
) -> Slot {
    let choices = match kind {
        SlotKind::Recognize => Some(snapshot_choices(word, rng)),
        SlotKind::Recall | SlotKind::Produce => None,
    };
    Slot {
        ordinal,
        kind,
        word: word.clone(),
        choices,
    }
}

/// Correct answer plus up to `MAX_DECOYS` decoys, shuffled
pub(crate) fn snapshot_choices<R: Rng + ?Sized>(word: &Word, rng: &mut R) -> ChoiceSet {
    let decoys: Vec<String> = word
        .decoys
        .iter()
        .filter(|decoy| **decoy != word.correct_answer)
        .take(MAX_DECOYS)
        .cloned()
        .collect();
    let mut options = Vec::with_capacity(decoys.len() + 1);
    options.push(word.correct_answer.clone());
    options.extend(decoys.iter().cloned());
    options.shuffle(rng);

    ChoiceSet {
        correct_answer: word.correct_answer.clone(),
        decoys,
        options,
    }
}
