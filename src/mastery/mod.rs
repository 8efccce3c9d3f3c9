//! Mastery Store
//!
//! Per-word practice statistics and the single operation that mutates them.
//!
//! Core principles:
//! - The map is a value: `update` returns a new map and never touches its input
//! - Stats are created lazily with zeroed defaults and are never deleted
//! - Weakness is derived from a Beta(1, 1)-smoothed accuracy minus a penalty for
//!   recent consecutive failures, so unseen words sit in the middle of the range

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{SlotKind, Word};

// ==================== Constants ====================

/// Penalty applied to the mastery score per consecutive failure
const FAILURE_PENALTY: f64 = 0.1;

/// Consecutive failures beyond this count no longer lower the score
const MAX_PENALIZED_FAILURES: u32 = 5;

/// Lowest sampling weight, so strong words can still be drawn
const MIN_SAMPLING_WEIGHT: f64 = 0.05;

// ==================== Data Structures ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LastOutcome {
    #[default]
    Unseen,
    Pass,
    Fail,
}

/// Practice statistics of one word
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WordStats {
    pub attempts: u32,
    /// Never exceeds `attempts`
    pub successes: u32,
    pub consecutive_failures: u32,
    pub last_outcome: LastOutcome,
    pub last_practiced_at: Option<DateTime<Utc>>,
}

impl WordStats {
    pub fn is_unseen(&self) -> bool {
        self.attempts == 0
    }

    /// Smoothed accuracy in (0, 1); 0.5 for an unseen word
    pub fn smoothed_accuracy(&self) -> f64 {
        (self.successes as f64 + 1.0) / (self.attempts as f64 + 2.0)
    }

    /// Higher is stronger. Lower accuracy and more recent failures both lower it.
    pub fn mastery_score(&self) -> f64 {
        let penalty =
            FAILURE_PENALTY * self.consecutive_failures.min(MAX_PENALIZED_FAILURES) as f64;
        self.smoothed_accuracy() - penalty
    }

    /// Sampling weight for weakest-first selection
    pub fn weakness_weight(&self) -> f64 {
        (1.0 - self.mastery_score()).max(MIN_SAMPLING_WEIGHT)
    }

    fn record(&mut self, was_correct: bool, now: DateTime<Utc>) {
        self.attempts += 1;
        if was_correct {
            self.successes += 1;
            self.consecutive_failures = 0;
            self.last_outcome = LastOutcome::Pass;
        } else {
            self.consecutive_failures += 1;
            self.last_outcome = LastOutcome::Fail;
        }
        self.last_practiced_at = Some(now);
    }
}

/// Word text -> stats. Serialized as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MasteryMap {
    words: BTreeMap<String, WordStats>,
}

impl MasteryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, text: &str) -> Option<&WordStats> {
        self.words.get(text)
    }

    /// Stats of `text`, or zeroed defaults when the word was never seen
    pub fn stats_or_default(&self, text: &str) -> WordStats {
        self.words.get(text).cloned().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WordStats)> {
        self.words.iter().map(|(text, stats)| (text.as_str(), stats))
    }

    /// Existing stats for `word`, inserting zeroed defaults if absent
    pub fn get_or_init(&self, word: &Word) -> (MasteryMap, WordStats) {
        if let Some(stats) = self.words.get(&word.text) {
            return (self.clone(), stats.clone());
        }
        let mut next = self.clone();
        let stats = WordStats::default();
        next.words.insert(word.text.clone(), stats.clone());
        (next, stats)
    }

    /// `get_or_init` over a whole word set
    pub fn init_all<'a>(&self, words: impl IntoIterator<Item = &'a Word>) -> MasteryMap {
        words
            .into_iter()
            .fold(self.clone(), |map, word| map.get_or_init(word).0)
    }

    /// Record one resolved slot for `word`. The slot kind does not change the
    /// arithmetic; it is accepted so every resolution goes through one entry point.
    pub fn update(
        &self,
        word: &Word,
        kind: SlotKind,
        was_correct: bool,
        now: DateTime<Utc>,
    ) -> MasteryMap {
        let mut next = self.clone();
        let stats = next.words.entry(word.text.clone()).or_default();
        stats.record(was_correct, now);
        tracing::trace!(
            word = %word.text,
            ?kind,
            was_correct,
            attempts = stats.attempts,
            "mastery updated"
        );
        next
    }

    /// Rank `words` weakest first. Ties keep input order.
    pub fn rank_weakest<'a>(&self, words: &'a [Word]) -> Vec<&'a Word> {
        let mut ranked: Vec<(usize, &Word, f64)> = words
            .iter()
            .enumerate()
            .map(|(idx, word)| (idx, word, self.stats_or_default(&word.text).mastery_score()))
            .collect();
        ranked.sort_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)));
        ranked.into_iter().map(|(_, word, _)| word).collect()
    }

    /// The single weakest word of the set, ties broken by input order
    pub fn weakest<'a>(&self, words: &'a [Word]) -> Option<&'a Word> {
        self.rank_weakest(words).into_iter().next()
    }
}

impl FromIterator<(String, WordStats)> for MasteryMap {
    fn from_iter<T: IntoIterator<Item = (String, WordStats)>>(iter: T) -> Self {
        Self {
            words: iter.into_iter().collect(),
        }
    }
}
