//! Persistence Bridge
//!
//! Learner state lives in a flat key-value store of JSON documents. The keys
//! match the ones the web trainer keeps in browser storage, so an exported
//! profile can be loaded as is.
//!
//! Reads never block practice: a missing, unreadable or malformed value falls
//! back to its default and is logged. Writes report their error to the caller.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::course::LearnerProgress;
use crate::error::StorageResult;
use crate::mastery::MasteryMap;
use crate::types::LessonId;

pub const MASTERY_KEY: &str = "asl_masteryMap";
pub const COMPLETED_LESSONS_KEY: &str = "asl_completedLessons";
pub const TOTAL_XP_KEY: &str = "asl_totalXP";
pub const DAILY_XP_KEY: &str = "asl_dailyGoal";

/// Durable JSON document store. Saving an existing key overwrites it.
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> StorageResult<Option<Value>>;

    fn save(&self, key: &str, value: &Value) -> StorageResult<()>;
}

/// Typed access to the learner's mastery map and progress
pub struct ProgressStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn load_mastery(&self) -> MasteryMap {
        self.load_or_default(MASTERY_KEY)
    }

    pub fn save_mastery(&self, mastery: &MasteryMap) -> StorageResult<()> {
        self.save_typed(MASTERY_KEY, mastery)
    }

    pub fn load_progress(&self) -> LearnerProgress {
        LearnerProgress {
            completed_lessons: self.load_or_default::<BTreeSet<LessonId>>(COMPLETED_LESSONS_KEY),
            total_xp: self.load_or_default(TOTAL_XP_KEY),
            daily_xp: self.load_or_default(DAILY_XP_KEY),
        }
    }

    /// Writes every progress key, even after one fails, and returns the first
    /// failure. The keys are not written atomically: a failed write leaves that
    /// key at its previous value until the next verdict rewrites it.
    pub fn save_progress(&self, progress: &LearnerProgress) -> StorageResult<()> {
        let writes = [
            self.save_typed(COMPLETED_LESSONS_KEY, &progress.completed_lessons),
            self.save_typed(TOTAL_XP_KEY, &progress.total_xp),
            self.save_typed(DAILY_XP_KEY, &progress.daily_xp),
        ];
        writes.into_iter().collect()
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let value = match self.store.load(key) {
            Ok(Some(value)) => value,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read stored value, using default");
                return T::default();
            }
        };

        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "malformed stored value, using default");
            T::default()
        })
    }

    fn save_typed<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let value = serde_json::to_value(value)?;
        self.store.save(key, &value)
    }
}
