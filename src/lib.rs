//! # asl-lesson-engine - adaptive ASL vocabulary sessions
//!
//! Builds practice decks for sign-language lessons, adapts them while the
//! learner works through them, and decides the outcome of each session:
//!
//! - **Mastery Store** - per-word practice statistics, updated copy-on-write
//! - **Deck Generator** - six-slot lesson decks and twelve-slot unit tests,
//!   weakest words first
//! - **Override Engine** - re-targets pending lesson slots at two checkpoints
//! - **Session Evaluator** - pass thresholds, XP and lesson completion per mode
//! - **Persistence** - JSON key-value storage (SQLite or in-memory)
//!
//! ## Module layout
//!
//! - [`types`] - words, slots, decks, outcomes, verdicts
//! - [`mastery`] - `WordStats` / `MasteryMap` and the weakness ranking
//! - [`deck`] - `DeckGenerator`
//! - [`overrides`] - checkpoint overrides
//! - [`session`] - the session state machine and its evaluator
//! - [`course`] - lessons, units, statuses, learner progress
//! - [`judge`] - evaluator reply normalization
//! - [`persistence`] - `KeyValueStore` adapters and `ProgressStore`
//! - [`trainer`] - single-learner session controller
//!
//! ## Example
//!
//! ```rust
//! use asl_lesson_engine::{DeckGenerator, MasteryMap, SlotKind, Word};
//!
//! let words = vec![
//!     Word::new("Hello", "hello.mp4", ["Goodbye", "Please", "Sorry"]),
//!     Word::new("Goodbye", "goodbye.mp4", ["Hello", "Please", "Sorry"]),
//! ];
//! let deck = DeckGenerator::with_seed(42).build_lesson_deck(&words, &MasteryMap::new());
//!
//! assert_eq!(deck.len(), 6);
//! assert_eq!(deck.slot(0).kind, SlotKind::Recall);
//! assert_eq!(deck.slot(5).kind, SlotKind::Produce);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod clock;
pub mod config;
pub mod course;
pub mod deck;
pub mod error;
pub mod judge;
pub mod logging;
pub mod mastery;
pub mod overrides;
pub mod persistence;
pub mod session;
pub mod trainer;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, EngineConfig};
pub use course::{Course, LearnerProgress, Lesson, LessonKind, LessonStatus, LevelInfo};
pub use deck::{DeckGenerator, DeckGeneratorOptions};
pub use error::{CourseError, SessionError, StorageError, StorageResult, TrainerError};
pub use judge::{Evaluation, JudgeScore};
pub use mastery::{LastOutcome, MasteryMap, WordStats};
pub use overrides::{override_after_second_recall, override_before_final, recognize_accuracy};
pub use persistence::{KeyValueStore, MemoryStore, ProgressStore, SqliteStore};
pub use session::{evaluate, Session, SessionTally, SessionTarget, SlotCompletion};
pub use trainer::{SessionStart, StepReport, Trainer};
