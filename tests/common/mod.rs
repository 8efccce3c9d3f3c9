#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use asl_lesson_engine::{
    Course, DeckGenerator, EngineConfig, FixedClock, MemoryStore, Slot, SlotKind, SlotOutcome, SlotVerdict,
    StepReport, Trainer,
};

pub fn shipped_course() -> Course {
    Course::load(concat!(env!("CARGO_MANIFEST_DIR"), "/data/course.json")).expect("shipped course parses")
}

pub fn trainer(seed: u64) -> Trainer<MemoryStore> {
    let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()));
    Trainer::new(shipped_course(), MemoryStore::new(), EngineConfig::default(), clock)
        .with_generator(DeckGenerator::with_seed(seed))
}

pub fn outcome(slot: &Slot, pass: bool) -> SlotOutcome {
    match slot.kind {
        SlotKind::Recognize => SlotOutcome::Recognized {
            first_answer_correct: pass,
        },
        SlotKind::Recall | SlotKind::Produce => SlotOutcome::Judged {
            verdict: if pass { SlotVerdict::Pass } else { SlotVerdict::Fail },
        },
    }
}

/// Drive the active session to its end; `pass` decides each slot.
/// Returns the report of the final step.
pub fn drive(trainer: &mut Trainer<MemoryStore>, mut pass: impl FnMut(&Slot) -> bool) -> StepReport {
    let mut last = None;
    while let Some(slot) = trainer.current_slot().cloned() {
        let report = trainer.submit(outcome(&slot, pass(&slot))).expect("slot completes");
        last = Some(report);
    }
    last.expect("session had at least one slot")
}
