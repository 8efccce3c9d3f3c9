//! Benchmark suite for asl-lesson-engine
//!
//! Run with: cargo bench

use std::hint::black_box;

use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};

use asl_lesson_engine::{DeckGenerator, MasteryMap, SlotKind, Word};

fn unit_pool() -> Vec<Word> {
    ["Boy", "Girl", "Man", "Woman", "Father", "Mother"]
        .iter()
        .map(|text| Word::new(*text, format!("videos/{text}.mp4"), ["Hello", "Goodbye", "Please", "Sorry"]))
        .collect()
}

fn practiced(words: &[Word]) -> MasteryMap {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    words.iter().enumerate().fold(MasteryMap::new(), |map, (i, word)| {
        (0..i).fold(map, |map, n| map.update(word, SlotKind::Recall, n % 2 == 0, now))
    })
}

fn bench_lesson_deck(c: &mut Criterion) {
    let words = unit_pool();
    let mastery = practiced(&words);
    let mut generator = DeckGenerator::with_seed(42);
    c.bench_function("DeckGenerator::build_lesson_deck", |b| {
        b.iter(|| generator.build_lesson_deck(black_box(&words[..2]), black_box(&mastery)))
    });
}

fn bench_unit_test_deck(c: &mut Criterion) {
    let words = unit_pool();
    let mastery = practiced(&words);
    let mut generator = DeckGenerator::with_seed(42);
    c.bench_function("DeckGenerator::build_unit_test_deck", |b| {
        b.iter(|| generator.build_unit_test_deck(black_box(&words), black_box(&mastery)))
    });
}

fn bench_mastery_update(c: &mut Criterion) {
    let words = unit_pool();
    let mastery = practiced(&words);
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    c.bench_function("MasteryMap::update", |b| {
        b.iter(|| mastery.update(black_box(&words[3]), SlotKind::Produce, false, now))
    });
}

criterion_group!(benches, bench_lesson_deck, bench_unit_test_deck, bench_mastery_update);
criterion_main!(benches);
