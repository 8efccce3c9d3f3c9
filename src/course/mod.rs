//! Course catalog
//!
//! Lessons in path order, grouped into units, plus the word set of every
//! practice lesson. Loaded from a JSON document:
//!
//! ```json
//! {
//!   "lessons": [{ "id": 1, "title": "Lesson 1", "description": "Greetings",
//!                 "kind": "lesson", "xp": 10, "unit": 1 }],
//!   "words": { "1": [{ "text": "Hello", "mediaRef": "videos/hello.mp4",
//!                      "correctAnswer": "Hello", "decoys": ["Goodbye"] }] }
//! }
//! ```

mod progress;

pub use progress::{LearnerProgress, LevelInfo, LEVEL_THRESHOLDS};

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CourseError;
use crate::types::{LessonId, Word};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LessonKind {
    /// Six-slot practice lesson over its own word set
    Lesson,
    /// Unit test over the pooled words of the unit
    Checkpoint,
    /// Milestone with no practice
    Achievement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub kind: LessonKind,
    pub xp: u32,
    pub unit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LessonStatus {
    Locked,
    Available,
    /// The next lesson to take
    Current,
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// In path order
    lessons: Vec<Lesson>,
    #[serde(default)]
    words: BTreeMap<LessonId, Vec<Word>>,
}

impl Course {
    pub fn new(lessons: Vec<Lesson>, words: BTreeMap<LessonId, Vec<Word>>) -> Self {
        Self { lessons, words }
    }

    pub fn from_json(json: &str) -> Result<Self, CourseError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CourseError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let course = Self::from_json(&raw)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            lessons = course.lessons.len(),
            "course loaded"
        );
        Ok(course)
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn lesson(&self, id: LessonId) -> Result<&Lesson, CourseError> {
        self.lessons
            .iter()
            .find(|lesson| lesson.id == id)
            .ok_or(CourseError::LessonNotFound(id))
    }

    /// Word set of a lesson; empty when it has none
    pub fn words_for(&self, id: LessonId) -> &[Word] {
        self.words.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every lesson of the unit, in path order
    pub fn unit_lesson_ids(&self, unit: u32) -> BTreeSet<LessonId> {
        self.lessons
            .iter()
            .filter(|lesson| lesson.unit == unit)
            .map(|lesson| lesson.id)
            .collect()
    }

    /// Unit-test pool: the word sets of the unit's practice lessons, concatenated in order
    pub fn unit_words(&self, unit: u32) -> Vec<Word> {
        self.lessons
            .iter()
            .filter(|lesson| lesson.unit == unit && lesson.kind == LessonKind::Lesson)
            .flat_map(|lesson| self.words_for(lesson.id).iter().cloned())
            .collect()
    }

    pub fn checkpoint_for_unit(&self, unit: u32) -> Result<&Lesson, CourseError> {
        self.lessons
            .iter()
            .find(|lesson| lesson.unit == unit && lesson.kind == LessonKind::Checkpoint)
            .ok_or(CourseError::NoCheckpoint(unit))
    }

    /// Status of every lesson in path order. A lesson unlocks once its
    /// predecessor is completed; the first unlocked one is `Current`.
    pub fn lesson_statuses(&self, completed: &BTreeSet<LessonId>) -> Vec<(LessonId, LessonStatus)> {
        let unlocked = |index: usize| index == 0 || completed.contains(&self.lessons[index - 1].id);

        let current = self
            .lessons
            .iter()
            .enumerate()
            .position(|(index, lesson)| !completed.contains(&lesson.id) && unlocked(index));

        self.lessons
            .iter()
            .enumerate()
            .map(|(index, lesson)| {
                let status = if completed.contains(&lesson.id) {
                    LessonStatus::Completed
                } else if Some(index) == current {
                    LessonStatus::Current
                } else if unlocked(index) {
                    LessonStatus::Available
                } else {
                    LessonStatus::Locked
                };
                (lesson.id, status)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COURSE_JSON: &str = r#"{
        "lessons": [
            { "id": 1, "title": "Lesson 1", "description": "Greetings", "kind": "lesson", "xp": 10, "unit": 1 },
            { "id": 2, "title": "Lesson 2", "kind": "lesson", "xp": 10, "unit": 1 },
            { "id": 4, "title": "Unit 1 Test", "kind": "checkpoint", "xp": 25, "unit": 1 },
            { "id": 5, "title": "Lesson 4", "kind": "lesson", "xp": 15, "unit": 2 },
            { "id": 19, "title": "Final Test", "kind": "achievement", "xp": 100, "unit": 2 }
        ],
        "words": {
            "1": [
                { "text": "Hello", "mediaRef": "hello.mp4", "correctAnswer": "Hello", "decoys": ["Goodbye", "Please"] },
                { "text": "Goodbye", "mediaRef": "goodbye.mp4", "correctAnswer": "Goodbye", "decoys": ["Hello"] }
            ],
            "2": [
                { "text": "Please", "mediaRef": "please.mp4", "correctAnswer": "Please", "decoys": ["Hello"] }
            ]
        }
    }"#;

    fn course() -> Course {
        Course::from_json(COURSE_JSON).unwrap()
    }

    #[test]
    fn test_parse_and_lookup() {
        let course = course();
        assert_eq!(course.lessons().len(), 5);
        assert_eq!(course.lesson(4).unwrap().kind, LessonKind::Checkpoint);
        assert!(matches!(course.lesson(99), Err(CourseError::LessonNotFound(99))));
        assert_eq!(course.words_for(1).len(), 2);
        assert!(course.words_for(4).is_empty());
    }

    #[test]
    fn test_unit_pool_concatenates_lessons_in_order() {
        let words: Vec<String> = course().unit_words(1).into_iter().map(|w| w.text).collect();
        assert_eq!(words, vec!["Hello", "Goodbye", "Please"]);
        assert!(course().unit_words(3).is_empty());
    }

    #[test]
    fn test_unit_lessons_and_checkpoint() {
        let course = course();
        assert_eq!(course.unit_lesson_ids(1), BTreeSet::from([1, 2, 4]));
        assert_eq!(course.checkpoint_for_unit(1).unwrap().id, 4);
        assert!(matches!(course.checkpoint_for_unit(2), Err(CourseError::NoCheckpoint(2))));
    }

    #[test]
    fn test_statuses_unlock_in_order() {
        let course = course();
        let statuses = course.lesson_statuses(&BTreeSet::new());
        assert_eq!(statuses[0], (1, LessonStatus::Current));
        assert!(statuses[1..].iter().all(|(_, s)| *s == LessonStatus::Locked));

        let statuses = course.lesson_statuses(&BTreeSet::from([1]));
        assert_eq!(statuses[0].1, LessonStatus::Completed);
        assert_eq!(statuses[1].1, LessonStatus::Current);
        assert_eq!(statuses[2].1, LessonStatus::Locked);
    }

    #[test]
    fn test_statuses_after_out_of_order_completion() {
        // Lesson 1 still open while later lessons are done
        let statuses = course().lesson_statuses(&BTreeSet::from([2, 5]));
        assert_eq!(statuses[0].1, LessonStatus::Current);
        assert_eq!(statuses[2].1, LessonStatus::Available);
        assert_eq!(statuses[4].1, LessonStatus::Available);
    }

    #[test]
    fn test_malformed_course_is_a_parse_error() {
        assert!(matches!(Course::from_json("{\"lessons\": 3}"), Err(CourseError::Parse(_))));
    }
}
