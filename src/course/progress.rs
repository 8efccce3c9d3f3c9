use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{LessonId, Verdict};

/// Cumulative XP needed for each level; index = level - 1
pub const LEVEL_THRESHOLDS: [u32; 11] = [0, 20, 50, 95, 160, 250, 375, 550, 790, 1120, 1570];

/// XP span of every level past the last threshold
const TOP_LEVEL_SPAN: u32 = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProgress {
    pub completed_lessons: BTreeSet<LessonId>,
    pub total_xp: u32,
    /// XP toward today's goal
    pub daily_xp: u32,
}

impl LearnerProgress {
    /// Fold a session verdict in. Failed verdicts carry no XP and no
    /// completions, so applying them is a no-op.
    pub fn apply(&mut self, verdict: &Verdict) {
        self.completed_lessons
            .extend(verdict.completed_lesson_ids.iter().copied());
        self.total_xp = self.total_xp.saturating_add(verdict.xp_awarded);
        self.daily_xp = self.daily_xp.saturating_add(verdict.xp_awarded);
    }

    pub fn is_completed(&self, id: LessonId) -> bool {
        self.completed_lessons.contains(&id)
    }

    pub fn level(&self) -> LevelInfo {
        LevelInfo::from_xp(self.total_xp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelInfo {
    /// Starts at 1
    pub level: u32,
    pub xp_for_next_level: u32,
    /// Percent of the current level done, 0..=100
    pub level_progress: u32,
}

impl LevelInfo {
    pub fn from_xp(xp: u32) -> Self {
        let reached = LEVEL_THRESHOLDS
            .iter()
            .take_while(|&&threshold| xp >= threshold)
            .count();
        let level = reached.max(1);

        let current = LEVEL_THRESHOLDS[level - 1];
        let next = LEVEL_THRESHOLDS
            .get(level)
            .copied()
            .unwrap_or(LEVEL_THRESHOLDS[LEVEL_THRESHOLDS.len() - 1] + TOP_LEVEL_SPAN);

        // Past the last threshold xp may exceed `next`; progress caps at 100
        let into_level = xp - current;
        let needed = next - current;
        let level_progress = ((into_level as f64 / needed as f64) * 100.0).round().min(100.0) as u32;

        Self {
            level: level as u32,
            xp_for_next_level: next.saturating_sub(xp),
            level_progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FailureReason, SessionMode};

    fn verdict(passed: bool, xp: u32, ids: &[LessonId]) -> Verdict {
        Verdict {
            mode: SessionMode::NewLesson,
            passed,
            xp_awarded: xp,
            completed_lesson_ids: ids.iter().copied().collect(),
            failure_reason: (!passed).then_some(FailureReason::Lesson),
        }
    }

    #[test]
    fn test_apply_adds_completions_and_xp() {
        let mut progress = LearnerProgress::default();
        progress.apply(&verdict(true, 10, &[1]));
        progress.apply(&verdict(true, 0, &[2]));

        assert_eq!(progress.completed_lessons, BTreeSet::from([1, 2]));
        assert_eq!(progress.total_xp, 10);
        assert_eq!(progress.daily_xp, 10);
        assert!(progress.is_completed(2));
    }

    #[test]
    fn test_apply_failed_verdict_changes_nothing() {
        let mut progress = LearnerProgress::default();
        progress.apply(&verdict(false, 0, &[]));
        assert_eq!(progress, LearnerProgress::default());
    }

    #[test]
    fn test_level_info() {
        assert_eq!(
            LevelInfo::from_xp(0),
            LevelInfo {
                level: 1,
                xp_for_next_level: 20,
                level_progress: 0
            }
        );

        let info = LevelInfo::from_xp(35);
        assert_eq!(info.level, 2);
        assert_eq!(info.xp_for_next_level, 15);
        assert_eq!(info.level_progress, 50);

        let top = LevelInfo::from_xp(1570);
        assert_eq!(top.level, 11);
        assert_eq!(top.xp_for_next_level, 500);
        assert_eq!(top.level_progress, 0);
    }
}
