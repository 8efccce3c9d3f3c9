use std::path::PathBuf;
use std::str::FromStr;

use crate::deck::DEFAULT_PRODUCE_MASTERY_THRESHOLD;
use crate::logging::LogSettings;

/// Thresholds used by deck generation, overrides and session evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Passed slots a new lesson needs (out of 6)
    pub lesson_pass_slots: u32,
    /// Passed slots a unit test needs (out of 12)
    pub unit_test_pass_slots: u32,
    /// Recognize accuracy a skip attempt needs
    pub skip_pass_accuracy: f64,
    /// Recognize accuracy below which the final lesson slot is re-targeted
    pub low_accuracy_threshold: f64,
    /// Mastery score at which the fifth lesson slot asks for Produce
    pub produce_mastery_threshold: f64,
    /// Judge score (0-4) counted as a pass
    pub judge_pass_score: u8,
    /// Reject Recall/Produce completions that carry no judge verdict
    pub require_judge_verdict: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lesson_pass_slots: 5,
            unit_test_pass_slots: 10,
            skip_pass_accuracy: 0.7,
            low_accuracy_threshold: 0.6,
            produce_mastery_threshold: DEFAULT_PRODUCE_MASTERY_THRESHOLD,
            judge_pass_score: 3,
            require_judge_verdict: false,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            lesson_pass_slots: env_parse("ASL_LESSON_PASS_SLOTS").unwrap_or(defaults.lesson_pass_slots),
            unit_test_pass_slots: env_parse("ASL_UNIT_TEST_PASS_SLOTS")
                .unwrap_or(defaults.unit_test_pass_slots),
            skip_pass_accuracy: env_parse("ASL_SKIP_PASS_ACCURACY")
                .map(|v: f64| v.clamp(0.0, 1.0))
                .unwrap_or(defaults.skip_pass_accuracy),
            low_accuracy_threshold: env_parse("ASL_LOW_ACCURACY_THRESHOLD")
                .map(|v: f64| v.clamp(0.0, 1.0))
                .unwrap_or(defaults.low_accuracy_threshold),
            produce_mastery_threshold: env_parse("ASL_PRODUCE_MASTERY_THRESHOLD")
                .unwrap_or(defaults.produce_mastery_threshold),
            judge_pass_score: env_parse("ASL_JUDGE_PASS_SCORE")
                .map(|v: u8| v.min(4))
                .unwrap_or(defaults.judge_pass_score),
            require_judge_verdict: std::env::var("ASL_REQUIRE_JUDGE_VERDICT")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.require_judge_verdict),
        }
    }
}

/// Process-level settings of the trainer binary
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub course_path: PathBuf,
    pub log: LogSettings,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let db_path = std::env::var("ASL_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/asl-trainer.db"));

        let course_path = std::env::var("ASL_COURSE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/course.json"));

        Self {
            db_path,
            course_path,
            log: LogSettings::from_env(),
            engine: EngineConfig::from_env(),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_session_rules() {
        let config = EngineConfig::default();
        assert_eq!(config.lesson_pass_slots, 5);
        assert_eq!(config.unit_test_pass_slots, 10);
        assert!((config.skip_pass_accuracy - 0.7).abs() < 1e-10);
        assert_eq!(config.judge_pass_score, 3);
        assert!(!config.require_judge_verdict);
    }

    #[test]
    fn test_from_env_reads_overrides() {
        std::env::set_var("ASL_UNIT_TEST_PASS_SLOTS", "11");
        std::env::set_var("ASL_SKIP_PASS_ACCURACY", "1.5");
        std::env::set_var("ASL_JUDGE_PASS_SCORE", "not-a-number");

        let config = EngineConfig::from_env();
        assert_eq!(config.unit_test_pass_slots, 11);
        assert!((config.skip_pass_accuracy - 1.0).abs() < 1e-10);
        assert_eq!(config.judge_pass_score, 3);

        std::env::remove_var("ASL_UNIT_TEST_PASS_SLOTS");
        std::env::remove_var("ASL_SKIP_PASS_ACCURACY");
        std::env::remove_var("ASL_JUDGE_PASS_SCORE");
    }
}
