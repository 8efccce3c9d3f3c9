//! Judge contract
//!
//! Recall and Produce attempts are scored 0-4 by an external evaluator. This
//! module normalizes its JSON reply into an [`Evaluation`] and maps the score
//! onto a [`SlotVerdict`]. Replies that cannot be read become a zero score
//! with a fallback summary, never an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::SlotVerdict;

pub const MAX_SCORE: u8 = 4;

const MAX_POINTS: usize = 3;
const MAX_POINT_CHARS: usize = 120;
const MAX_SUMMARY_CHARS: usize = 400;

pub const FALLBACK_SUMMARY: &str = "We couldn't score this attempt reliably. Please try again.";

/// Evaluator score, always within 0..=4
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JudgeScore(u8);

impl JudgeScore {
    pub fn new(raw: i64) -> Self {
        Self(raw.clamp(0, MAX_SCORE as i64) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn verdict(&self, pass_score: u8) -> SlotVerdict {
        if self.0 >= pass_score {
            SlotVerdict::Pass
        } else {
            SlotVerdict::Fail
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub word: String,
    pub score: JudgeScore,
    pub summary: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

impl Evaluation {
    /// Normalize a reply object. Accepts the fields at the top level or
    /// wrapped in `{"evaluation": {...}}`; top-level fields win.
    pub fn from_json(value: &Value, word_hint: &str) -> Self {
        let Some(outer) = value.as_object() else {
            return Self::fallback(word_hint, "evaluator reply was not an object");
        };

        let mut fields: Map<String, Value> = outer.clone();
        if let Some(Value::Object(inner)) = fields.remove("evaluation") {
            for (key, value) in inner {
                fields.entry(key).or_insert(value);
            }
        }

        let word = fields
            .get("word")
            .and_then(Value::as_str)
            .filter(|w| !w.trim().is_empty())
            .unwrap_or(if word_hint.is_empty() { "unknown" } else { word_hint })
            .to_string();

        let summary = fields
            .get("summary")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| truncate(s, MAX_SUMMARY_CHARS))
            .unwrap_or_else(|| FALLBACK_SUMMARY.to_string());

        Self {
            word,
            score: JudgeScore::new(coerce_score(fields.get("overall_score_0_to_4"))),
            summary,
            pros: points(fields.get("pros")),
            cons: points(fields.get("cons")),
        }
    }

    /// Normalize raw evaluator text, which may wrap the object in code fences
    /// or surrounding prose.
    pub fn parse_response(text: &str, word_hint: &str) -> Self {
        let Some(candidate) = extract_object(text) else {
            tracing::warn!(word = word_hint, "evaluator reply contained no JSON object");
            return Self::fallback(word_hint, "reply contained no JSON object");
        };

        let parsed = serde_json::from_str::<Value>(&candidate).or_else(|_| {
            let flattened: String = candidate
                .chars()
                .map(|c| if matches!(c, '\r' | '\n' | '\t') { ' ' } else { c })
                .collect();
            serde_json::from_str::<Value>(&flattened)
        });

        match parsed {
            Ok(value) => Self::from_json(&value, word_hint),
            Err(e) => {
                tracing::warn!(word = word_hint, error = %e, "evaluator reply was not valid JSON");
                Self::fallback(word_hint, "reply was not valid JSON")
            }
        }
    }

    pub fn verdict(&self, pass_score: u8) -> SlotVerdict {
        self.score.verdict(pass_score)
    }

    fn fallback(word_hint: &str, reason: &str) -> Self {
        Self {
            word: if word_hint.is_empty() { "unknown".to_string() } else { word_hint.to_string() },
            score: JudgeScore::default(),
            summary: FALLBACK_SUMMARY.to_string(),
            pros: vec!["Recording received.".to_string()],
            cons: vec![truncate(reason, MAX_POINT_CHARS)],
        }
    }
}

fn coerce_score(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        Some(Value::Bool(b)) => *b as i64,
        _ => 0,
    }
}

/// Pros/cons arrive as `{"points": [...]}`, a bare list or a single string
fn points(value: Option<&Value>) -> Vec<String> {
    let items: Vec<String> = match value {
        Some(Value::Object(obj)) => match obj.get("points") {
            Some(Value::Array(list)) => list.iter().map(display).collect(),
            _ => Vec::new(),
        },
        Some(Value::Array(list)) => list.iter().map(display).collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![truncate(s.trim(), MAX_POINT_CHARS)],
        _ => Vec::new(),
    };
    items.into_iter().take(MAX_POINTS).collect()
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn extract_object(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let unfenced = if trimmed.starts_with("```") {
        trimmed.replace("```json", "").replace("```", "")
    } else {
        trimmed.to_string()
    };

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end <= start {
        return None;
    }

    Some(
        unfenced[start..=end]
            .chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
            .collect(),
    )
}
