use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_RATING: f64 = 1000.0;
pub const DEFAULT_VOLATILITY: f64 = 0.06;
pub const MIN_DIFFICULTY: i32 = 1;
pub const MAX_DIFFICULTY: i32 = 5;

/// Skill estimate for one (child, unit) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRating {
    pub child_id: Uuid,
    pub unit: String,
    pub rating: f64,
    pub volatility: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl UnitRating {
    pub fn new(child_id: Uuid, unit: impl Into<String>, rating: f64) -> Self {
        Self {
            child_id,
            unit: unit.into(),
            rating,
            volatility: Some(DEFAULT_VOLATILITY),
            updated_at: Utc::now(),
        }
    }
}

/// `unit` may only be practised once `requires` is mastered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerequisiteEdge {
    pub unit: String,
    pub requires: String,
}

impl PrerequisiteEdge {
    pub fn new(unit: impl Into<String>, requires: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            requires: requires.into(),
        }
    }
}

/// Aggregate pacing state for one child.
///
/// `version` is the optimistic-concurrency token: `0` means the record has
/// never been persisted; the store bumps it on every successful write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumState {
    pub child_id: Uuid,
    pub focus_units: Vec<String>,
    pub difficulty: i32,
    pub success_streak: i64,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl CurriculumState {
    pub fn new(child_id: Uuid) -> Self {
        Self {
            child_id,
            focus_units: Vec::new(),
            difficulty: MIN_DIFFICULTY,
            success_streak: 0,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }

    pub fn focus_csv(&self) -> String {
        self.focus_units.join(",")
    }

    pub fn parse_focus_csv(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|unit| !unit.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// One scored practice attempt, consumed by a single feedback application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcome {
    pub child_id: Uuid,
    pub score: i32,
    #[serde(default)]
    pub target_units: Vec<String>,
    #[serde(default)]
    pub weak_units: Vec<String>,
}

pub(crate) fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_csv_round_trips_trimmed_units() {
        let parsed = CurriculumState::parse_focus_csv(" R, S ,,CH");
        assert_eq!(parsed, vec!["R", "S", "CH"]);

        let mut state = CurriculumState::new(Uuid::new_v4());
        state.focus_units = parsed;
        assert_eq!(state.focus_csv(), "R,S,CH");
    }

    #[test]
    fn new_curriculum_starts_unpersisted_at_lowest_difficulty() {
        let state = CurriculumState::new(Uuid::new_v4());
        assert!(!state.is_persisted());
        assert_eq!(state.difficulty, MIN_DIFFICULTY);
        assert_eq!(state.success_streak, 0);
        assert!(state.focus_units.is_empty());
    }

    #[test]
    fn attempt_outcome_uses_camel_case() {
        let json = r#"{"childId":"8c2f6a34-1d7e-4b5a-9a38-2f4c1e9d7b10","score":88,"weakUnits":["R"]}"#;
        let outcome: AttemptOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome.score, 88);
        assert_eq!(outcome.weak_units, vec!["R"]);
        assert!(outcome.target_units.is_empty());
    }
}
