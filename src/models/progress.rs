use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scenario::ScenarioKey;

use super::user::User;

/// One submitted reading. Append-only; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub id: String,
    pub scenario_key: ScenarioKey,
    pub timestamp: DateTime<Utc>,
    pub true_systolic: i32,
    pub true_diastolic: i32,
    pub entered_systolic: i32,
    pub entered_diastolic: i32,
    pub systolic_error: i32,
    pub diastolic_error: i32,
    pub average_error: f64,
    pub accuracy: i32,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioProgress {
    pub scenario_key: ScenarioKey,
    pub scenario_name: String,
    pub attempts: u32,
    pub correct_attempts: u32,
    /// Mean accuracy over this scenario's attempts, recomputed from the full
    /// attempt log on every update.
    pub average_accuracy: i32,
    pub best_accuracy: i32,
    /// Monotonic: once true, never reverts.
    pub unlocked: bool,
    /// Monotonic: set once at five correct attempts.
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub criteria: String,
    pub earned_at: DateTime<Utc>,
}

/// Aggregate root for everything a user has done across sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user: User,
    pub scenarios: Vec<ScenarioProgress>,
    /// Insertion order is earn order.
    pub badges: Vec<Badge>,
    pub attempts: Vec<AttemptRecord>,
    pub total_attempts: u32,
    pub total_correct: u32,
    pub overall_accuracy: i32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub level: u32,
    pub experience: u32,
}

impl UserProgress {
    /// Fresh progress for a new account: only the healthy scenario unlocked.
    pub fn new(user: User) -> Self {
        Self {
            user,
            scenarios: default_scenario_progress(),
            badges: Vec::new(),
            attempts: Vec::new(),
            total_attempts: 0,
            total_correct: 0,
            overall_accuracy: 0,
            current_streak: 0,
            best_streak: 0,
            level: 0,
            experience: 0,
        }
    }

    pub fn scenario(&self, key: ScenarioKey) -> Option<&ScenarioProgress> {
        self.scenarios.iter().find(|s| s.scenario_key == key)
    }

    pub fn scenario_mut(&mut self, key: ScenarioKey) -> Option<&mut ScenarioProgress> {
        self.scenarios.iter_mut().find(|s| s.scenario_key == key)
    }

    pub fn is_unlocked(&self, key: ScenarioKey) -> bool {
        self.scenario(key).map(|s| s.unlocked).unwrap_or(false)
    }
}

fn default_scenario_progress() -> Vec<ScenarioProgress> {
    ScenarioKey::all()
        .into_iter()
        .map(|key| ScenarioProgress {
            scenario_key: key,
            scenario_name: key.display_name().to_string(),
            attempts: 0,
            correct_attempts: 0,
            average_accuracy: 0,
            best_accuracy: 0,
            unlocked: key == ScenarioKey::Healthy,
            completed: false,
            completed_at: None,
        })
        .collect()
}
