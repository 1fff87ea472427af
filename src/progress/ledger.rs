use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::{
    db::Database,
    models::{AttemptRecord, Badge, BpReading, ScenarioProgress, UserProgress},
    scenario::ScenarioKey,
    scoring,
};

/// Correct attempts within one scenario before it counts as completed.
const COMPLETION_CORRECT: u32 = 5;

const EXPERIENCE_CORRECT: u32 = 50;
const EXPERIENCE_INCORRECT: u32 = 10;
const EXPERIENCE_PER_LEVEL: u32 = 100;

#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    pub accuracy: i32,
    pub is_correct: bool,
    pub new_badges: Vec<Badge>,
}

/// Authoritative in-memory copy of one user's progress, and its only
/// writer. Every recorded attempt mutates the aggregate in a fixed order
/// and then persists the whole object.
pub struct ProgressLedger {
    db: Database,
    progress: UserProgress,
}

impl ProgressLedger {
    pub fn new(db: Database, progress: UserProgress) -> Self {
        Self { db, progress }
    }

    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    pub fn scenario_progress(&self, key: ScenarioKey) -> Option<&ScenarioProgress> {
        self.progress.scenario(key)
    }

    pub fn is_unlocked(&self, key: ScenarioKey) -> bool {
        self.progress.is_unlocked(key)
    }

    /// Records one submitted reading. Call at most once per submission; two
    /// calls produce two attempts.
    pub async fn record_attempt(
        &mut self,
        scenario: ScenarioKey,
        true_reading: BpReading,
        entered: BpReading,
    ) -> Result<AttemptOutcome> {
        let score = scoring::score(true_reading, entered);
        let now = Utc::now();

        self.progress.attempts.push(AttemptRecord {
            id: Uuid::new_v4().to_string(),
            scenario_key: scenario,
            timestamp: now,
            true_systolic: true_reading.systolic,
            true_diastolic: true_reading.diastolic,
            entered_systolic: entered.systolic,
            entered_diastolic: entered.diastolic,
            systolic_error: score.systolic_error,
            diastolic_error: score.diastolic_error,
            average_error: score.average_error,
            accuracy: score.accuracy,
            is_correct: score.is_correct,
        });

        self.progress.total_attempts += 1;
        if score.is_correct {
            self.progress.total_correct += 1;
            self.progress.current_streak += 1;
            self.progress.best_streak = self
                .progress
                .best_streak
                .max(self.progress.current_streak);
        } else {
            self.progress.current_streak = 0;
        }

        self.progress.overall_accuracy = (f64::from(self.progress.total_correct)
            / f64::from(self.progress.total_attempts)
            * 100.0)
            .round() as i32;

        self.progress.experience += if score.is_correct {
            EXPERIENCE_CORRECT
        } else {
            EXPERIENCE_INCORRECT
        };
        self.progress.level = self.progress.experience / EXPERIENCE_PER_LEVEL;

        // Recomputed from the full attempt log rather than accumulated, so
        // the average cannot drift.
        let average_accuracy = scenario_average_accuracy(&self.progress, scenario);
        if let Some(entry) = self.progress.scenario_mut(scenario) {
            entry.attempts += 1;
            if score.is_correct {
                entry.correct_attempts += 1;
            }
            entry.average_accuracy = average_accuracy;
            entry.best_accuracy = entry.best_accuracy.max(score.accuracy);
            if entry.correct_attempts >= COMPLETION_CORRECT && !entry.completed {
                entry.completed = true;
                entry.completed_at = Some(now);
                info!("scenario {} completed", scenario.as_str());
            }
        }

        let total_correct = self.progress.total_correct;
        for entry in &mut self.progress.scenarios {
            if !entry.unlocked && total_correct >= entry.scenario_key.required_correct() {
                entry.unlocked = true;
                info!("scenario {} unlocked", entry.scenario_key.as_str());
            }
        }

        let new_badges = super::badges::evaluate(&self.progress, now);
        for badge in &new_badges {
            info!("badge earned: {}", badge.id);
        }
        self.progress.badges.extend(new_badges.iter().cloned());

        self.db
            .save_user_progress(&self.progress)
            .await
            .context("failed to persist progress after attempt")?;

        Ok(AttemptOutcome {
            accuracy: score.accuracy,
            is_correct: score.is_correct,
            new_badges,
        })
    }
}

fn scenario_average_accuracy(progress: &UserProgress, scenario: ScenarioKey) -> i32 {
    let accuracies: Vec<i32> = progress
        .attempts
        .iter()
        .filter(|attempt| attempt.scenario_key == scenario)
        .map(|attempt| attempt.accuracy)
        .collect();
    if accuracies.is_empty() {
        return 0;
    }
    (accuracies.iter().map(|&a| f64::from(a)).sum::<f64>() / accuracies.len() as f64).round()
        as i32
}
