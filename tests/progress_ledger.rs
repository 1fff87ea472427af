//! Integration tests for the progress ledger: attempt recording, streaks,
//! unlock gating, completion, and badge awards against an in-memory store.

use cuffsim::auth::IdentityStore;
use cuffsim::db::Database;
use cuffsim::models::BpReading;
use cuffsim::scenario::ScenarioKey;

const TRUE_READING: BpReading = BpReading {
    systolic: 110,
    diastolic: 70,
};

/// Within the ±5 tolerance on both values.
fn close_entry() -> BpReading {
    BpReading::new(112, 69)
}

/// Far outside tolerance on both values.
fn wild_entry() -> BpReading {
    BpReading::new(160, 100)
}

async fn fresh_identity() -> IdentityStore {
    let db = Database::in_memory().expect("in-memory db");
    let mut identity = IdentityStore::new(db);
    let created = identity
        .signup("trainee@example.com", "Trainee", "hunter2")
        .await
        .expect("signup");
    assert!(created);
    identity
}

#[tokio::test]
async fn first_correct_attempt_awards_first_success() {
    let mut identity = fresh_identity().await;
    let ledger = identity.ledger_mut().unwrap();

    let outcome = ledger
        .record_attempt(ScenarioKey::Healthy, TRUE_READING, close_entry())
        .await
        .unwrap();

    assert!(outcome.is_correct);
    assert_eq!(outcome.new_badges.len(), 1);
    assert_eq!(outcome.new_badges[0].id, "first_success");

    let progress = ledger.progress();
    assert_eq!(progress.total_attempts, 1);
    assert_eq!(progress.total_correct, 1);
    assert_eq!(progress.experience, 50);
    assert_eq!(progress.level, 0);
}

#[tokio::test]
async fn fifth_correct_attempt_unlocks_completes_and_awards() {
    let mut identity = fresh_identity().await;
    let ledger = identity.ledger_mut().unwrap();

    assert!(!ledger.is_unlocked(ScenarioKey::Hypertensive));

    let mut last = None;
    for _ in 0..5 {
        last = Some(
            ledger
                .record_attempt(ScenarioKey::Healthy, TRUE_READING, close_entry())
                .await
                .unwrap(),
        );
    }
    let outcome = last.unwrap();

    let badge_ids: Vec<&str> = outcome.new_badges.iter().map(|b| b.id.as_str()).collect();
    assert!(badge_ids.contains(&"accuracy_ace"), "got {badge_ids:?}");
    assert!(badge_ids.contains(&"streak_master"), "got {badge_ids:?}");

    assert!(ledger.is_unlocked(ScenarioKey::Hypertensive));
    assert!(!ledger.is_unlocked(ScenarioKey::Arrhythmic));

    let healthy = ledger.scenario_progress(ScenarioKey::Healthy).unwrap();
    assert!(healthy.completed);
    assert!(healthy.completed_at.is_some());
    assert_eq!(healthy.correct_attempts, 5);
}

#[tokio::test]
async fn tenth_correct_attempt_unlocks_arrhythmic_and_hero() {
    let mut identity = fresh_identity().await;
    let ledger = identity.ledger_mut().unwrap();

    let mut all_badges = Vec::new();
    for _ in 0..10 {
        let outcome = ledger
            .record_attempt(ScenarioKey::Healthy, TRUE_READING, close_entry())
            .await
            .unwrap();
        all_badges.extend(outcome.new_badges);
    }

    assert!(ledger.is_unlocked(ScenarioKey::Arrhythmic));
    assert!(all_badges.iter().any(|b| b.id == "hypertension_hero"));
    // 10/10 correct with accuracy 97 each -> precision_expert too.
    assert!(all_badges.iter().any(|b| b.id == "precision_expert"));

    // No badge is ever issued twice.
    let mut ids: Vec<&str> = all_badges.iter().map(|b| b.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), all_badges.len());
}

#[tokio::test]
async fn incorrect_attempt_resets_streak_but_not_best() {
    let mut identity = fresh_identity().await;
    let ledger = identity.ledger_mut().unwrap();

    for _ in 0..3 {
        ledger
            .record_attempt(ScenarioKey::Healthy, TRUE_READING, close_entry())
            .await
            .unwrap();
    }
    assert_eq!(ledger.progress().current_streak, 3);
    assert_eq!(ledger.progress().best_streak, 3);

    let outcome = ledger
        .record_attempt(ScenarioKey::Healthy, TRUE_READING, wild_entry())
        .await
        .unwrap();
    assert!(!outcome.is_correct);
    assert_eq!(ledger.progress().current_streak, 0);
    assert_eq!(ledger.progress().best_streak, 3);

    ledger
        .record_attempt(ScenarioKey::Healthy, TRUE_READING, close_entry())
        .await
        .unwrap();
    assert_eq!(ledger.progress().current_streak, 1);
    assert_eq!(ledger.progress().best_streak, 3);
}

#[tokio::test]
async fn overall_accuracy_never_drifts_over_many_attempts() {
    let mut identity = fresh_identity().await;
    let ledger = identity.ledger_mut().unwrap();

    let mut correct = 0u32;
    for i in 0..100 {
        let entry = if i % 3 == 0 { wild_entry() } else { close_entry() };
        let outcome = ledger
            .record_attempt(ScenarioKey::Healthy, TRUE_READING, entry)
            .await
            .unwrap();
        if outcome.is_correct {
            correct += 1;
        }

        let progress = ledger.progress();
        let expected = (f64::from(correct) / f64::from(i + 1) * 100.0).round() as i32;
        assert_eq!(progress.overall_accuracy, expected, "drift at attempt {i}");
    }

    assert_eq!(ledger.progress().total_attempts, 100);
    assert_eq!(ledger.progress().total_correct, correct);
}

#[tokio::test]
async fn scenario_average_accuracy_is_recomputed_from_the_log() {
    let mut identity = fresh_identity().await;
    let ledger = identity.ledger_mut().unwrap();

    // accuracy 97 (errors 2 and 1), then accuracy 30 (errors 50 and 20).
    ledger
        .record_attempt(ScenarioKey::Healthy, TRUE_READING, close_entry())
        .await
        .unwrap();
    ledger
        .record_attempt(ScenarioKey::Healthy, TRUE_READING, BpReading::new(160, 90))
        .await
        .unwrap();

    let healthy = ledger.scenario_progress(ScenarioKey::Healthy).unwrap();
    assert_eq!(healthy.attempts, 2);
    assert_eq!(healthy.average_accuracy, 64); // round((97 + 30) / 2)
    assert_eq!(healthy.best_accuracy, 97);
}

#[tokio::test]
async fn attempts_on_one_scenario_leave_others_untouched() {
    let mut identity = fresh_identity().await;
    let ledger = identity.ledger_mut().unwrap();

    for _ in 0..6 {
        ledger
            .record_attempt(ScenarioKey::Healthy, TRUE_READING, close_entry())
            .await
            .unwrap();
    }
    ledger
        .record_attempt(
            ScenarioKey::Hypertensive,
            BpReading::new(150, 95),
            BpReading::new(151, 96),
        )
        .await
        .unwrap();

    let healthy = ledger.scenario_progress(ScenarioKey::Healthy).unwrap();
    let hypertensive = ledger.scenario_progress(ScenarioKey::Hypertensive).unwrap();
    assert_eq!(healthy.attempts, 6);
    assert_eq!(hypertensive.attempts, 1);
    assert_eq!(hypertensive.correct_attempts, 1);
    assert!(!hypertensive.completed);
}

#[tokio::test]
async fn progress_survives_logout_and_login() {
    let db = Database::in_memory().expect("in-memory db");
    let mut identity = IdentityStore::new(db);
    assert!(identity
        .signup("persist@example.com", "Persist", "pw")
        .await
        .unwrap());

    {
        let ledger = identity.ledger_mut().unwrap();
        for _ in 0..3 {
            ledger
                .record_attempt(ScenarioKey::Healthy, TRUE_READING, close_entry())
                .await
                .unwrap();
        }
    }

    identity.logout().await.unwrap();
    assert!(identity.ledger().is_none());

    assert!(identity.login("persist@example.com", "pw").await.unwrap());
    let progress = identity.ledger().unwrap().progress();
    assert_eq!(progress.total_attempts, 3);
    assert_eq!(progress.total_correct, 3);
    assert_eq!(progress.attempts.len(), 3);
    assert_eq!(progress.current_streak, 3);
}
