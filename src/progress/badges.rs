use chrono::{DateTime, Utc};

use crate::models::{Badge, UserProgress};

pub struct BadgeSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub criteria: &'static str,
}

pub const BADGE_CATALOG: [BadgeSpec; 5] = [
    BadgeSpec {
        id: "first_success",
        name: "First Success",
        description: "Complete your first measurement successfully",
        icon: "🎯",
        criteria: "Complete 1 correct measurement",
    },
    BadgeSpec {
        id: "accuracy_ace",
        name: "Accuracy Ace",
        description: "Unlock the next scenario level",
        icon: "🏆",
        criteria: "Complete 5 correct measurements",
    },
    BadgeSpec {
        id: "hypertension_hero",
        name: "Hypertension Hero",
        description: "Master the hypertensive scenario",
        icon: "💪",
        criteria: "Unlock arrhythmic scenario",
    },
    BadgeSpec {
        id: "streak_master",
        name: "Streak Master",
        description: "Achieve a 5-measurement winning streak",
        icon: "🔥",
        criteria: "Get 5 correct measurements in a row",
    },
    BadgeSpec {
        id: "precision_expert",
        name: "Precision Expert",
        description: "Achieve 95%+ accuracy over 10 attempts",
        icon: "⭐",
        criteria: "Maintain 95%+ accuracy over 10 attempts",
    },
];

/// Returns catalog badges the aggregate now qualifies for and does not
/// already hold. Evaluated against the post-update aggregate.
pub fn evaluate(progress: &UserProgress, now: DateTime<Utc>) -> Vec<Badge> {
    BADGE_CATALOG
        .iter()
        .filter(|spec| !progress.badges.iter().any(|held| held.id == spec.id))
        .filter(|spec| qualifies(spec.id, progress))
        .map(|spec| Badge {
            id: spec.id.to_string(),
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            icon: spec.icon.to_string(),
            criteria: spec.criteria.to_string(),
            earned_at: now,
        })
        .collect()
}

fn qualifies(badge_id: &str, progress: &UserProgress) -> bool {
    match badge_id {
        "first_success" => progress.total_correct >= 1,
        "accuracy_ace" => progress.total_correct >= 5,
        "hypertension_hero" => progress.total_correct >= 10,
        "streak_master" => progress.current_streak >= 5,
        "precision_expert" => progress.total_attempts >= 10 && progress.overall_accuracy >= 95,
        _ => false,
    }
}
