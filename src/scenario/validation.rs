//! Plausibility checks for generated readings against AHA 2017 categories.

use serde::Serialize;

use crate::models::BpReading;

use super::ScenarioKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BpCategory {
    Normal,
    Elevated,
    Stage1,
    Stage2,
    Crisis,
}

impl BpCategory {
    pub fn label(&self) -> &'static str {
        match self {
            BpCategory::Normal => "Normal",
            BpCategory::Elevated => "Elevated",
            BpCategory::Stage1 => "Stage 1 Hypertension",
            BpCategory::Stage2 => "Stage 2 Hypertension",
            BpCategory::Crisis => "Hypertensive Crisis",
        }
    }
}

pub fn categorize(reading: BpReading) -> BpCategory {
    let BpReading {
        systolic,
        diastolic,
    } = reading;

    if systolic < 120 && diastolic < 80 {
        BpCategory::Normal
    } else if systolic < 130 && diastolic < 80 {
        BpCategory::Elevated
    } else if (130..=139).contains(&systolic) || (80..=89).contains(&diastolic) {
        BpCategory::Stage1
    } else if systolic >= 180 || diastolic >= 120 {
        BpCategory::Crisis
    } else {
        BpCategory::Stage2
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioCheck {
    pub is_valid: bool,
    pub expected_category: &'static str,
    pub actual_category: BpCategory,
    pub warnings: Vec<String>,
}

/// Checks that a reading is plausible for the scenario that produced it.
pub fn validate_reading(key: ScenarioKey, reading: BpReading) -> ScenarioCheck {
    let BpReading {
        systolic,
        diastolic,
    } = reading;
    let mut warnings = Vec::new();
    let mut is_valid = true;

    let expected_category = match key {
        ScenarioKey::Healthy => {
            if systolic >= 120 || diastolic >= 80 {
                is_valid = false;
                warnings.push("reading is elevated for a healthy adult scenario".to_string());
            }
            if systolic < 90 || diastolic < 60 {
                warnings.push("reading may be too low (hypotensive)".to_string());
            }
            "Normal"
        }
        ScenarioKey::Hypertensive => {
            if systolic < 130 && diastolic < 80 {
                is_valid = false;
                warnings.push("reading is too low for a hypertensive scenario".to_string());
            }
            if systolic > 180 || diastolic > 120 {
                warnings.push("reading indicates hypertensive crisis".to_string());
            }
            "Stage 1 or 2 Hypertension"
        }
        ScenarioKey::Arrhythmic => {
            if !(70..=200).contains(&systolic) {
                warnings.push("systolic outside realistic arrhythmic range".to_string());
            }
            if !(40..=130).contains(&diastolic) {
                warnings.push("diastolic outside realistic arrhythmic range".to_string());
            }
            "Variable (Normal to Hypertensive)"
        }
    };

    ScenarioCheck {
        is_valid,
        expected_category,
        actual_category: categorize(reading),
        warnings,
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRange {
    pub systolic_min: i32,
    pub systolic_max: i32,
    pub diastolic_min: i32,
    pub diastolic_max: i32,
    pub description: &'static str,
}

/// Expected bands per scenario, shown to trainees for orientation.
pub fn display_range(key: ScenarioKey) -> ScenarioRange {
    match key {
        ScenarioKey::Healthy => ScenarioRange {
            systolic_min: 90,
            systolic_max: 119,
            diastolic_min: 60,
            diastolic_max: 79,
            description: "Normal blood pressure range",
        },
        ScenarioKey::Hypertensive => ScenarioRange {
            systolic_min: 130,
            systolic_max: 170,
            diastolic_min: 80,
            diastolic_max: 110,
            description: "Hypertensive range (Stage 1 & 2)",
        },
        ScenarioKey::Arrhythmic => ScenarioRange {
            systolic_min: 70,
            systolic_max: 200,
            diastolic_min: 40,
            diastolic_max: 130,
            description: "Variable range due to irregular rhythm",
        },
    }
}
