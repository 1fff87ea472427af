pub mod validation;

use anyhow::{anyhow, Result};
use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::BpReading;

/// Reading used when a raw scenario key fails to parse.
pub const DEFAULT_READING: BpReading = BpReading {
    systolic: 120,
    diastolic: 80,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ScenarioKey {
    Healthy,
    Hypertensive,
    Arrhythmic,
}

impl ScenarioKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKey::Healthy => "healthy",
            ScenarioKey::Hypertensive => "hypertensive",
            ScenarioKey::Arrhythmic => "arrhythmic",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ScenarioKey::Healthy => "Healthy Adult",
            ScenarioKey::Hypertensive => "Hypertensive",
            ScenarioKey::Arrhythmic => "Arrhythmic",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "healthy" => Ok(ScenarioKey::Healthy),
            "hypertensive" => Ok(ScenarioKey::Hypertensive),
            "arrhythmic" => Ok(ScenarioKey::Arrhythmic),
            _ => Err(anyhow!("unknown scenario key '{value}'")),
        }
    }

    pub fn all() -> [ScenarioKey; 3] {
        [
            ScenarioKey::Healthy,
            ScenarioKey::Hypertensive,
            ScenarioKey::Arrhythmic,
        ]
    }

    /// Total correct attempts required before this scenario unlocks.
    pub fn required_correct(&self) -> u32 {
        match self {
            ScenarioKey::Healthy => 0,
            ScenarioKey::Hypertensive => 5,
            ScenarioKey::Arrhythmic => 10,
        }
    }
}

/// Draw a true reading for the scenario. Pure apart from the Rng, so tests
/// can pass a seeded generator.
pub fn generate(key: ScenarioKey, rng: &mut impl Rng) -> BpReading {
    match key {
        ScenarioKey::Healthy => healthy(rng),
        ScenarioKey::Hypertensive => hypertensive(rng),
        ScenarioKey::Arrhythmic => arrhythmic(rng),
    }
}

/// Like [`generate`] but for an untrusted key string; falls back to the
/// default 120/80 reading instead of failing the session.
pub fn generate_for_key(raw: &str, rng: &mut impl Rng) -> BpReading {
    match ScenarioKey::parse(raw) {
        Ok(key) => generate(key, rng),
        Err(_) => {
            warn!("unknown scenario key '{raw}', using default reading");
            DEFAULT_READING
        }
    }
}

/// Multiplicative jitter of up to ±3%, rounded back to whole mmHg.
fn jitter(value: i32, rng: &mut impl Rng) -> i32 {
    (f64::from(value) * rng.gen_range(0.97..=1.03)).round() as i32
}

fn healthy(rng: &mut impl Rng) -> BpReading {
    let systolic = rng.gen_range(90..=119);
    let diastolic = rng.gen_range(60..=79);
    BpReading {
        systolic: jitter(systolic, rng).clamp(90, 119),
        diastolic: jitter(diastolic, rng).clamp(60, 79),
    }
}

fn hypertensive(rng: &mut impl Rng) -> BpReading {
    if rng.gen_bool(0.7) {
        // Stage 1
        let systolic = rng.gen_range(130..=139);
        let diastolic = rng.gen_range(80..=89);
        BpReading {
            systolic: jitter(systolic, rng).clamp(130, 139),
            diastolic: jitter(diastolic, rng).clamp(80, 89),
        }
    } else {
        // Stage 2
        let systolic = rng.gen_range(140..=170);
        let diastolic = rng.gen_range(90..=110);
        BpReading {
            systolic: jitter(systolic, rng).clamp(140, 170),
            diastolic: jitter(diastolic, rng).clamp(90, 110),
        }
    }
}

/// Beat-to-beat variability: a healthy or hypertensive base reading with an
/// independent perturbation on top. Callers re-roll this on every pump.
fn arrhythmic(rng: &mut impl Rng) -> BpReading {
    let base = if rng.gen_bool(0.5) {
        healthy(rng)
    } else {
        hypertensive(rng)
    };

    let magnitude = rng.gen_range(8.0..=15.0);
    let systolic_shift = rng.gen_range(-magnitude / 2.0..=magnitude / 2.0);
    let diastolic_span = 0.6 * magnitude / 2.0;
    let diastolic_shift = rng.gen_range(-diastolic_span..=diastolic_span);

    BpReading {
        systolic: ((f64::from(base.systolic) + systolic_shift).round() as i32).clamp(70, 200),
        diastolic: ((f64::from(base.diastolic) + diastolic_shift).round() as i32).clamp(40, 130),
    }
}
