use serde::{Deserialize, Serialize};
use std::fmt;

/// A systolic/diastolic pair in mmHg. No ordering is enforced between the
/// two values; generation keeps them physiologically ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BpReading {
    pub systolic: i32,
    pub diastolic: i32,
}

impl BpReading {
    pub fn new(systolic: i32, diastolic: i32) -> Self {
        Self { systolic, diastolic }
    }
}

impl fmt::Display for BpReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.systolic, self.diastolic)
    }
}
