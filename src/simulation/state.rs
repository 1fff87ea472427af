use serde::{Deserialize, Serialize};

pub const PUMP_STEP: i32 = 10;
pub const MAX_PRESSURE: i32 = 200;
pub const DEFLATE_STEP: i32 = 1;

/// Live cuff pressure state. Pumping is instantaneous; deflation is driven
/// by an external ticker calling [`CuffState::deflate_tick`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuffState {
    pub pressure: i32,
    pub deflating: bool,
    pub pumping: bool,
}

impl Default for CuffState {
    fn default() -> Self {
        Self {
            pressure: 0,
            deflating: false,
            pumping: false,
        }
    }
}

impl CuffState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one pump stroke. Returns true when this stroke should start
    /// the deflation ticker (first positive pressure, no deflation running).
    pub fn pump(&mut self) -> bool {
        self.pressure = (self.pressure + PUMP_STEP).min(MAX_PRESSURE);
        self.pumping = true;
        if self.pressure > 0 && !self.deflating {
            self.deflating = true;
            true
        } else {
            false
        }
    }

    /// Applies one deflation tick. Returns true when pressure has just
    /// reached zero and deflation is over. A no-op when not deflating.
    pub fn deflate_tick(&mut self) -> bool {
        if !self.deflating {
            return false;
        }
        self.pressure -= DEFLATE_STEP;
        if self.pressure <= 0 {
            self.pressure = 0;
            self.deflating = false;
            self.pumping = false;
            true
        } else {
            false
        }
    }

    pub fn over_max(&self) -> bool {
        self.pumping && self.pressure >= MAX_PRESSURE
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
