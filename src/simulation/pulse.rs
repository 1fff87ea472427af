use crate::models::BpReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Silent,
    Sounding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseTransition {
    Started,
    Stopped,
}

/// Edge-triggered gate for the audible pulse cue. Emits a transition only
/// when pressure crosses into or out of the [diastolic, systolic] window;
/// repeated in-range observations produce nothing.
#[derive(Debug, Clone)]
pub struct PulseGate {
    state: GateState,
}

impl Default for PulseGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseGate {
    pub fn new() -> Self {
        Self {
            state: GateState::Silent,
        }
    }

    pub fn is_sounding(&self) -> bool {
        self.state == GateState::Sounding
    }

    pub fn observe(&mut self, pressure: i32, range: BpReading) -> Option<PulseTransition> {
        let in_range = pressure >= range.diastolic && pressure <= range.systolic;
        match (self.state, in_range) {
            (GateState::Silent, true) => {
                self.state = GateState::Sounding;
                Some(PulseTransition::Started)
            }
            (GateState::Sounding, false) => {
                self.state = GateState::Silent;
                Some(PulseTransition::Stopped)
            }
            _ => None,
        }
    }

    /// Forces the gate back to silent, reporting the stop edge if one fires.
    pub fn reset(&mut self) -> Option<PulseTransition> {
        if self.state == GateState::Sounding {
            self.state = GateState::Silent;
            Some(PulseTransition::Stopped)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: BpReading = BpReading {
        systolic: 120,
        diastolic: 80,
    };

    #[test]
    fn fires_one_start_and_one_stop_per_window_pass() {
        let mut gate = PulseGate::new();
        let mut starts = 0;
        let mut stops = 0;

        // Sweep down from 130 to 70, one mmHg at a time.
        for pressure in (70..=130).rev() {
            match gate.observe(pressure, RANGE) {
                Some(PulseTransition::Started) => starts += 1,
                Some(PulseTransition::Stopped) => stops += 1,
                None => {}
            }
        }

        assert_eq!(starts, 1);
        assert_eq!(stops, 1);
        assert!(!gate.is_sounding());
    }

    #[test]
    fn in_range_ticks_do_not_retrigger() {
        let mut gate = PulseGate::new();
        assert_eq!(gate.observe(100, RANGE), Some(PulseTransition::Started));
        for _ in 0..50 {
            assert_eq!(gate.observe(100, RANGE), None);
        }
        assert!(gate.is_sounding());
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let mut gate = PulseGate::new();
        assert_eq!(gate.observe(120, RANGE), Some(PulseTransition::Started));
        assert_eq!(gate.observe(121, RANGE), Some(PulseTransition::Stopped));
        assert_eq!(gate.observe(80, RANGE), Some(PulseTransition::Started));
        assert_eq!(gate.observe(79, RANGE), Some(PulseTransition::Stopped));
    }

    #[test]
    fn reset_reports_stop_edge_only_when_sounding() {
        let mut gate = PulseGate::new();
        assert_eq!(gate.reset(), None);
        gate.observe(100, RANGE);
        assert_eq!(gate.reset(), Some(PulseTransition::Stopped));
        assert_eq!(gate.reset(), None);
    }
}
