pub mod controller;
pub mod pulse;
pub mod state;

pub use controller::{SimulationController, SimulationEvent};
pub use pulse::{PulseGate, PulseTransition};
pub use state::CuffState;
