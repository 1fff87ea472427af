pub mod badges;
pub mod ledger;

pub use ledger::{AttemptOutcome, ProgressLedger};
