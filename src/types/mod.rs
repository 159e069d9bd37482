//! Shared data structures for the telemetry notification dispatcher
//!
//! - Wire records: [`PositionReport`], [`VibrationReport`] (inserted documents)
//! - [`RecordKind`]: which watched collection a record came from
//! - [`DispatchOutcome`]: terminal state of one pipeline invocation

mod outcome;
mod record;

pub use outcome::*;
pub use record::*;
