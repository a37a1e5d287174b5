//! # DROKit Communication
//!
//! Controller-side implementations of the readout's position feed and
//! command channel, plus the interpreter for the commands a readout emits.

pub mod error;
pub mod gcode;
pub mod simulated;

pub use error::ParseError;
pub use gcode::{parse_command, ParsedCommand};
pub use simulated::{
    SimulatedChannel, SimulatedController, SimulatedFeed, DEFAULT_MODE_TIMEOUT_MS,
};
