//! Error handling for DROKit
//!
//! Error types mirror how a failure should be treated by the engine:
//! - Input errors (unparseable or non-finite value) keep the edit session armed
//! - Safety rejections drop the action and leave all state untouched
//! - Command rejections are reported once and never retried
//! - Feed loss is fatal for the process
//! - Writes to the machine coordinate system are programming errors
//!
//! All error types use `thiserror` for ergonomic error handling.

use crate::data::TaskMode;
use thiserror::Error;

/// Input error type
///
/// Raised while turning keypad or typed input into a number.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// The edit buffer does not hold a number
    #[error("Cannot parse '{buffer}' as a number")]
    Unparseable {
        /// The buffer contents at the time of the failed commit.
        buffer: String,
    },

    /// A committed value is NaN or infinite
    #[error("Value {value} is not a finite number")]
    NotFinite {
        /// The refused value.
        value: f64,
    },
}

/// Reasons the safety gate refuses to let an action through
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyViolation {
    /// Emergency stop is active
    #[error("Emergency stop is active")]
    EstopActive,

    /// Machine is not enabled
    #[error("Machine is not enabled")]
    NotEnabled,

    /// At least one configured axis is not homed
    #[error("Machine is not homed")]
    NotHomed,

    /// Interpreter is running, paused or waiting
    #[error("Interpreter is not idle")]
    InterpreterBusy,
}

/// Command error type
///
/// Returned by a [`crate::core::CommandChannel`] when the controller
/// refuses a command or a mode switch does not complete.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    /// The controller refused the command
    #[error("Command '{command}' rejected: {reason}")]
    Rejected {
        /// The command text that was refused.
        command: String,
        /// The reason given by the controller.
        reason: String,
    },

    /// The controller did not reach the requested mode in time
    #[error("Timed out after {timeout_ms}ms waiting for {mode} mode")]
    ModeTimeout {
        /// The mode that was requested.
        mode: TaskMode,
        /// How long the channel waited.
        timeout_ms: u64,
    },
}

/// Feed error type
///
/// A position feed that cannot be polled leaves the engine without ground
/// truth, so every variant is fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    /// The controller session could not be established
    #[error("Controller unavailable: {reason}")]
    Unavailable {
        /// Why the session could not be established.
        reason: String,
    },

    /// A poll returned data inconsistent with the configured axes
    #[error("Feed reported {reported} axes, expected {expected}")]
    AxisCount {
        /// Axis count reported by the feed.
        reported: usize,
        /// Axis count the engine was configured with.
        expected: usize,
    },
}

/// Main error type for DROKit
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DroError {
    /// Bad keypad or typed input
    #[error(transparent)]
    Input(#[from] InputError),

    /// Safety gate refused the action
    #[error("Safety gate refused action: {0}")]
    Safety(#[from] SafetyViolation),

    /// Controller refused a command
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Position feed lost
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Attempt to write the offsets of the machine coordinate system
    #[error("Offsets of {system} are immutable")]
    ImmutableSystem {
        /// Name of the machine coordinate system.
        system: String,
    },

    /// Row editing is currently disabled
    #[error("Row editing is disabled")]
    EditingDisabled,

    /// Axis index outside the configured axis set
    #[error("Unknown axis index {0}")]
    UnknownAxis(usize),

    /// Coordinate system index outside the table
    #[error("Unknown coordinate system index {0}")]
    UnknownSystem(usize),

    /// Engine options that cannot describe a readout
    #[error("Invalid engine options: {0}")]
    InvalidOptions(String),
}

impl DroError {
    /// Check if the engine must stop
    pub fn is_fatal(&self) -> bool {
        matches!(self, DroError::Feed(_))
    }

    /// Check if the error can be reported and the engine kept running
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// Check if this is a safety rejection
    pub fn is_safety_rejection(&self) -> bool {
        matches!(self, DroError::Safety(_))
    }

    /// Check if this is an input error
    pub fn is_input_error(&self) -> bool {
        matches!(self, DroError::Input(_))
    }
}

/// Result type using DroError
pub type Result<T> = std::result::Result<T, DroError>;
