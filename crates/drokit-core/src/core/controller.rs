//! Controller interface
//!
//! Defines the two services a readout borrows from the motion controller:
//! a poll-based status/position feed and a command entry point.

use crate::data::{FeedSnapshot, TaskMode};
use crate::error::{CommandError, FeedError};

/// Poll-based source of raw positions and machine state
pub trait PositionFeed {
    /// Take a fresh snapshot of the controller
    ///
    /// An error means the controller can no longer be read and is fatal.
    fn poll(&mut self) -> Result<FeedSnapshot, FeedError>;
}

/// Entry point for commands sent to the controller
pub trait CommandChannel {
    /// Queue a discrete command (offset set, coordinate system select)
    ///
    /// Rejected when the controller is not in a compatible mode.
    fn submit(&mut self, command: &str) -> Result<(), CommandError>;

    /// Switch the controller to `mode` and block until the switch completes
    fn ensure_mode(&mut self, mode: TaskMode) -> Result<(), CommandError>;

    /// Turn the machine on or off
    fn set_enabled(&mut self, on: bool) -> Result<(), CommandError>;
}

impl<T: PositionFeed + ?Sized> PositionFeed for Box<T> {
    fn poll(&mut self) -> Result<FeedSnapshot, FeedError> {
        (**self).poll()
    }
}

impl<T: CommandChannel + ?Sized> CommandChannel for Box<T> {
    fn submit(&mut self, command: &str) -> Result<(), CommandError> {
        (**self).submit(command)
    }

    fn ensure_mode(&mut self, mode: TaskMode) -> Result<(), CommandError> {
        (**self).ensure_mode(mode)
    }

    fn set_enabled(&mut self, on: bool) -> Result<(), CommandError> {
        (**self).set_enabled(on)
    }
}
