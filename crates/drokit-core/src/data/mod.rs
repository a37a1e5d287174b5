//! Data models for axes, controller snapshots and safety state
//!
//! This module provides:
//! - Axis identification (index + label)
//! - Task mode and interpreter state of the controller
//! - Raw feed snapshots and the safety subset derived from them
//! - Indicator colors for the estop/enabled/homed lamps

pub mod coordinate;

pub use coordinate::{CoordinateSystem, CoordinateSystemTable};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single readout axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    /// Position of the axis in the feed's position vector
    pub index: usize,
    /// Human label, also used as the G-code axis letter
    pub label: String,
}

impl Axis {
    /// Create a new axis
    pub fn new(index: usize, label: impl Into<String>) -> Self {
        Self {
            index,
            label: label.into(),
        }
    }

    /// Upper-case axis letter for G-code words
    pub fn letter(&self) -> String {
        self.label.to_ascii_uppercase()
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Fixed set of axes, decided once at startup
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisSet {
    axes: Vec<Axis>,
}

impl AxisSet {
    /// Build an axis set from labels, indexed in order
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            axes: labels
                .into_iter()
                .enumerate()
                .map(|(i, l)| Axis::new(i, l))
                .collect(),
        }
    }

    /// Number of axes
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    /// Check if there are no axes
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Get an axis by index
    pub fn get(&self, index: usize) -> Option<&Axis> {
        self.axes.get(index)
    }

    /// Find an axis by label (case-insensitive)
    pub fn find(&self, label: &str) -> Option<&Axis> {
        self.axes
            .iter()
            .find(|a| a.label.eq_ignore_ascii_case(label))
    }

    /// Iterate over all axes
    pub fn iter(&self) -> impl Iterator<Item = &Axis> {
        self.axes.iter()
    }

    /// Bit mask with one bit per configured axis
    pub fn mask(&self) -> u32 {
        if self.axes.len() >= 32 {
            u32::MAX
        } else {
            (1u32 << self.axes.len()) - 1
        }
    }
}

/// Controller task mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskMode {
    /// Jogging / manual control
    Manual,
    /// Running a program
    Auto,
    /// Accepting discrete commands
    Mdi,
}

impl fmt::Display for TaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskMode::Manual => write!(f, "MANUAL"),
            TaskMode::Auto => write!(f, "AUTO"),
            TaskMode::Mdi => write!(f, "MDI"),
        }
    }
}

/// Interpreter state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpState {
    /// Nothing is being interpreted
    Idle,
    /// Reading a program
    Reading,
    /// Program paused
    Paused,
    /// Waiting on motion or I/O
    Waiting,
}

impl InterpState {
    /// Check if the interpreter is idle
    pub fn is_idle(self) -> bool {
        matches!(self, InterpState::Idle)
    }
}

/// Raw snapshot of the controller, as returned by a position feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    /// Raw per-axis positions in machine units
    pub raw_positions: Vec<f64>,
    /// Emergency stop active
    pub estop: bool,
    /// Machine enabled
    pub enabled: bool,
    /// One bit per homed axis
    pub homed_mask: u32,
    /// One bit per axis the controller has configured
    pub axis_mask: u32,
    /// Current task mode
    pub task_mode: TaskMode,
    /// Current interpreter state
    pub interp_state: InterpState,
    /// Active work offset number, 1-based (G54 = 1)
    pub active_system: usize,
    /// Offset of the active work system in machine units, when the
    /// controller reports it. Added to the raw position to get the
    /// work position.
    pub active_offset: Option<Vec<f64>>,
}

impl FeedSnapshot {
    /// Snapshot of an idle, enabled, homed machine at the given position
    pub fn ready(raw_positions: Vec<f64>) -> Self {
        let mask = AxisSet::from_labels(raw_positions.iter().map(|_| "")).mask();
        Self {
            raw_positions,
            estop: false,
            enabled: true,
            homed_mask: mask,
            axis_mask: mask,
            task_mode: TaskMode::Manual,
            interp_state: InterpState::Idle,
            active_system: 1,
            active_offset: None,
        }
    }

    /// Safety subset of this snapshot
    pub fn safety(&self) -> MachineSafetySnapshot {
        MachineSafetySnapshot::from(self)
    }
}

/// Safety-relevant machine state, captured fresh for every decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSafetySnapshot {
    /// Emergency stop active
    pub estop: bool,
    /// All configured axes homed
    pub homed: bool,
    /// Machine enabled
    pub enabled: bool,
    /// Interpreter idle
    pub interpreter_idle: bool,
    /// Current task mode
    pub task_mode: TaskMode,
}

impl From<&FeedSnapshot> for MachineSafetySnapshot {
    fn from(s: &FeedSnapshot) -> Self {
        Self {
            estop: s.estop,
            homed: s.axis_mask != 0 && s.homed_mask & s.axis_mask == s.axis_mask,
            enabled: s.enabled,
            interpreter_idle: s.interp_state.is_idle(),
            task_mode: s.task_mode,
        }
    }
}

/// Lamp color of a status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorColor {
    /// Condition OK
    Green,
    /// Fault
    Red,
}

impl IndicatorColor {
    /// Green when `ok`, red otherwise
    pub fn from_ok(ok: bool) -> Self {
        if ok {
            Self::Green
        } else {
            Self::Red
        }
    }
}

/// Estop / enabled / homed lamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicators {
    /// Red while estop is active
    pub estop: IndicatorColor,
    /// Green while enabled
    pub enabled: IndicatorColor,
    /// Green while all axes are homed
    pub homed: IndicatorColor,
}

impl From<&MachineSafetySnapshot> for Indicators {
    fn from(s: &MachineSafetySnapshot) -> Self {
        Self {
            estop: IndicatorColor::from_ok(!s.estop),
            enabled: IndicatorColor::from_ok(s.enabled),
            homed: IndicatorColor::from_ok(s.homed),
        }
    }
}

impl Default for Indicators {
    fn default() -> Self {
        Self {
            estop: IndicatorColor::Red,
            enabled: IndicatorColor::Red,
            homed: IndicatorColor::Red,
        }
    }
}
