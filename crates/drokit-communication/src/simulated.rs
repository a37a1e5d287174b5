//! Simulated motion controller
//!
//! Stands in for a real controller session. One [`SimulatedController`]
//! owns the machine state; [`SimulatedFeed`] and [`SimulatedChannel`] are
//! the two halves an engine borrows. All three share the state, so a test
//! or demo can move axes, press estop or break the feed while an engine is
//! running against it.
//!
//! Work offsets are stored per system in machine units and are added to the
//! raw position to get the work position.

use crate::error::ParseError;
use crate::gcode::{parse_command, ParsedCommand};
use drokit_core::data::coordinate::WORK_OFFSET_NAMES;
use drokit_core::{
    CommandChannel, CommandError, FeedError, FeedSnapshot, InterpState, PositionFeed, TaskMode,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default time a mode switch may take before timing out
pub const DEFAULT_MODE_TIMEOUT_MS: u64 = 5000;

/// Everything the simulated controller knows about the machine
#[derive(Debug, Clone)]
struct MachineState {
    axis_letters: Vec<char>,
    positions: Vec<f64>,
    estop: bool,
    enabled: bool,
    homed_mask: u32,
    task_mode: TaskMode,
    interp_state: InterpState,
    /// 1-based, G54 = 1
    active_system: usize,
    work_offsets: Vec<Vec<f64>>,
    command_log: Vec<String>,
    unavailable: Option<String>,
    mode_stuck: bool,
    mode_timeout_ms: u64,
}

impl MachineState {
    fn axis_mask(&self) -> u32 {
        let n = self.axis_letters.len();
        if n >= 32 {
            u32::MAX
        } else {
            (1u32 << n) - 1
        }
    }

    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            raw_positions: self.positions.clone(),
            estop: self.estop,
            enabled: self.enabled,
            homed_mask: self.homed_mask,
            axis_mask: self.axis_mask(),
            task_mode: self.task_mode,
            interp_state: self.interp_state,
            active_system: self.active_system,
            active_offset: self.work_offsets.get(self.active_system - 1).cloned(),
        }
    }

    fn apply(&mut self, command: ParsedCommand) -> Result<(), ParseError> {
        match command {
            ParsedCommand::SelectSystem(p_number) => {
                self.active_system = p_number;
                debug!(system = WORK_OFFSET_NAMES[p_number - 1], "Work offset selected");
            }
            ParsedCommand::SetOffset { p_number, words } => {
                let p_number = if p_number == 0 {
                    self.active_system
                } else {
                    p_number
                };
                let offsets = self
                    .work_offsets
                    .get_mut(p_number - 1)
                    .ok_or(ParseError::BadOffsetNumber(p_number as i64))?;
                for (axis, value) in words {
                    offsets[axis] = value - self.positions[axis];
                }
                debug!(p_number, offsets = ?offsets, "Work offset set");
            }
            ParsedCommand::Other(text) => {
                debug!(command = %text, "Command not modelled, accepted as-is");
            }
        }
        Ok(())
    }
}

/// A controller simulation with shared state
#[derive(Debug, Clone)]
pub struct SimulatedController {
    state: Arc<Mutex<MachineState>>,
}

impl SimulatedController {
    /// Create an enabled, homed, idle machine at the origin with G54 active
    ///
    /// Axis labels are matched on their first letter.
    pub fn new<I, S>(axis_labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let axis_letters: Vec<char> = axis_labels
            .into_iter()
            .filter_map(|l| l.as_ref().chars().next())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let axes = axis_letters.len();
        let mut state = MachineState {
            axis_letters,
            positions: vec![0.0; axes],
            estop: false,
            enabled: true,
            homed_mask: 0,
            task_mode: TaskMode::Manual,
            interp_state: InterpState::Idle,
            active_system: 1,
            work_offsets: vec![vec![0.0; axes]; WORK_OFFSET_NAMES.len()],
            command_log: Vec::new(),
            unavailable: None,
            mode_stuck: false,
            mode_timeout_ms: DEFAULT_MODE_TIMEOUT_MS,
        };
        state.homed_mask = state.axis_mask();
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Position feed half
    pub fn feed(&self) -> SimulatedFeed {
        SimulatedFeed {
            state: Arc::clone(&self.state),
        }
    }

    /// Command channel half
    pub fn channel(&self) -> SimulatedChannel {
        SimulatedChannel {
            state: Arc::clone(&self.state),
        }
    }

    /// Number of axes
    pub fn axis_count(&self) -> usize {
        self.state.lock().axis_letters.len()
    }

    /// Move one axis to an absolute machine position
    pub fn set_position(&self, axis: usize, value: f64) {
        if let Some(p) = self.state.lock().positions.get_mut(axis) {
            *p = value;
        }
    }

    /// Move one axis by `delta`
    pub fn jog(&self, axis: usize, delta: f64) {
        if let Some(p) = self.state.lock().positions.get_mut(axis) {
            *p += delta;
        }
    }

    /// Current raw positions
    pub fn positions(&self) -> Vec<f64> {
        self.state.lock().positions.clone()
    }

    /// Press or release estop; pressing it also disables the machine
    pub fn set_estop(&self, active: bool) {
        let mut state = self.state.lock();
        state.estop = active;
        if active {
            state.enabled = false;
        }
    }

    /// Force the enabled flag without going through the channel
    pub fn set_machine_enabled(&self, enabled: bool) {
        self.state.lock().enabled = enabled;
    }

    /// Set which axes count as homed
    pub fn set_homed_mask(&self, mask: u32) {
        self.state.lock().homed_mask = mask;
    }

    /// Home every axis
    pub fn home_all(&self) {
        let mut state = self.state.lock();
        state.homed_mask = state.axis_mask();
    }

    /// Force the task mode
    pub fn set_task_mode(&self, mode: TaskMode) {
        self.state.lock().task_mode = mode;
    }

    /// Force the interpreter state
    pub fn set_interp_state(&self, interp: InterpState) {
        self.state.lock().interp_state = interp;
    }

    /// Make mode switches hang until they time out
    pub fn set_mode_stuck(&self, stuck: bool) {
        self.state.lock().mode_stuck = stuck;
    }

    /// Time a stuck mode switch reports
    pub fn set_mode_timeout_ms(&self, timeout_ms: u64) {
        self.state.lock().mode_timeout_ms = timeout_ms;
    }

    /// Make every poll fail with `reason`, or restore the session with `None`
    pub fn set_unavailable(&self, reason: Option<String>) {
        self.state.lock().unavailable = reason;
    }

    /// Commands accepted so far, oldest first
    pub fn command_log(&self) -> Vec<String> {
        self.state.lock().command_log.clone()
    }

    /// Active work offset number (G54 = 1)
    pub fn active_system(&self) -> usize {
        self.state.lock().active_system
    }

    /// Stored offset of one axis of work offset `p_number` (G54 = 1)
    pub fn work_offset(&self, p_number: usize, axis: usize) -> Option<f64> {
        let state = self.state.lock();
        state
            .work_offsets
            .get(p_number.checked_sub(1)?)
            .and_then(|v| v.get(axis))
            .copied()
    }

    /// Current task mode
    pub fn task_mode(&self) -> TaskMode {
        self.state.lock().task_mode
    }

    /// Whether the machine is enabled
    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }
}

/// Position feed half of a [`SimulatedController`]
#[derive(Debug, Clone)]
pub struct SimulatedFeed {
    state: Arc<Mutex<MachineState>>,
}

impl PositionFeed for SimulatedFeed {
    fn poll(&mut self) -> Result<FeedSnapshot, FeedError> {
        let state = self.state.lock();
        if let Some(reason) = &state.unavailable {
            return Err(FeedError::Unavailable {
                reason: reason.clone(),
            });
        }
        Ok(state.snapshot())
    }
}

/// Command channel half of a [`SimulatedController`]
#[derive(Debug, Clone)]
pub struct SimulatedChannel {
    state: Arc<Mutex<MachineState>>,
}

fn rejected(command: &str, reason: impl Into<String>) -> CommandError {
    CommandError::Rejected {
        command: command.to_string(),
        reason: reason.into(),
    }
}

impl CommandChannel for SimulatedChannel {
    fn submit(&mut self, command: &str) -> Result<(), CommandError> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.unavailable {
            return Err(rejected(command, reason.clone()));
        }
        if state.estop {
            return Err(rejected(command, "emergency stop active"));
        }
        if state.task_mode != TaskMode::Mdi {
            return Err(rejected(
                command,
                format!("controller is in {} mode", state.task_mode),
            ));
        }

        let parsed = parse_command(command, &state.axis_letters)
            .map_err(|e| rejected(command, e.to_string()))?;
        state
            .apply(parsed)
            .map_err(|e| rejected(command, e.to_string()))?;
        state.command_log.push(command.to_string());
        info!("Controller accepted {}", command);
        Ok(())
    }

    fn ensure_mode(&mut self, mode: TaskMode) -> Result<(), CommandError> {
        let mut state = self.state.lock();
        if state.task_mode == mode {
            return Ok(());
        }
        if state.mode_stuck {
            warn!(%mode, "Simulated mode switch stuck");
            return Err(CommandError::ModeTimeout {
                mode,
                timeout_ms: state.mode_timeout_ms,
            });
        }
        if !state.interp_state.is_idle() {
            return Err(rejected(
                &format!("mode {}", mode),
                "interpreter is not idle",
            ));
        }
        debug!(from = %state.task_mode, to = %mode, "Mode switched");
        state.task_mode = mode;
        Ok(())
    }

    fn set_enabled(&mut self, on: bool) -> Result<(), CommandError> {
        let mut state = self.state.lock();
        let label = if on { "machine on" } else { "machine off" };
        if state.estop {
            return Err(rejected(label, "emergency stop active"));
        }
        state.enabled = on;
        info!("Controller {}", label);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_ready() {
        let sim = SimulatedController::new(["X", "Y", "Z"]);
        let snap = sim.feed().poll().unwrap();
        assert_eq!(snap.raw_positions, vec![0.0; 3]);
        assert!(snap.safety().homed);
        assert!(snap.enabled);
        assert_eq!(snap.active_system, 1);
        assert_eq!(snap.active_offset, Some(vec![0.0; 3]));
    }

    #[test]
    fn test_submit_requires_mdi() {
        let sim = SimulatedController::new(["X"]);
        let mut channel = sim.channel();
        assert!(channel.submit("G55").is_err());
        channel.ensure_mode(TaskMode::Mdi).unwrap();
        channel.submit("G55").unwrap();
        assert_eq!(sim.active_system(), 2);
        assert_eq!(sim.command_log(), vec!["G55"]);
    }

    #[test]
    fn test_g10_makes_position_read_value() {
        let sim = SimulatedController::new(["X", "Y"]);
        sim.set_position(0, 2.0);
        sim.set_position(1, -1.0);
        let mut channel = sim.channel();
        channel.ensure_mode(TaskMode::Mdi).unwrap();
        channel.submit("G10 L20 P3 X5.0 Y0.0").unwrap();

        assert_eq!(sim.work_offset(3, 0), Some(3.0));
        assert_eq!(sim.work_offset(3, 1), Some(1.0));
        assert_eq!(sim.work_offset(1, 0), Some(0.0));
    }

    #[test]
    fn test_bad_command_is_not_logged() {
        let sim = SimulatedController::new(["X"]);
        let mut channel = sim.channel();
        channel.ensure_mode(TaskMode::Mdi).unwrap();
        let err = channel.submit("G10 L20 P1 B1.0").unwrap_err();
        assert!(matches!(err, CommandError::Rejected { .. }));
        assert!(sim.command_log().is_empty());
    }

    #[test]
    fn test_stuck_mode_times_out() {
        let sim = SimulatedController::new(["X"]);
        sim.set_mode_stuck(true);
        sim.set_mode_timeout_ms(250);
        assert_eq!(
            sim.channel().ensure_mode(TaskMode::Mdi),
            Err(CommandError::ModeTimeout {
                mode: TaskMode::Mdi,
                timeout_ms: 250
            })
        );
        assert_eq!(sim.task_mode(), TaskMode::Manual);
    }

    #[test]
    fn test_estop_blocks_enable() {
        let sim = SimulatedController::new(["X"]);
        sim.set_estop(true);
        assert!(!sim.is_enabled());
        assert!(sim.channel().set_enabled(true).is_err());
        sim.set_estop(false);
        sim.channel().set_enabled(true).unwrap();
        assert!(sim.is_enabled());
    }

    #[test]
    fn test_unavailable_feed() {
        let sim = SimulatedController::new(["X"]);
        sim.set_unavailable(Some("session closed".to_string()));
        assert!(matches!(
            sim.feed().poll(),
            Err(FeedError::Unavailable { .. })
        ));
        sim.set_unavailable(None);
        assert!(sim.feed().poll().is_ok());
    }
}
