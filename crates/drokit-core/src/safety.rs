//! Safety gate for machine-directed actions
//!
//! Every action that results in a command to the controller must pass
//! [`SafetyGate::check`] against a snapshot polled immediately before the
//! dispatch. The enable toggle only needs estop to be clear.

use crate::data::MachineSafetySnapshot;
use crate::error::SafetyViolation;

/// Pure predicates over a safety snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyGate;

impl SafetyGate {
    /// `!estop && enabled && homed && interpreter_idle`
    pub fn may_act(snapshot: &MachineSafetySnapshot) -> bool {
        Self::check(snapshot).is_ok()
    }

    /// Like [`SafetyGate::may_act`], reporting the first failing condition
    pub fn check(snapshot: &MachineSafetySnapshot) -> Result<(), SafetyViolation> {
        if snapshot.estop {
            return Err(SafetyViolation::EstopActive);
        }
        if !snapshot.enabled {
            return Err(SafetyViolation::NotEnabled);
        }
        if !snapshot.homed {
            return Err(SafetyViolation::NotHomed);
        }
        if !snapshot.interpreter_idle {
            return Err(SafetyViolation::InterpreterBusy);
        }
        Ok(())
    }

    /// Gate for the enable/disable toggle: only estop blocks it
    pub fn may_toggle_enable(snapshot: &MachineSafetySnapshot) -> bool {
        Self::check_toggle_enable(snapshot).is_ok()
    }

    /// Like [`SafetyGate::may_toggle_enable`], reporting the violation
    pub fn check_toggle_enable(snapshot: &MachineSafetySnapshot) -> Result<(), SafetyViolation> {
        if snapshot.estop {
            Err(SafetyViolation::EstopActive)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TaskMode;

    fn snapshot(estop: bool, enabled: bool, homed: bool, idle: bool) -> MachineSafetySnapshot {
        MachineSafetySnapshot {
            estop,
            homed,
            enabled,
            interpreter_idle: idle,
            task_mode: TaskMode::Manual,
        }
    }

    #[test]
    fn test_truth_table() {
        for bits in 0u8..16 {
            let (estop, enabled, homed, idle) =
                (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0);
            let s = snapshot(estop, enabled, homed, idle);
            assert_eq!(
                SafetyGate::may_act(&s),
                !estop && enabled && homed && idle,
                "bits={bits:04b}"
            );
            assert_eq!(SafetyGate::may_toggle_enable(&s), !estop);
        }
    }

    #[test]
    fn test_estop_reported_first() {
        let s = snapshot(true, false, false, false);
        assert_eq!(SafetyGate::check(&s), Err(SafetyViolation::EstopActive));
        let s = snapshot(false, true, false, false);
        assert_eq!(SafetyGate::check(&s), Err(SafetyViolation::NotHomed));
        let s = snapshot(false, true, true, false);
        assert_eq!(SafetyGate::check(&s), Err(SafetyViolation::InterpreterBusy));
    }

    #[test]
    fn test_enable_toggle_ignores_homing() {
        let s = snapshot(false, false, false, false);
        assert!(SafetyGate::may_toggle_enable(&s));
        assert_eq!(
            SafetyGate::check_toggle_enable(&snapshot(true, true, true, true)),
            Err(SafetyViolation::EstopActive)
        );
    }
}
