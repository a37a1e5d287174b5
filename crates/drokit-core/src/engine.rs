//! Readout engine
//!
//! Ties the offset model, edit session and safety gate to the controller's
//! position feed and command channel.
//!
//! Two variants exist:
//! - **Local**: offsets live in the readout only. Edits mutate the
//!   [`OffsetModel`] directly and never reach the controller.
//! - **Machine**: offsets live in the controller's work offset table. Edits
//!   and system selection become `G10 L20` / `G54`.. commands, each preceded
//!   by a fresh poll and a [`SafetyGate`] check. Local offsets are only
//!   updated from what the feed reports back.
//!
//! Every method takes `&mut self`, so a dispatch (poll, gate, mode switch,
//! submit) always completes before the next action can start.

use crate::commands::{format_word_value, select_system_command, set_offset_command};
use crate::core::{CommandChannel, DroEvent, EventDispatcher, PositionFeed};
use crate::data::{AxisSet, CoordinateSystemTable, FeedSnapshot, Indicators, TaskMode};
use crate::edit_session::{EditSession, Key, KeyOutcome};
use crate::error::{CommandError, DroError, FeedError, InputError, Result, SafetyViolation};
use crate::offsets::OffsetModel;
use crate::safety::SafetyGate;
use crate::units::{factor, DisplayUnit};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, trace, warn};

/// Which kind of readout the engine drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DroVariant {
    /// Offsets are kept locally
    #[default]
    Local,
    /// Offsets and system selection are commanded on the controller
    Machine,
}

impl fmt::Display for DroVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Machine => write!(f, "machine"),
        }
    }
}

/// Construction-time options of an [`Engine`]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Axis labels in feed order
    pub axes: Vec<String>,
    /// Local or machine-commanding readout
    pub variant: DroVariant,
    /// Unit shown to the operator
    pub display_unit: DisplayUnit,
    /// Unit of raw feed positions
    pub machine_unit: DisplayUnit,
    /// Active system at startup (local variant only)
    pub initial_system: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            axes: vec!["X".to_string(), "Y".to_string(), "Z".to_string()],
            variant: DroVariant::Local,
            display_unit: DisplayUnit::Inch,
            machine_unit: DisplayUnit::Inch,
            initial_system: 1,
        }
    }
}

/// What an offset edit should make the displayed value become
#[derive(Debug, Clone, Copy, PartialEq)]
enum OffsetTarget {
    Zero,
    Half,
    Value(f64),
}

impl OffsetTarget {
    fn resolve(self, displayed: f64) -> f64 {
        match self {
            OffsetTarget::Zero => 0.0,
            OffsetTarget::Half => displayed / 2.0,
            OffsetTarget::Value(v) => v,
        }
    }
}

fn is_axis_letter(label: &str) -> bool {
    let mut chars = label.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphabetic())
}

/// DRO engine
pub struct Engine<'a> {
    axes: AxisSet,
    variant: DroVariant,
    display_unit: DisplayUnit,
    machine_unit: DisplayUnit,
    feed: &'a mut dyn PositionFeed,
    channel: &'a mut dyn CommandChannel,
    model: OffsetModel,
    session: EditSession,
    events: EventDispatcher,
    last_snapshot: Option<FeedSnapshot>,
    displayed: Vec<f64>,
    indicators: Indicators,
    editing_enabled: bool,
    /// System shown as selected in the UI
    selected_system: usize,
    /// System last reported active by the controller (machine variant)
    confirmed_system: usize,
}

impl<'a> Engine<'a> {
    /// Create an engine and take the first poll
    ///
    /// Fails when the options are unusable or the feed cannot be read.
    pub fn new(
        options: EngineOptions,
        feed: &'a mut dyn PositionFeed,
        channel: &'a mut dyn CommandChannel,
    ) -> Result<Self> {
        if options.axes.is_empty() {
            return Err(DroError::InvalidOptions("no axes configured".to_string()));
        }
        // Labels become G-code axis words, so each must be a single letter.
        if let Some(bad) = options.axes.iter().find(|l| !is_axis_letter(l)) {
            return Err(DroError::InvalidOptions(format!(
                "axis label '{}' is not a single letter",
                bad
            )));
        }
        let axes = AxisSet::from_labels(options.axes);

        let table = match options.variant {
            DroVariant::Local => CoordinateSystemTable::local(),
            DroVariant::Machine => CoordinateSystemTable::work_offsets(),
        };
        let initial = match options.variant {
            DroVariant::Local => options.initial_system,
            DroVariant::Machine => 0,
        };
        if initial >= table.len() {
            return Err(DroError::UnknownSystem(initial));
        }

        let unit_factor = factor(options.machine_unit, options.display_unit);
        let mut model = OffsetModel::new(table, axes.len(), unit_factor);
        model.select_system(initial)?;

        let mut engine = Self {
            displayed: vec![0.0; axes.len()],
            axes,
            variant: options.variant,
            display_unit: options.display_unit,
            machine_unit: options.machine_unit,
            feed,
            channel,
            editing_enabled: !model.active_is_immutable(),
            model,
            session: EditSession::new(),
            events: EventDispatcher::default(),
            last_snapshot: None,
            indicators: Indicators::default(),
            selected_system: initial,
            confirmed_system: initial,
        };

        engine.poll()?;
        info!(
            variant = %engine.variant,
            axes = engine.axes.len(),
            unit = %engine.display_unit,
            "Readout engine started"
        );
        Ok(engine)
    }

    // ── Tick ───────────────────────────────────────────────────────────

    /// Poll the feed and recompute displayed values
    ///
    /// The only error is a fatal feed failure.
    pub fn poll(&mut self) -> Result<()> {
        self.refresh()?;
        self.events.publish(DroEvent::PositionsUpdated {
            displayed: self.displayed.clone(),
            indicators: self.indicators,
        });
        Ok(())
    }

    fn fresh_snapshot(&mut self) -> Result<FeedSnapshot> {
        let snapshot = self.feed.poll().map_err(|e| {
            error!("Position feed lost: {}", e);
            DroError::Feed(e)
        })?;
        if snapshot.raw_positions.len() != self.axes.len() {
            let e = FeedError::AxisCount {
                reported: snapshot.raw_positions.len(),
                expected: self.axes.len(),
            };
            error!("{}", e);
            return Err(e.into());
        }
        trace!(raw = ?snapshot.raw_positions, "Polled feed");
        Ok(snapshot)
    }

    /// Take a fresh snapshot and fold it into the cached display state
    fn refresh(&mut self) -> Result<FeedSnapshot> {
        self.refresh_with(true)
    }

    /// Like [`Engine::refresh`]; with `clear_session` false an armed row
    /// survives losing editability until the next regular poll
    fn refresh_with(&mut self, clear_session: bool) -> Result<FeedSnapshot> {
        let snapshot = self.fresh_snapshot()?;

        if self.variant == DroVariant::Machine {
            self.mirror_controller(&snapshot);
        }

        let safety = snapshot.safety();
        self.indicators = Indicators::from(&safety);
        let editable = match self.variant {
            DroVariant::Local => !self.model.active_is_immutable(),
            DroVariant::Machine => SafetyGate::may_act(&safety),
        };
        if clear_session {
            self.set_editing_enabled(editable);
        } else {
            self.editing_enabled = editable;
        }

        self.recompute(&snapshot);
        self.last_snapshot = Some(snapshot.clone());
        Ok(snapshot)
    }

    fn mirror_controller(&mut self, snapshot: &FeedSnapshot) {
        match CoordinateSystemTable::index_from_p_number(snapshot.active_system)
            .filter(|i| *i < self.model.table().len())
        {
            Some(index) => {
                if index != self.confirmed_system {
                    self.confirmed_system = index;
                    if let Err(e) = self.model.select_system(index) {
                        warn!("Cannot mirror active system: {}", e);
                    }
                    self.publish_system_changed(index);
                }
                self.selected_system = index;
            }
            None => warn!(
                number = snapshot.active_system,
                "Feed reported an unknown work offset number"
            ),
        }

        if let Some(offsets) = &snapshot.active_offset {
            if let Err(e) = self.model.mirror_active(offsets) {
                warn!("Cannot mirror controller offsets: {}", e);
            }
        }
    }

    fn recompute(&mut self, snapshot: &FeedSnapshot) {
        for (axis, raw) in snapshot.raw_positions.iter().enumerate() {
            let value = self
                .model
                .displayed(axis, *raw)
                .unwrap_or_else(|_| self.model.raw_scaled(*raw));
            self.displayed[axis] = value;
        }
    }

    fn set_editing_enabled(&mut self, enabled: bool) {
        if self.editing_enabled != enabled {
            debug!(enabled, "Row editing toggled");
        }
        self.editing_enabled = enabled;
        if !enabled && self.session.armed_axis().is_some() {
            self.session.clear();
            self.events.publish(DroEvent::EditCleared);
        }
    }

    // ── Coordinate systems and units ───────────────────────────────────

    /// Select a coordinate system by table index
    ///
    /// Local: switches immediately. Machine: dispatches the select command;
    /// the selection becomes confirmed on a later poll and reverts to the
    /// confirmed system when the dispatch fails.
    pub fn select_coordinate_system(&mut self, index: usize) -> Result<()> {
        let name = self
            .model
            .table()
            .get(index)
            .map(|s| s.name.clone())
            .ok_or(DroError::UnknownSystem(index))?;
        debug!(index, system = %name, "Select coordinate system");

        match self.variant {
            DroVariant::Local => {
                self.model.select_system(index)?;
                self.selected_system = index;
                self.confirmed_system = index;
                let editable = !self.model.active_is_immutable();
                self.set_editing_enabled(editable);
                if let Some(snapshot) = self.last_snapshot.clone() {
                    self.recompute(&snapshot);
                }
                info!(system = %name, "Active coordinate system changed");
                self.publish_system_changed(index);
                Ok(())
            }
            DroVariant::Machine => {
                self.selected_system = index;
                let result = self.gated_dispatch(|engine, _| {
                    let system = engine
                        .model
                        .table()
                        .get(index)
                        .ok_or(DroError::UnknownSystem(index))?;
                    Ok(select_system_command(system))
                });
                match result {
                    Ok(()) => self.selected_system = index,
                    Err(_) => self.selected_system = self.confirmed_system,
                }
                result
            }
        }
    }

    /// Switch the display unit, rescaling every stored offset once
    pub fn set_display_unit(&mut self, unit: DisplayUnit) {
        if unit == self.display_unit {
            return;
        }
        let old_factor = self.model.unit_factor();
        let new_factor = factor(self.machine_unit, unit);
        self.model.rescale_units(old_factor, new_factor);
        self.display_unit = unit;
        if let Some(snapshot) = self.last_snapshot.clone() {
            self.recompute(&snapshot);
        }
        info!(unit = %unit, "Display unit changed");
        self.events.publish(DroEvent::UnitsChanged(unit));
    }

    /// Flip between inch and millimeter
    pub fn toggle_units(&mut self) {
        self.set_display_unit(self.display_unit.toggled());
    }

    /// Turn the machine on when off and off when on
    ///
    /// Only an active estop blocks this.
    pub fn toggle_enable(&mut self) -> Result<()> {
        let snapshot = self.refresh()?;
        if let Err(v) = SafetyGate::check_toggle_enable(&snapshot.safety()) {
            return Err(self.reject_safety(v, "enable toggle"));
        }
        let on = !snapshot.enabled;
        let label = if on { "machine on" } else { "machine off" };
        if let Err(e) = self.channel.set_enabled(on) {
            return Err(self.reject_command(e));
        }
        info!("Sent {}", label);
        self.events.publish(DroEvent::CommandSent(label.to_string()));
        Ok(())
    }

    // ── Editing ────────────────────────────────────────────────────────

    /// Arm a row for keypad or typed entry
    pub fn begin_edit(&mut self, axis: usize) -> Result<()> {
        self.check_axis(axis)?;
        if !self.editing_enabled {
            debug!(axis, "Edit refused, row editing disabled");
            return Err(DroError::EditingDisabled);
        }
        self.session.arm(axis);
        self.events.publish(DroEvent::EditArmed(axis));
        Ok(())
    }

    /// Feed one keypad key to `axis`; ignored unless that row is armed
    pub fn apply_key(&mut self, axis: usize, key: Key) -> Result<()> {
        self.check_axis(axis)?;
        if self.session.armed_axis() != Some(axis) {
            debug!(axis, %key, "Key for unarmed row ignored");
            return Ok(());
        }
        match self.session.apply(key) {
            KeyOutcome::Edited | KeyOutcome::NotArmed => Ok(()),
            KeyOutcome::Refused => {
                debug!(axis, %key, buffer = self.session.buffer(), "Key refused");
                Ok(())
            }
            KeyOutcome::Submit { axis, value } => self.commit(axis, Some(value)),
            KeyOutcome::Invalid(e) => {
                warn!("{}", e);
                self.events.publish(DroEvent::InputError(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Feed one keypad key to whichever row is armed
    pub fn press_key(&mut self, key: Key) -> Result<()> {
        match self.session.armed_axis() {
            Some(axis) => self.apply_key(axis, key),
            None => {
                debug!(%key, "Key with no armed row ignored");
                Ok(())
            }
        }
    }

    /// Replace the armed row's text with typed input
    pub fn type_text(&mut self, axis: usize, text: &str) -> Result<()> {
        self.check_axis(axis)?;
        if self.session.armed_axis() == Some(axis) {
            self.session.set_text(text);
        }
        Ok(())
    }

    /// `None` arms the row; `Some(value)` makes the row display `value`
    pub fn commit(&mut self, axis: usize, value: Option<f64>) -> Result<()> {
        match value {
            None => self.begin_edit(axis),
            Some(v) if !v.is_finite() => {
                let e = InputError::NotFinite { value: v };
                warn!("{}", e);
                self.events.publish(DroEvent::InputError(e.to_string()));
                Err(e.into())
            }
            Some(v) => self.apply_target(&[axis], OffsetTarget::Value(v)),
        }
    }

    /// Make the row display zero
    pub fn zero(&mut self, axis: usize) -> Result<()> {
        self.apply_target(&[axis], OffsetTarget::Zero)
    }

    /// Make the row display half its current value
    pub fn half(&mut self, axis: usize) -> Result<()> {
        self.apply_target(&[axis], OffsetTarget::Half)
    }

    /// Zero every axis of the active system
    pub fn zero_all(&mut self) -> Result<()> {
        let axes: Vec<usize> = (0..self.axes.len()).collect();
        self.apply_target(&axes, OffsetTarget::Zero)
    }

    fn apply_target(&mut self, axes: &[usize], target: OffsetTarget) -> Result<()> {
        for &axis in axes {
            self.check_axis(axis)?;
        }
        debug!(?axes, ?target, "Offset edit requested");

        match self.variant {
            DroVariant::Local => self.apply_local(axes, target)?,
            DroVariant::Machine => self.apply_machine(axes, target)?,
        }

        if self.session.armed_axis().is_some() {
            self.session.clear();
            self.events.publish(DroEvent::EditCleared);
        }
        Ok(())
    }

    fn apply_local(&mut self, axes: &[usize], target: OffsetTarget) -> Result<()> {
        let snapshot = self.refresh()?;
        if self.model.active_is_immutable() {
            let name = self.active_system_name();
            warn!(system = %name, "Refused write to machine coordinate system");
            return Err(DroError::ImmutableSystem { system: name });
        }

        let system = self.model.active();
        for &axis in axes {
            let raw = snapshot.raw_positions[axis];
            let offset = match target {
                OffsetTarget::Zero => self.model.set_zero(axis, raw)?,
                OffsetTarget::Half => self.model.set_half(axis, raw)?,
                OffsetTarget::Value(v) => self.model.set_absolute(axis, v, raw)?,
            };
            self.events.publish(DroEvent::OffsetChanged {
                system,
                axis,
                offset,
            });
        }
        self.recompute(&snapshot);
        Ok(())
    }

    fn apply_machine(&mut self, axes: &[usize], target: OffsetTarget) -> Result<()> {
        let axes = axes.to_vec();
        self.gated_dispatch(move |engine, _| {
            let to_machine = factor(engine.display_unit, engine.machine_unit);
            let words: Vec<(String, f64)> = axes
                .iter()
                .filter_map(|&axis| {
                    let letter = engine.axes.get(axis)?.letter();
                    let value = target.resolve(engine.displayed[axis]);
                    Some((letter, value * to_machine))
                })
                .collect();
            // P number comes from the controller's confirmed system, never
            // from a selection that is still pending.
            let p = CoordinateSystemTable::p_number(engine.confirmed_system);
            Ok(set_offset_command(p, &words))
        })
    }

    // ── Dispatch ───────────────────────────────────────────────────────

    /// Re-poll, check the gate, build the command from the fresh state,
    /// switch to MDI if needed and submit
    fn gated_dispatch<F>(&mut self, build: F) -> Result<()>
    where
        F: FnOnce(&Self, &FeedSnapshot) -> Result<String>,
    {
        // A rejected dispatch leaves the edit session as it was.
        let snapshot = self.refresh_with(false)?;
        if let Err(v) = SafetyGate::check(&snapshot.safety()) {
            return Err(self.reject_safety(v, "command dispatch"));
        }
        let command = build(&*self, &snapshot)?;

        if snapshot.task_mode != TaskMode::Mdi {
            debug!(from = %snapshot.task_mode, "Switching controller to MDI");
            if let Err(e) = self.channel.ensure_mode(TaskMode::Mdi) {
                return Err(self.reject_command(e));
            }
        }
        if let Err(e) = self.channel.submit(&command) {
            return Err(self.reject_command(e));
        }

        info!("Sent {}", command);
        self.events.publish(DroEvent::CommandSent(command));
        Ok(())
    }

    fn reject_safety(&self, violation: SafetyViolation, action: &str) -> DroError {
        warn!("Refused {}: {}", action, violation);
        self.events
            .publish(DroEvent::SafetyRejected(violation.to_string()));
        DroError::Safety(violation)
    }

    fn reject_command(&self, e: CommandError) -> DroError {
        warn!("{}", e);
        self.events.publish(DroEvent::CommandRejected(e.to_string()));
        DroError::Command(e)
    }

    fn check_axis(&self, axis: usize) -> Result<()> {
        if axis < self.axes.len() {
            Ok(())
        } else {
            Err(DroError::UnknownAxis(axis))
        }
    }

    fn publish_system_changed(&self, index: usize) {
        if let Some(system) = self.model.table().get(index) {
            self.events.publish(DroEvent::SystemChanged {
                index,
                name: system.name.clone(),
            });
        }
    }

    fn active_system_name(&self) -> String {
        self.model
            .table()
            .get(self.model.active())
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }

    // ── Accessors ──────────────────────────────────────────────────────

    /// Configured axes
    pub fn axes(&self) -> &AxisSet {
        &self.axes
    }

    /// Local or machine variant
    pub fn variant(&self) -> DroVariant {
        self.variant
    }

    /// Coordinate system table
    pub fn systems(&self) -> &CoordinateSystemTable {
        self.model.table()
    }

    /// Displayed values from the last poll, in display units
    pub fn displayed(&self) -> &[f64] {
        &self.displayed
    }

    /// Displayed values formatted with the unit's precision
    pub fn formatted(&self) -> Vec<String> {
        self.displayed
            .iter()
            .map(|v| self.display_unit.format(*v))
            .collect()
    }

    /// Full-precision text of one displayed value
    pub fn displayed_word(&self, axis: usize) -> Option<String> {
        self.displayed.get(axis).map(|v| format_word_value(*v))
    }

    /// Lamp colors from the last poll
    pub fn indicators(&self) -> Indicators {
        self.indicators
    }

    /// Whether rows can currently be armed
    pub fn editing_enabled(&self) -> bool {
        self.editing_enabled
    }

    /// System shown as selected
    pub fn selected_system(&self) -> usize {
        self.selected_system
    }

    /// System confirmed active (by the controller in the machine variant)
    pub fn confirmed_system(&self) -> usize {
        self.confirmed_system
    }

    /// Current display unit
    pub fn display_unit(&self) -> DisplayUnit {
        self.display_unit
    }

    /// Armed row, if any
    pub fn armed_axis(&self) -> Option<usize> {
        self.session.armed_axis()
    }

    /// Pending text of the armed row
    pub fn edit_buffer(&self) -> &str {
        self.session.buffer()
    }

    /// Offset model (read-only)
    pub fn offsets(&self) -> &OffsetModel {
        &self.model
    }

    /// Snapshot taken by the last poll
    pub fn last_snapshot(&self) -> Option<&FeedSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Event dispatcher for UI subscribers
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_targets() {
        assert_eq!(OffsetTarget::Zero.resolve(3.0), 0.0);
        assert_eq!(OffsetTarget::Half.resolve(3.0), 1.5);
        assert_eq!(OffsetTarget::Value(-2.5).resolve(3.0), -2.5);
    }

    #[test]
    fn test_variant_names() {
        assert_eq!(DroVariant::default(), DroVariant::Local);
        assert_eq!(DroVariant::Machine.to_string(), "machine");
        assert_eq!(
            serde_json::to_string(&DroVariant::Machine).unwrap(),
            "\"machine\""
        );
    }
}
