//! Per-coordinate-system offset storage
//!
//! One offset vector is kept for every coordinate system. Offsets are held
//! in the current display unit and rescaled in place when the unit changes,
//! so every switch costs exactly one multiplication per stored value.
//!
//! Displayed position = raw * unit_factor + offset[active][axis].
//!
//! The machine coordinate system (if the table has one) is ground truth:
//! its vector stays zero and every write to it is rejected.

use crate::data::CoordinateSystemTable;
use crate::error::{DroError, Result};
use tracing::debug;

/// Offset vectors for every coordinate system of a table
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetModel {
    table: CoordinateSystemTable,
    offsets: Vec<Vec<f64>>,
    active: usize,
    unit_factor: f64,
}

impl OffsetModel {
    /// Create a model with all offsets zero and system 0 active
    ///
    /// * `unit_factor` - raw (machine unit) to display unit scale
    pub fn new(table: CoordinateSystemTable, axis_count: usize, unit_factor: f64) -> Self {
        let offsets = vec![vec![0.0; axis_count]; table.len()];
        Self {
            table,
            offsets,
            active: 0,
            unit_factor,
        }
    }

    /// The coordinate system table
    pub fn table(&self) -> &CoordinateSystemTable {
        &self.table
    }

    /// Number of axes per offset vector
    pub fn axis_count(&self) -> usize {
        self.offsets.first().map_or(0, Vec::len)
    }

    /// Index of the active system
    pub fn active(&self) -> usize {
        self.active
    }

    /// Check if the active system is the immutable machine system
    pub fn active_is_immutable(&self) -> bool {
        self.table.is_immutable(self.active)
    }

    /// Current raw-to-display scale
    pub fn unit_factor(&self) -> f64 {
        self.unit_factor
    }

    /// Offset of one axis in one system
    pub fn offset(&self, system: usize, axis: usize) -> Option<f64> {
        self.offsets.get(system).and_then(|v| v.get(axis)).copied()
    }

    /// Full offset vector of one system
    pub fn offsets(&self, system: usize) -> Option<&[f64]> {
        self.offsets.get(system).map(Vec::as_slice)
    }

    /// Raw machine value scaled to display units
    pub fn raw_scaled(&self, raw: f64) -> f64 {
        raw * self.unit_factor
    }

    /// Displayed value of `axis` for a raw machine reading
    pub fn displayed(&self, axis: usize, raw: f64) -> Result<f64> {
        let offset = self
            .offset(self.active, axis)
            .ok_or(DroError::UnknownAxis(axis))?;
        Ok(self.raw_scaled(raw) + offset)
    }

    /// Make the displayed value of `axis` zero at the current reading
    pub fn set_zero(&mut self, axis: usize, raw: f64) -> Result<f64> {
        self.set_absolute(axis, 0.0, raw)
    }

    /// Make the displayed value of `axis` half of what it is now
    pub fn set_half(&mut self, axis: usize, raw: f64) -> Result<f64> {
        let current = self.displayed(axis, raw)?;
        let slot = self.writable_slot(axis)?;
        *slot -= current / 2.0;
        let new_offset = *slot;
        debug!(axis, current, new_offset, "Halved axis");
        Ok(new_offset)
    }

    /// Make the displayed value of `axis` equal to `value` at the current
    /// reading: offset = value - raw_scaled
    pub fn set_absolute(&mut self, axis: usize, value: f64, raw: f64) -> Result<f64> {
        let raw_scaled = self.raw_scaled(raw);
        let slot = self.writable_slot(axis)?;
        *slot = value - raw_scaled;
        let new_offset = *slot;
        debug!(axis, value, new_offset, "Set axis offset");
        Ok(new_offset)
    }

    /// Rescale every stored offset, active or not, after a unit change
    pub fn rescale_units(&mut self, old_factor: f64, new_factor: f64) {
        let ratio = new_factor / old_factor;
        for vector in &mut self.offsets {
            for value in vector.iter_mut() {
                *value *= ratio;
            }
        }
        self.unit_factor = new_factor;
        debug!(ratio, "Rescaled offsets");
    }

    /// Switch the active system; no offset is touched
    pub fn select_system(&mut self, index: usize) -> Result<()> {
        if index >= self.table.len() {
            return Err(DroError::UnknownSystem(index));
        }
        self.active = index;
        Ok(())
    }

    /// Replace the active system's vector with controller-reported offsets
    /// given in machine units
    pub fn mirror_active(&mut self, machine_offsets: &[f64]) -> Result<()> {
        if self.active_is_immutable() {
            return Err(self.immutable_error());
        }
        let factor = self.unit_factor;
        let vector = &mut self.offsets[self.active];
        for (slot, value) in vector.iter_mut().zip(machine_offsets) {
            *slot = value * factor;
        }
        Ok(())
    }

    fn writable_slot(&mut self, axis: usize) -> Result<&mut f64> {
        if self.active_is_immutable() {
            return Err(self.immutable_error());
        }
        self.offsets[self.active]
            .get_mut(axis)
            .ok_or(DroError::UnknownAxis(axis))
    }

    fn immutable_error(&self) -> DroError {
        DroError::ImmutableSystem {
            system: self
                .table
                .get(self.active)
                .map(|s| s.name.clone())
                .unwrap_or_default(),
        }
    }
}
