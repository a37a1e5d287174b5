//! Coordinate system tables
//!
//! Two tables exist: the local table used when the readout keeps its own
//! offsets (machine system plus four work systems), and the controller's
//! nine-slot work offset table (G54 through G59.3).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Names of the local table, machine system first
pub const LOCAL_SYSTEM_NAMES: [&str; 5] = ["MCS", "CS1", "CS2", "CS3", "CS4"];

/// Names of the controller work offset table, in P-number order
pub const WORK_OFFSET_NAMES: [&str; 9] = [
    "G54", "G55", "G56", "G57", "G58", "G59", "G59.1", "G59.2", "G59.3",
];

/// One coordinate system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    /// Position in the table
    pub index: usize,
    /// Canonical name; for work offsets this is also the select command
    pub name: String,
    /// True for the machine coordinate system
    pub immutable: bool,
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Fixed table of coordinate systems
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateSystemTable {
    systems: Vec<CoordinateSystem>,
}

impl CoordinateSystemTable {
    /// Machine system at index 0 followed by four local work systems
    pub fn local() -> Self {
        Self {
            systems: LOCAL_SYSTEM_NAMES
                .iter()
                .enumerate()
                .map(|(index, name)| CoordinateSystem {
                    index,
                    name: (*name).to_string(),
                    immutable: index == 0,
                })
                .collect(),
        }
    }

    /// The controller's nine work offset slots
    pub fn work_offsets() -> Self {
        Self {
            systems: WORK_OFFSET_NAMES
                .iter()
                .enumerate()
                .map(|(index, name)| CoordinateSystem {
                    index,
                    name: (*name).to_string(),
                    immutable: false,
                })
                .collect(),
        }
    }

    /// Number of systems
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Get a system by index
    pub fn get(&self, index: usize) -> Option<&CoordinateSystem> {
        self.systems.get(index)
    }

    /// Find a system by name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&CoordinateSystem> {
        self.systems
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Check if the system at `index` is the immutable machine system
    pub fn is_immutable(&self, index: usize) -> bool {
        self.systems.get(index).is_some_and(|s| s.immutable)
    }

    /// Iterate over all systems
    pub fn iter(&self) -> impl Iterator<Item = &CoordinateSystem> {
        self.systems.iter()
    }

    /// Controller P number (1-based) for a table index
    pub fn p_number(index: usize) -> usize {
        index + 1
    }

    /// Table index for a controller P number; `None` for 0
    pub fn index_from_p_number(number: usize) -> Option<usize> {
        number.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_table() {
        let table = CoordinateSystemTable::local();
        assert_eq!(table.len(), 5);
        assert!(table.is_immutable(0));
        assert!(!table.is_immutable(1));
        assert!(!table.is_immutable(99));
        assert_eq!(table.get(4).map(|s| s.name.as_str()), Some("CS4"));
    }

    #[test]
    fn test_work_offset_table() {
        let table = CoordinateSystemTable::work_offsets();
        assert_eq!(table.len(), 9);
        assert!(table.iter().all(|s| !s.immutable));
        assert_eq!(table.find("g59.3").map(|s| s.index), Some(8));
        assert_eq!(CoordinateSystemTable::p_number(0), 1);
        assert_eq!(CoordinateSystemTable::index_from_p_number(9), Some(8));
        assert_eq!(CoordinateSystemTable::index_from_p_number(0), None);
    }
}
