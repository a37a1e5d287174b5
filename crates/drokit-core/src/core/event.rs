//! Event system for readout status signals
//!
//! Provides:
//! - Event types for position updates, edits, switches and rejections
//! - Event dispatcher for publishing events to the UI layer

use crate::data::Indicators;
use crate::units::DisplayUnit;
use tokio::sync::broadcast;

/// Readout event types
#[derive(Debug, Clone, PartialEq)]
pub enum DroEvent {
    /// A poll produced new displayed values
    PositionsUpdated {
        /// Displayed value per axis
        displayed: Vec<f64>,
        /// Lamp colors
        indicators: Indicators,
    },
    /// Active coordinate system changed
    SystemChanged {
        /// Table index of the new system
        index: usize,
        /// Name of the new system
        name: String,
    },
    /// Display unit changed
    UnitsChanged(DisplayUnit),
    /// A row was armed for editing
    EditArmed(usize),
    /// The edit session returned to idle
    EditCleared,
    /// Typed or keypad input could not be parsed
    InputError(String),
    /// An action was dropped by the safety gate
    SafetyRejected(String),
    /// The controller refused a command
    CommandRejected(String),
    /// A command was accepted by the controller
    CommandSent(String),
    /// A local offset changed
    OffsetChanged {
        /// Table index of the system
        system: usize,
        /// Axis index
        axis: usize,
        /// New offset in display units
        offset: f64,
    },
}

impl std::fmt::Display for DroEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DroEvent::PositionsUpdated { displayed, .. } => {
                write!(f, "Positions: {:?}", displayed)
            }
            DroEvent::SystemChanged { name, .. } => write!(f, "System: {}", name),
            DroEvent::UnitsChanged(unit) => write!(f, "Units: {}", unit),
            DroEvent::EditArmed(axis) => write!(f, "Armed axis {}", axis),
            DroEvent::EditCleared => write!(f, "Edit cleared"),
            DroEvent::InputError(msg) => write!(f, "Input error: {}", msg),
            DroEvent::SafetyRejected(msg) => write!(f, "Safety rejected: {}", msg),
            DroEvent::CommandRejected(msg) => write!(f, "Command rejected: {}", msg),
            DroEvent::CommandSent(cmd) => write!(f, "Sent: {}", cmd),
            DroEvent::OffsetChanged {
                system,
                axis,
                offset,
            } => write!(f, "Offset[{}][{}] = {}", system, axis, offset),
        }
    }
}

/// Event dispatcher for publishing events to subscribers
#[derive(Clone)]
pub struct EventDispatcher {
    /// Broadcast sender channel for readout events.
    tx: broadcast::Sender<DroEvent>,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    ///
    /// # Arguments
    /// * `buffer_size` - Size of the broadcast buffer (default 100)
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size);
        Self { tx }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<DroEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all subscribers
    ///
    /// Publishing with no subscriber is not an error for a readout; the
    /// number of receivers reached is returned.
    pub fn publish(&self, event: DroEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}
