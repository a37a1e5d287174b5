//! # DROKit Core
//!
//! Core types, traits and the readout engine for DROKit.
//! Provides coordinate system tables, offset storage, unit handling,
//! the keypad edit session, the safety gate and the controller seams.

pub mod commands;
pub mod core;
pub mod data;
pub mod edit_session;
pub mod engine;
pub mod error;
pub mod offsets;
pub mod safety;
pub mod units;

pub use core::{CommandChannel, DroEvent, EventDispatcher, PositionFeed};

pub use data::{
    Axis, AxisSet, CoordinateSystem, CoordinateSystemTable, FeedSnapshot, IndicatorColor,
    Indicators, InterpState, MachineSafetySnapshot, TaskMode,
};

pub use edit_session::{EditSession, EditState, Key, KeyOutcome};
pub use engine::{DroVariant, Engine, EngineOptions};
pub use error::{CommandError, DroError, FeedError, InputError, Result, SafetyViolation};
pub use offsets::OffsetModel;
pub use safety::SafetyGate;
pub use units::DisplayUnit;
