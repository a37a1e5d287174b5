//! Controller seams and status events
//!
//! The engine talks to the controller only through [`PositionFeed`] and
//! [`CommandChannel`], and reports to the UI layer only through
//! [`EventDispatcher`].

pub mod controller;
pub mod event;

pub use controller::{CommandChannel, PositionFeed};
pub use event::{DroEvent, EventDispatcher};
