//! Single-row edit session
//!
//! At most one axis row is armed at a time. Keypad keys and typed text
//! build a buffer for the armed row; Enter parses it. A failed parse keeps
//! the row armed with its buffer intact. Arming another row drops the old
//! buffer without committing anything.

use crate::error::InputError;
use std::fmt;
use tracing::debug;

/// Keypad key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Digit 0-9
    Digit(u8),
    /// Decimal point
    Point,
    /// Leading minus sign
    Minus,
    /// Remove the last character
    Backspace,
    /// Empty the buffer
    Clear,
    /// Parse and commit
    Enter,
}

impl Key {
    /// Map a keypad label to a key
    ///
    /// Labels follow the keypad face: digits, `.`, `-`, `C` (clear),
    /// `<` (backspace) and `E` (enter).
    pub fn from_label(label: char) -> Option<Self> {
        match label {
            '0'..='9' => label.to_digit(10).map(|d| Key::Digit(d as u8)),
            '.' => Some(Key::Point),
            '-' => Some(Key::Minus),
            '<' => Some(Key::Backspace),
            'C' | 'c' => Some(Key::Clear),
            'E' | 'e' | '\n' | '\r' => Some(Key::Enter),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Digit(d) => write!(f, "{}", d),
            Key::Point => write!(f, "."),
            Key::Minus => write!(f, "-"),
            Key::Backspace => write!(f, "<"),
            Key::Clear => write!(f, "C"),
            Key::Enter => write!(f, "E"),
        }
    }
}

/// Result of feeding one key to the session
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// The buffer changed (or was already in the requested state)
    Edited,
    /// The key would break the number grammar and was dropped
    Refused,
    /// No row is armed
    NotArmed,
    /// Enter parsed the buffer; the caller commits and then clears
    Submit {
        /// The armed axis
        axis: usize,
        /// The parsed value
        value: f64,
    },
    /// Enter could not parse the buffer; the session is still armed
    Invalid(InputError),
}

/// Edit session state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    /// No row armed
    #[default]
    Idle,
    /// One row armed, with its pending text
    Armed {
        /// Armed axis index
        axis: usize,
        /// Pending text
        buffer: String,
    },
}

/// Keypad / typed entry state machine
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    state: EditState,
}

impl EditSession {
    /// Create an idle session
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// Armed axis, if any
    pub fn armed_axis(&self) -> Option<usize> {
        match self.state {
            EditState::Armed { axis, .. } => Some(axis),
            EditState::Idle => None,
        }
    }

    /// Pending text; empty when idle
    pub fn buffer(&self) -> &str {
        match &self.state {
            EditState::Armed { buffer, .. } => buffer,
            EditState::Idle => "",
        }
    }

    /// Arm `axis`, discarding any other row's pending text
    ///
    /// Returns the discarded buffer when a different row was armed.
    pub fn arm(&mut self, axis: usize) -> Option<String> {
        let previous = std::mem::replace(
            &mut self.state,
            EditState::Armed {
                axis,
                buffer: String::new(),
            },
        );
        match previous {
            EditState::Armed {
                axis: old, buffer, ..
            } => {
                debug!(old, axis, discarded = %buffer, "Re-armed edit session");
                Some(buffer)
            }
            EditState::Idle => {
                debug!(axis, "Armed edit session");
                None
            }
        }
    }

    /// Return to idle, dropping the buffer
    pub fn clear(&mut self) {
        self.state = EditState::Idle;
    }

    /// Replace the buffer with typed text; ignored when idle
    pub fn set_text(&mut self, text: &str) -> bool {
        match &mut self.state {
            EditState::Armed { buffer, .. } => {
                buffer.clear();
                buffer.push_str(text);
                true
            }
            EditState::Idle => false,
        }
    }

    /// Feed one key to the armed row
    pub fn apply(&mut self, key: Key) -> KeyOutcome {
        let EditState::Armed { axis, buffer } = &mut self.state else {
            return KeyOutcome::NotArmed;
        };

        match key {
            Key::Digit(d) if d <= 9 => {
                buffer.push(char::from(b'0' + d));
                KeyOutcome::Edited
            }
            Key::Digit(_) => KeyOutcome::Refused,
            Key::Point => {
                if buffer.contains('.') {
                    KeyOutcome::Refused
                } else {
                    buffer.push('.');
                    KeyOutcome::Edited
                }
            }
            Key::Minus => {
                if buffer.is_empty() {
                    buffer.push('-');
                    KeyOutcome::Edited
                } else {
                    KeyOutcome::Refused
                }
            }
            Key::Backspace => {
                buffer.pop();
                KeyOutcome::Edited
            }
            Key::Clear => {
                buffer.clear();
                KeyOutcome::Edited
            }
            Key::Enter => match parse_value(buffer) {
                Ok(value) => KeyOutcome::Submit { axis: *axis, value },
                Err(e) => KeyOutcome::Invalid(e),
            },
        }
    }
}

/// Parse a buffer as a finite number
pub fn parse_value(text: &str) -> Result<f64, InputError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| InputError::Unparseable {
            buffer: text.to_string(),
        })
}
