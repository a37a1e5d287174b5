//! Interpretation of the small command vocabulary a readout emits
//!
//! Recognized forms:
//! - `G54` .. `G59.3`: select a work offset
//! - `G10 L20 P<n> <axis><value>...`: set work offset `n` so the current
//!   position reads `value` on each named axis (`P0` means the active one)
//!
//! Anything else is passed through as [`ParsedCommand::Other`].

use crate::error::ParseError;
use drokit_core::data::coordinate::WORK_OFFSET_NAMES;

/// A recognized command
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCommand {
    /// Make work offset `p_number` (1-based) active
    SelectSystem(usize),
    /// Set axes of a work offset; `p_number` 0 targets the active one
    SetOffset {
        /// Work offset number
        p_number: usize,
        /// (axis index, target value) pairs
        words: Vec<(usize, f64)>,
    },
    /// Text the simulator does not model
    Other(String),
}

/// One letter + number word
fn split_word(word: &str) -> Result<(char, &str), ParseError> {
    let mut chars = word.chars();
    match chars.next() {
        Some(letter) if letter.is_ascii_alphabetic() && !chars.as_str().is_empty() => {
            Ok((letter.to_ascii_uppercase(), chars.as_str()))
        }
        _ => Err(ParseError::MalformedWord(word.to_string())),
    }
}

fn number(word: &str, text: &str) -> Result<f64, ParseError> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::MalformedWord(word.to_string()))
}

/// Parse one command line against the controller's axis letters
pub fn parse_command(line: &str, axis_letters: &[char]) -> Result<ParsedCommand, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some(index) = WORK_OFFSET_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(line))
    {
        return Ok(ParsedCommand::SelectSystem(index + 1));
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    if !words[0].eq_ignore_ascii_case("G10") {
        return Ok(ParsedCommand::Other(line.to_string()));
    }
    if !words.iter().any(|w| w.eq_ignore_ascii_case("L20")) {
        return Ok(ParsedCommand::Other(line.to_string()));
    }

    let mut p_number = None;
    let mut axes = Vec::new();
    for word in &words[1..] {
        let (letter, text) = split_word(word)?;
        match letter {
            'L' => {}
            'P' => {
                let value = number(word, text)?;
                if value.fract() != 0.0 || value < 0.0 || value > WORK_OFFSET_NAMES.len() as f64 {
                    return Err(ParseError::BadOffsetNumber(value as i64));
                }
                p_number = Some(value as usize);
            }
            _ => {
                let axis = axis_letters
                    .iter()
                    .position(|l| l.eq_ignore_ascii_case(&letter))
                    .ok_or(ParseError::UnknownAxis(letter))?;
                axes.push((axis, number(word, text)?));
            }
        }
    }

    let p_number = p_number.ok_or_else(|| ParseError::MissingWord {
        word: 'P',
        command: line.to_string(),
    })?;
    Ok(ParsedCommand::SetOffset {
        p_number,
        words: axes,
    })
}
