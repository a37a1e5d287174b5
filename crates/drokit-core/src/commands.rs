//! Command text for the controller's command parser
//!
//! - Offset set: `G10 L20 P<n> <AXIS><value>` with the value at full
//!   precision, never the display-rounded value
//! - Coordinate system select: the system's canonical name (`G54`..`G59.3`)

use crate::data::CoordinateSystem;

/// Format a value at full precision for a G-code word
///
/// No exponent notation, always a decimal point, `-0.0` printed as `0.0`.
pub fn format_word_value(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    let mut text = format!("{}", value);
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}

/// `G10 L20 P<p_number>` followed by one word per (letter, value) pair
pub fn set_offset_command(p_number: usize, words: &[(String, f64)]) -> String {
    let mut cmd = format!("G10 L20 P{}", p_number);
    for (letter, value) in words {
        cmd.push(' ');
        cmd.push_str(letter);
        cmd.push_str(&format_word_value(*value));
    }
    cmd
}

/// Command that makes `system` the active coordinate system
pub fn select_system_command(system: &CoordinateSystem) -> String {
    system.name.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CoordinateSystemTable;

    #[test]
    fn test_word_values() {
        assert_eq!(format_word_value(0.0), "0.0");
        assert_eq!(format_word_value(-0.0), "0.0");
        assert_eq!(format_word_value(5.0), "5.0");
        assert_eq!(format_word_value(-1.2345678), "-1.2345678");
        assert_eq!(format_word_value(0.0000001), "0.0000001");
        assert_eq!(format_word_value(1.0 / 3.0), "0.3333333333333333");
    }

    #[test]
    fn test_set_offset_command() {
        assert_eq!(
            set_offset_command(1, &[("X".to_string(), 0.0)]),
            "G10 L20 P1 X0.0"
        );
        assert_eq!(
            set_offset_command(
                9,
                &[("X".to_string(), 1.5), ("Z".to_string(), -2.0)]
            ),
            "G10 L20 P9 X1.5 Z-2.0"
        );
    }

    #[test]
    fn test_select_command() {
        let table = CoordinateSystemTable::work_offsets();
        let names: Vec<String> = table.iter().map(select_system_command).collect();
        assert_eq!(names.first().map(String::as_str), Some("G54"));
        assert_eq!(names.last().map(String::as_str), Some("G59.3"));
    }
}
