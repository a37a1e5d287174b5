use drokit_core::commands::format_word_value;
use drokit_core::units::{factor, DisplayUnit};
use drokit_core::{CoordinateSystemTable, EditSession, Key, KeyOutcome, OffsetModel};
use proptest::prelude::*;

fn model(unit_factor: f64) -> OffsetModel {
    let mut model = OffsetModel::new(CoordinateSystemTable::local(), 3, unit_factor);
    model.select_system(1).unwrap();
    model
}

fn tolerance(magnitude: f64) -> f64 {
    1e-9 * magnitude.abs().max(1.0)
}

proptest! {
    #[test]
    fn absolute_displays_the_target(
        raw in -1000.0f64..1000.0,
        value in -1000.0f64..1000.0,
        axis in 0usize..3,
    ) {
        let mut m = model(25.4);
        m.set_absolute(axis, value, raw).unwrap();
        let shown = m.displayed(axis, raw).unwrap();
        prop_assert!((shown - value).abs() < tolerance(raw * 25.4));
    }

    #[test]
    fn zero_displays_zero(raw in -1000.0f64..1000.0, axis in 0usize..3) {
        let mut m = model(1.0);
        m.set_zero(axis, raw).unwrap();
        prop_assert!(m.displayed(axis, raw).unwrap().abs() < tolerance(raw));
    }

    #[test]
    fn half_halves_the_display(
        raw in -1000.0f64..1000.0,
        start in -1000.0f64..1000.0,
    ) {
        let mut m = model(1.0);
        m.set_absolute(0, start, raw).unwrap();
        m.set_half(0, raw).unwrap();
        let shown = m.displayed(0, raw).unwrap();
        prop_assert!((shown - start / 2.0).abs() < tolerance(start + raw));
    }

    #[test]
    fn edits_leave_other_axes_alone(
        raw in -100.0f64..100.0,
        value in -100.0f64..100.0,
    ) {
        let mut m = model(1.0);
        m.set_absolute(1, 7.0, 0.0).unwrap();
        m.set_absolute(2, -3.0, 0.0).unwrap();
        m.set_absolute(0, value, raw).unwrap();
        m.set_half(0, raw).unwrap();
        prop_assert_eq!(m.offset(1, 1), Some(7.0));
        prop_assert_eq!(m.offset(1, 2), Some(-3.0));
    }

    #[test]
    fn unit_round_trip_restores_offsets(offsets in prop::collection::vec(-500.0f64..500.0, 4)) {
        let mut m = OffsetModel::new(CoordinateSystemTable::local(), 1, 1.0);
        for (i, v) in offsets.iter().enumerate() {
            m.select_system(i + 1).unwrap();
            m.set_absolute(0, *v, 0.0).unwrap();
        }
        let inch = factor(DisplayUnit::Inch, DisplayUnit::Inch);
        let mm = factor(DisplayUnit::Inch, DisplayUnit::Millimeter);
        m.rescale_units(inch, mm);
        m.rescale_units(mm, inch);
        for (i, v) in offsets.iter().enumerate() {
            let after = m.offset(i + 1, 0).unwrap();
            prop_assert!((after - v).abs() < tolerance(*v));
        }
        prop_assert_eq!(m.offset(0, 0), Some(0.0));
    }

    #[test]
    fn word_values_always_have_a_point(value in -1.0e6f64..1.0e6) {
        let text = format_word_value(value);
        prop_assert!(text.contains('.'));
        prop_assert!(!text.contains('e'));
        let parsed: f64 = text.parse().unwrap();
        prop_assert_eq!(parsed, value);
    }

    #[test]
    fn keypad_buffer_stays_numeric(labels in "[0-9.\\-<C]{0,16}") {
        let mut session = EditSession::new();
        session.arm(0);
        for c in labels.chars() {
            if let Some(key) = Key::from_label(c) {
                session.apply(key);
            }
        }
        let buffer = session.buffer().to_string();
        prop_assert!(buffer.matches('.').count() <= 1);
        prop_assert!(!buffer[1.min(buffer.len())..].contains('-'));
        if let KeyOutcome::Submit { value, .. } = session.apply(Key::Enter) {
            prop_assert_eq!(value, buffer.parse::<f64>().unwrap());
        }
    }
}
