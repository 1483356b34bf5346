//! Serial pattern matching
//!
//! OCR reads `0` as `O` constantly on stamped plates, so the serial pattern
//! is evaluated against an ordered list of text transforms; the first
//! transform whose text matches wins. The serial characters themselves are
//! then read from the untransformed text at the match position, so a
//! genuine letter `O` inside the serial body survives extraction.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{MeterModel, NameplateFields, METROLOGICAL_CODE, NON_METROLOGICAL_CODE};

/// Serial pattern: fixed `TPGR0` prefix plus ten alphanumerics. The plate
/// prints one more character than the pattern anchors.
static SERIAL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"TPGR0[0-9A-Z]{10}").expect("serial pattern is valid"));

/// Full serial length as printed on the plate.
const SERIAL_LEN: usize = 16;

/// 0-based index of the model selector character inside the serial.
const MODEL_SELECTOR_INDEX: usize = 6;

/// A candidate text substitution applied before pattern matching.
///
/// Every transform must map characters 1:1 onto the same byte layout, so a
/// match offset in the transformed text is valid in the original too.
struct Transform {
    name: &'static str,
    apply: fn(&str) -> String,
}

/// Transforms in match priority order: the untouched text first, then the
/// usual OCR confusions.
const TRANSFORMS: &[Transform] = &[
    Transform {
        name: "identity",
        apply: identity,
    },
    Transform {
        name: "o-to-zero",
        apply: o_to_zero,
    },
];

fn identity(text: &str) -> String {
    text.to_string()
}

fn o_to_zero(text: &str) -> String {
    text.replace(['O', 'o'], "0")
}

/// Extract nameplate fields from normalized OCR text.
///
/// Returns `None` when no serial pattern is present under any transform; a
/// legitimate negative for photos without a plate, not an error.
pub fn extract_fields(text: &str) -> Option<NameplateFields> {
    // Pad both ends so the fixed-length slice below can never run out of
    // text, then uppercase to match the stamped form.
    let padded = format!(" {} ", text.to_uppercase());

    for transform in TRANSFORMS {
        let candidate = (transform.apply)(&padded);
        let matched = match SERIAL_PATTERN.find(&candidate) {
            Some(m) => m,
            None => continue,
        };

        // The serial is read from the untransformed text at the match
        // offset, taking characters rather than bytes: the surrounding
        // text is often Cyrillic.
        let serial: String = padded[matched.start()..].chars().take(SERIAL_LEN).collect();
        let model = serial
            .chars()
            .nth(MODEL_SELECTOR_INDEX)
            .map(MeterModel::from_selector)
            .unwrap_or(MeterModel::Unknown);

        tracing::debug!(transform = transform.name, %serial, "serial pattern matched");

        return Some(NameplateFields {
            serial,
            model,
            metrological: padded
                .contains(METROLOGICAL_CODE)
                .then_some(METROLOGICAL_CODE),
            non_metrological: padded
                .contains(NON_METROLOGICAL_CODE)
                .then_some(NON_METROLOGICAL_CODE),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_all_fields_from_a_clean_plate() {
        let fields =
            extract_fields("GAS METER TPGR0A1B2C3D4E5F 0217 0575 2024").expect("should match");
        assert_eq!(fields.serial, "TPGR0A1B2C3D4E5F");
        assert_eq!(fields.model, MeterModel::G1_6);
        assert_eq!(fields.metrological, Some("0217"));
        assert_eq!(fields.non_metrological, Some("0575"));
    }

    #[test]
    fn lowercase_text_is_uppercased_before_matching() {
        let fields = extract_fields("tpgr0a1b2c3d4e5f").expect("should match");
        assert_eq!(fields.serial, "TPGR0A1B2C3D4E5F");
    }

    #[test]
    fn text_without_a_serial_yields_none() {
        assert!(extract_fields("").is_none());
        assert!(extract_fields("GAS METER G4 0217 0575").is_none());
        assert!(extract_fields("TPGR").is_none());
        // Too few characters after the prefix.
        assert!(extract_fields("TPGR0A1B2").is_none());
    }

    #[test]
    fn firmware_codes_alone_do_not_make_a_record() {
        assert!(extract_fields("0217 0575").is_none());
    }

    #[test]
    fn o_for_zero_confusion_is_recovered() {
        // The stamped prefix digit came back as a letter O; the substituted
        // text matches, the serial keeps the characters the camera saw.
        let fields = extract_fields("sn tpgrO0123456789O end").expect("should match");
        assert_eq!(fields.serial, "TPGRO0123456789O");
        assert_eq!(fields.model, MeterModel::G1_6);
    }

    #[test]
    fn identity_match_outranks_substituted_match() {
        // The substituted text would match at the first token; the untouched
        // text matches the second. Identity has priority.
        let fields =
            extract_fields("TPGRO0123456789O TPGR0AAAAAAAAAAB").expect("should match");
        assert_eq!(fields.serial, "TPGR0AAAAAAAAAAB");
    }

    #[test]
    fn serial_is_sliced_at_the_match_not_at_the_first_prefix_lookalike() {
        let fields = extract_fields("TPGR SOMETHING TPGR0A1B2C3D4E5F").expect("should match");
        assert_eq!(fields.serial, "TPGR0A1B2C3D4E5F");
    }

    #[test]
    fn serial_at_the_very_end_picks_up_the_padding_space() {
        // Only fifteen serial characters are present; the sixteenth slot
        // falls on the padding sentinel.
        let fields = extract_fields("TPGR0ABCDEFGHIJ").expect("should match");
        assert_eq!(fields.serial.chars().count(), 16);
        assert_eq!(fields.serial, "TPGR0ABCDEFGHIJ ");
    }

    #[test]
    fn cyrillic_neighbours_do_not_break_slicing() {
        let fields =
            extract_fields("СЧЕТЧИК ГАЗА TPGR0A1B2C3D4E5F 0217").expect("should match");
        assert_eq!(fields.serial, "TPGR0A1B2C3D4E5F");
        assert_eq!(fields.metrological, Some("0217"));
        assert_eq!(fields.non_metrological, None);
    }

    #[test]
    fn firmware_codes_are_searched_in_the_untransformed_text() {
        // `O217` must not count as the metrological code even though the
        // o-to-zero transform would turn it into one.
        let fields = extract_fields("tpgrO0123456789O O217").expect("should match");
        assert_eq!(fields.metrological, None);
        assert_eq!(fields.non_metrological, None);
    }

    #[test]
    fn model_selector_drives_the_model() {
        let cases = [
            ("TPGR0A2BBBBBBBBB", MeterModel::G2_5),
            ("TPGR0A4BBBBBBBBB", MeterModel::G4),
            ("TPGR0A6BBBBBBBBB", MeterModel::G6),
            ("TPGR0A7BBBBBBBBB", MeterModel::G10),
            ("TPGR0A8BBBBBBBBB", MeterModel::G16),
            ("TPGR0A9BBBBBBBBB", MeterModel::Unknown),
            ("TPGR0AXBBBBBBBBB", MeterModel::Unknown),
        ];
        for (text, expected) in cases {
            let fields = extract_fields(text).expect("should match");
            assert_eq!(fields.model, expected, "selector in {text}");
        }
    }
}
