//! String to field-type coercion.

use secrecy::SecretString;

use super::field::{IntSlot, Slot};
use crate::error::CoerceError;

/// Parse a boolean literal.
///
/// Accepts `true`/`false`, `t`/`f` and `1`/`0`, case-insensitively.
pub fn parse_bool(raw: &str) -> Result<bool, CoerceError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        _ => Err(CoerceError::Bool(raw.to_string())),
    }
}

/// Coerce `raw` into the slot's type and store it.
///
/// The slot is left untouched on failure. Record and unsupported slots are
/// never passed here; the walker handles them before resolution.
pub(crate) fn assign(slot: Slot<'_>, raw: String) -> Result<(), CoerceError> {
    match slot {
        Slot::Text(field) => *field = raw,
        Slot::Secret(field) => *field = SecretString::from(raw),
        Slot::Bool(field) => *field = parse_bool(&raw)?,
        Slot::Int(int) => assign_int(int, &raw)?,
        Slot::Record(_) | Slot::Unsupported => {}
    }
    Ok(())
}

fn assign_int(slot: IntSlot<'_>, raw: &str) -> Result<(), CoerceError> {
    match slot {
        IntSlot::I8(field) => *field = raw.parse()?,
        IntSlot::I16(field) => *field = raw.parse()?,
        IntSlot::I32(field) => *field = raw.parse()?,
        IntSlot::I64(field) => *field = raw.parse()?,
        IntSlot::Isize(field) => *field = raw.parse()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::num::IntErrorKind;

    #[test]
    fn bool_grammar_is_case_insensitive() {
        for raw in ["true", "TRUE", "True", "t", "T", "1"] {
            assert!(parse_bool(raw).unwrap(), "{raw} should be true");
        }
        for raw in ["false", "FALSE", "fAlSe", "f", "F", "0"] {
            assert!(!parse_bool(raw).unwrap(), "{raw} should be false");
        }
    }

    #[test]
    fn bool_rejects_other_words() {
        for raw in ["maybe", "yes", "on", "", " true", "2"] {
            match parse_bool(raw) {
                Err(CoerceError::Bool(value)) => assert_eq!(value, raw),
                other => panic!("expected Bool error for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn int_is_range_checked_by_width() {
        let mut small: i8 = 3;
        let err = assign(Slot::Int(IntSlot::I8(&mut small)), "128".to_string()).unwrap_err();
        match err {
            CoerceError::Int(e) => assert_eq!(e.kind(), &IntErrorKind::PosOverflow),
            other => panic!("expected Int error, got {other:?}"),
        }
        assert_eq!(small, 3);

        assign(Slot::Int(IntSlot::I8(&mut small)), "-128".to_string()).unwrap();
        assert_eq!(small, -128);
    }

    #[test]
    fn int_accepts_explicit_sign() {
        let mut port: i32 = 0;
        assign(Slot::Int(IntSlot::I32(&mut port)), "+8080".to_string()).unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn int_rejects_non_numeric() {
        let mut port: i64 = 0;
        let err = assign(Slot::Int(IntSlot::I64(&mut port)), "NaN".to_string()).unwrap_err();
        assert!(matches!(err, CoerceError::Int(_)));
        assert_eq!(port, 0);
    }

    #[test]
    fn text_is_assigned_verbatim() {
        let mut name = String::new();
        assign(Slot::Text(&mut name), "  spaced  ".to_string()).unwrap();
        assert_eq!(name, "  spaced  ");

        let mut token = SecretString::from(String::new());
        assign(Slot::Secret(&mut token), "s3cr3t".to_string()).unwrap();
        assert_eq!(token.expose_secret(), "s3cr3t");
    }
}
