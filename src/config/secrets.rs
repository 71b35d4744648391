//! Secret-valued fields.
//!
//! A `SecretString` field is coerced like text, but its value is never
//! echoed by `Debug` or by the loader's logs.

pub use secrecy::{ExposeSecret, SecretString};

use super::field::{EnvValue, FieldKind, Slot};

impl EnvValue for SecretString {
    const KIND: FieldKind = FieldKind::Text;

    fn slot(&mut self) -> Slot<'_> {
        Slot::Secret(self)
    }
}
