//! Field descriptor tables and typed slots.
//!
//! A record exposes two things to the loader: a static table describing each
//! field (name, declared type, lookup key, default) and, per call, a list of
//! mutable slots in the same order. `env_record!` generates both.

use secrecy::SecretString;

/// Declared type of a field, as far as the loader cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Bool,
    /// Signed integer of the given bit width.
    Int { bits: u32 },
    Record,
    Unsupported,
}

/// Static description of one field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// The declared type as written in the source.
    pub type_name: &'static str,
    pub kind: FieldKind,
    pub key: Option<&'static str>,
    pub default: Option<&'static str>,
    /// Non-writable fields are skipped by the loader.
    pub writable: bool,
    /// Field table of a nested record; empty for every other kind.
    pub nested: &'static [FieldDescriptor],
}

impl FieldDescriptor {
    /// Lookup key, with an empty key treated as none.
    pub fn key(&self) -> Option<&'static str> {
        self.key.filter(|k| !k.is_empty())
    }

    /// Default literal, with an empty default treated as none.
    pub fn default_value(&self) -> Option<&'static str> {
        self.default.filter(|d| !d.is_empty())
    }
}

/// Mutable view of a signed integer field.
#[derive(Debug)]
pub enum IntSlot<'a> {
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    Isize(&'a mut isize),
}

/// Mutable view of one field, used to assign the coerced value.
pub enum Slot<'a> {
    Text(&'a mut String),
    Secret(&'a mut SecretString),
    Bool(&'a mut bool),
    Int(IntSlot<'a>),
    Record(&'a mut dyn Record),
    Unsupported,
}

impl Slot<'_> {
    pub fn kind(&self) -> FieldKind {
        match self {
            Slot::Text(_) | Slot::Secret(_) => FieldKind::Text,
            Slot::Bool(_) => FieldKind::Bool,
            Slot::Int(IntSlot::I8(_)) => FieldKind::Int { bits: 8 },
            Slot::Int(IntSlot::I16(_)) => FieldKind::Int { bits: 16 },
            Slot::Int(IntSlot::I32(_)) => FieldKind::Int { bits: 32 },
            Slot::Int(IntSlot::I64(_)) => FieldKind::Int { bits: 64 },
            Slot::Int(IntSlot::Isize(_)) => FieldKind::Int { bits: isize::BITS },
            Slot::Record(_) => FieldKind::Record,
            Slot::Unsupported => FieldKind::Unsupported,
        }
    }
}

impl std::fmt::Debug for Slot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Values stay out of debug output; secrets live in here too.
        write!(f, "Slot({:?})", self.kind())
    }
}

/// A structured value the loader can walk.
pub trait Record {
    /// Field table, in declaration order.
    fn descriptors(&self) -> &'static [FieldDescriptor];

    /// One slot per descriptor, same order. A record whose counts differ is
    /// reported as [`Error::SlotMismatch`](crate::Error::SlotMismatch) and not
    /// loaded.
    fn slots(&mut self) -> Vec<Slot<'_>>;
}

/// A type that can sit in a record field.
pub trait EnvValue {
    const KIND: FieldKind;

    /// Field table when `Self` is a record.
    const FIELDS: &'static [FieldDescriptor] = &[];

    fn slot(&mut self) -> Slot<'_>;
}

impl EnvValue for String {
    const KIND: FieldKind = FieldKind::Text;

    fn slot(&mut self) -> Slot<'_> {
        Slot::Text(self)
    }
}

impl EnvValue for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn slot(&mut self) -> Slot<'_> {
        Slot::Bool(self)
    }
}

macro_rules! int_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl EnvValue for $ty {
                const KIND: FieldKind = FieldKind::Int { bits: <$ty>::BITS };

                fn slot(&mut self) -> Slot<'_> {
                    Slot::Int(IntSlot::$variant(self))
                }
            }
        )*
    };
}

int_value! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
}

macro_rules! unsupported_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl EnvValue for $ty {
                const KIND: FieldKind = FieldKind::Unsupported;

                fn slot(&mut self) -> Slot<'_> {
                    Slot::Unsupported
                }
            }
        )*
    };
}

unsupported_value!(u8, u16, u32, u64, usize, f32, f64, char);

impl<T> EnvValue for Option<T> {
    const KIND: FieldKind = FieldKind::Unsupported;

    fn slot(&mut self) -> Slot<'_> {
        Slot::Unsupported
    }
}

impl<T> EnvValue for Vec<T> {
    const KIND: FieldKind = FieldKind::Unsupported;

    fn slot(&mut self) -> Slot<'_> {
        Slot::Unsupported
    }
}

impl<K, V, S> EnvValue for std::collections::HashMap<K, V, S> {
    const KIND: FieldKind = FieldKind::Unsupported;

    fn slot(&mut self) -> Slot<'_> {
        Slot::Unsupported
    }
}

impl<K, V> EnvValue for std::collections::BTreeMap<K, V> {
    const KIND: FieldKind = FieldKind::Unsupported;

    fn slot(&mut self) -> Slot<'_> {
        Slot::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_and_default_count_as_absent() {
        let field = FieldDescriptor {
            name: "port",
            type_name: "i32",
            kind: FieldKind::Int { bits: 32 },
            key: Some(""),
            default: Some(""),
            writable: true,
            nested: &[],
        };
        assert_eq!(field.key(), None);
        assert_eq!(field.default_value(), None);
    }

    #[test]
    fn slot_kind_matches_declared_kind() {
        let mut port: i16 = 0;
        assert_eq!(port.slot().kind(), <i16 as EnvValue>::KIND);

        let mut size: isize = 0;
        assert_eq!(size.slot().kind(), FieldKind::Int { bits: isize::BITS });

        let mut list: Vec<String> = Vec::new();
        assert_eq!(list.slot().kind(), FieldKind::Unsupported);
    }
}
