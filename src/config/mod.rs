//! Typed configuration from environment variables.
//!
//! A record declares, per field, the environment key it is read from and an
//! optional default. [`parse`] walks the record, resolves each key, coerces
//! the string to the field's type and assigns it in place. Every failure is
//! collected; one bad variable never hides another.
//!
//! In local dev, pair this with a dotenv file through [`DotenvFile`] or
//! `dotenvy::dotenv()`. In production the process environment is used as-is.

mod coerce;
pub mod env;
mod field;
mod macros;
pub mod secrets;

pub use coerce::parse_bool;
pub use env::{DotenvFile, Environment, Layered, ProcessEnv};
pub use field::{EnvValue, FieldDescriptor, FieldKind, IntSlot, Record, Slot};

use crate::error::{Error, Errors};
use tracing::{debug, trace};

/// Load `target` from the process environment.
///
/// See [`parse_from`].
pub fn parse<T: EnvValue + ?Sized>(target: &mut T) -> Result<(), Errors> {
    parse_from(&ProcessEnv, target)
}

/// Load `target` from `env`.
///
/// `target` must be a record; anything else fails with a single
/// [`Error::NotARecord`] and is left untouched.
///
/// Fields are assigned as they are resolved, so on failure the target is
/// partially loaded: fields processed successfully keep their new values and
/// failed fields keep their old ones. This is intentional, and callers that
/// need all-or-nothing should parse into a scratch value.
pub fn parse_from<E, T>(env: &E, target: &mut T) -> Result<(), Errors>
where
    E: Environment + ?Sized,
    T: EnvValue + ?Sized,
{
    let Slot::Record(record) = target.slot() else {
        return Err(Errors::from(Error::NotARecord));
    };

    let mut errors = Vec::new();
    walk(env, record, None, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        debug!(count = errors.len(), "configuration has errors");
        Err(Errors::new(errors))
    }
}

/// Build a default `T` and load it from the process environment.
pub fn from_env<T: EnvValue + Default>() -> Result<T, Errors> {
    from_env_with(&ProcessEnv)
}

/// Build a default `T` and load it from `env`.
pub fn from_env_with<T, E>(env: &E) -> Result<T, Errors>
where
    T: EnvValue + Default,
    E: Environment + ?Sized,
{
    let mut value = T::default();
    parse_from(env, &mut value)?;
    Ok(value)
}

/// Flattened descriptor table of `T`, nested records expanded in place.
///
/// Names are dotted paths (`database.port`). Non-writable fields are
/// omitted, as the loader never reads them. No value of `T` is built.
pub fn describe<T: EnvValue + ?Sized>() -> Vec<(String, FieldDescriptor)> {
    let mut out = Vec::new();
    if T::KIND == FieldKind::Record {
        collect(T::FIELDS, None, &mut out);
    }
    out
}

fn collect(
    fields: &'static [FieldDescriptor],
    prefix: Option<&str>,
    out: &mut Vec<(String, FieldDescriptor)>,
) {
    for field in fields {
        if !field.writable {
            continue;
        }
        let path = qualify(prefix, field.name);
        match field.kind {
            FieldKind::Record => collect(field.nested, Some(&path), out),
            _ => out.push((path, *field)),
        }
    }
}

fn walk<E>(env: &E, record: &mut dyn Record, prefix: Option<&str>, errors: &mut Vec<Error>)
where
    E: Environment + ?Sized,
{
    let descriptors = record.descriptors();
    let slots = record.slots();
    if slots.len() != descriptors.len() {
        errors.push(Error::SlotMismatch {
            record: prefix.unwrap_or("(root)").to_string(),
            descriptors: descriptors.len(),
            slots: slots.len(),
        });
        return;
    }

    for (field, slot) in descriptors.iter().zip(slots) {
        let path = qualify(prefix, field.name);

        if !field.writable {
            trace!(field = %path, "skipping non-writable field");
            continue;
        }

        if let Slot::Record(nested) = slot {
            walk(env, nested, Some(&path), errors);
            continue;
        }

        let Some(key) = field.key() else {
            trace!(field = %path, "no key, leaving field as is");
            continue;
        };

        let Some(raw) = resolve(env, key, field.default_value(), &path) else {
            errors.push(Error::MissingRequiredValue { field: path, key });
            continue;
        };

        if matches!(slot, Slot::Unsupported) {
            errors.push(Error::UnsupportedType {
                field: path,
                type_name: field.type_name,
            });
            continue;
        }

        if let Err(source) = coerce::assign(slot, raw) {
            errors.push(Error::CoercionFailure {
                field: path,
                type_name: field.type_name,
                source,
            });
        }
    }
}

/// The environment value if non-empty, else the default literal.
fn resolve<E>(env: &E, key: &str, default: Option<&str>, path: &str) -> Option<String>
where
    E: Environment + ?Sized,
{
    match env.get(key) {
        Some(value) if !value.is_empty() => {
            debug!(field = %path, key, source = "env", "resolved field");
            Some(value)
        }
        _ => {
            let value = default?;
            debug!(field = %path, key, source = "default", "resolved field");
            Some(value.to_string())
        }
    }
}

fn qualify(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}.{name}"),
        None => name.to_string(),
    }
}
