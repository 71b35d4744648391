//! `env_record!`: declare a struct together with its field descriptor table.

/// Declare a configuration record.
///
/// Fields take an optional `#[env("KEY")]` or
/// `#[env("KEY", default = "literal")]` annotation, in any position among the
/// field's other attributes, which are passed through. Fields declared without a
/// visibility modifier are private to the record and skipped by the loader.
/// Fields whose type is itself a record are walked recursively and need no
/// annotation.
///
/// ```
/// envcfg::env_record! {
///     #[derive(Debug, Default)]
///     pub struct Database {
///         #[env("DB_HOST")]
///         pub host: String,
///         #[env("DB_PORT", default = "5432")]
///         pub port: i32,
///     }
/// }
///
/// envcfg::env_record! {
///     #[derive(Debug, Default)]
///     pub struct Config {
///         /// Reported in logs.
///         #[env("APP_NAME")]
///         pub app_name: String,
///         pub database: Database,
///     }
/// }
/// ```
#[macro_export]
macro_rules! env_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$($fattr:tt)*])*
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $crate::__env_record_struct! {
            [$(#[$meta])* $vis struct $name]
            []
            $([$([$($fattr)*])*] [$fvis] $field [$ty])*
        }

        impl $crate::config::Record for $name {
            fn descriptors(&self) -> &'static [$crate::config::FieldDescriptor] {
                <Self as $crate::config::EnvValue>::FIELDS
            }

            fn slots(&mut self) -> ::std::vec::Vec<$crate::config::Slot<'_>> {
                let $name { $($field),* } = self;
                ::std::vec![$($crate::config::EnvValue::slot($field)),*]
            }
        }

        impl $crate::config::EnvValue for $name {
            const KIND: $crate::config::FieldKind = $crate::config::FieldKind::Record;

            const FIELDS: &'static [$crate::config::FieldDescriptor] = &[
                $(
                    $crate::config::FieldDescriptor {
                        name: stringify!($field),
                        type_name: stringify!($ty),
                        kind: <$ty as $crate::config::EnvValue>::KIND,
                        key: $crate::__env_key!($([$($fattr)*])*),
                        default: $crate::__env_default!($([$($fattr)*])*),
                        writable: !stringify!($fvis).is_empty(),
                        nested: <$ty as $crate::config::EnvValue>::FIELDS,
                    },
                )*
            ];

            fn slot(&mut self) -> $crate::config::Slot<'_> {
                $crate::config::Slot::Record(self)
            }
        }
    };
}

/// Emits the struct of `env_record!`, one field at a time, with `env(...)`
/// attributes removed and every other attribute kept in place.
#[doc(hidden)]
#[macro_export]
macro_rules! __env_record_struct {
    (@attrs [[env $($args:tt)*] $($more:tt)*] [$($kept:tt)*] $($tail:tt)*) => {
        $crate::__env_record_struct! { @attrs [$($more)*] [$($kept)*] $($tail)* }
    };
    (@attrs [[$($attr:tt)*] $($more:tt)*] [$($kept:tt)*] $($tail:tt)*) => {
        $crate::__env_record_struct! { @attrs [$($more)*] [$($kept)* #[$($attr)*]] $($tail)* }
    };
    (
        @attrs [] [$($kept:tt)*]
        [$($header:tt)*] [$($done:tt)*] [$($fvis:tt)*] $field:ident [$($ty:tt)*]
        $($rest:tt)*
    ) => {
        $crate::__env_record_struct! {
            [$($header)*]
            [$($done)* $($kept)* $($fvis)* $field: $($ty)*,]
            $($rest)*
        }
    };
    ([$($header:tt)*] [$($done:tt)*]) => {
        $($header)* { $($done)* }
    };
    (
        [$($header:tt)*] [$($done:tt)*]
        [$($attrs:tt)*] [$($fvis:tt)*] $field:ident [$($ty:tt)*]
        $($rest:tt)*
    ) => {
        $crate::__env_record_struct! {
            @attrs [$($attrs)*] []
            [$($header)*] [$($done)*] [$($fvis)*] $field [$($ty)*]
            $($rest)*
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __env_key {
    () => {
        ::std::option::Option::None
    };
    ([env($key:literal $(, default = $default:literal)? $(,)?)] $($rest:tt)*) => {
        ::std::option::Option::Some($key)
    };
    ([$($other:tt)*] $($rest:tt)*) => {
        $crate::__env_key!($($rest)*)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __env_default {
    () => {
        ::std::option::Option::None
    };
    ([env($key:literal, default = $default:literal $(,)?)] $($rest:tt)*) => {
        ::std::option::Option::Some($default)
    };
    ([env($($args:tt)*)] $($rest:tt)*) => {
        ::std::option::Option::None
    };
    ([$($other:tt)*] $($rest:tt)*) => {
        $crate::__env_default!($($rest)*)
    };
}
