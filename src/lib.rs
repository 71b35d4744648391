//! # envcfg
//!
//! Typed configuration records loaded from the process environment.
//!
//! Declare a record with [`env_record!`], then fill it with
//! [`config::parse`]. Also ships a graceful-shutdown helper for network
//! services and a `tracing` subscriber initializer.

pub mod config;
pub mod error;
pub mod shutdown;
pub mod telemetry;

pub use config::{from_env, parse, parse_from};
pub use error::{Error, Errors, Result};
