//! Core library components.
//!
//! The environment lifecycle and the pieces it is built from: configuration,
//! external process execution, signal handling, registry credentials and the
//! deployment descriptor.

pub mod config;
pub mod constants;
pub mod deploy;
pub mod exec;
pub mod guard;
pub mod interrupt;
pub mod lifecycle;
pub mod pipeline;
pub mod registry;
pub mod types;
