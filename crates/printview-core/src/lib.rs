//! # PrintView Core
//!
//! Error types and shared constants used by the PrintView crates.

pub mod constants;
pub mod error;

pub use error::{Error, GcodeError, MeshError, Result};
