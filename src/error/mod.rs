//! Error types for each stage of compilation.

mod error_types;

pub use error_types::*;
