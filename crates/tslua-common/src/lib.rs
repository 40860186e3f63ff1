//! Common types and utilities for the tslua transpiler.
//!
//! This crate provides the foundational types shared by the driver and the
//! emitter:
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, code constants)
//! - Compiler options and cross-option validation
//! - Source positions (`Position`)
//! - Source map generation (VLQ mappings, index maps for bundles)

pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, contains_errors, diagnostic_codes};

pub mod options;
pub use options::{CompilerOptions, LuaLibImport, LuaTarget, validate_options};

pub mod position;
pub use position::Position;

pub mod source_map;
pub use source_map::{SourceMap, SourceMapBuilder};
