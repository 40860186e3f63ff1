//! Emission driver for the tslua transpiler.
//!
//! Given an already-parsed and type-checked program (the [`Program`]
//! boundary), the driver orchestrates diagnostic collection, plugin-extended
//! transformation of each unit into a Lua AST, printing, and the grouping of
//! printed modules into output chunks with source maps.
//!
//! The entry point is [`Transpiler::emit`]:
//!
//! ```ignore
//! let mut transpiler = Transpiler::new();
//! let result = transpiler.emit(EmitOptions::new(&program));
//! for diagnostic in &result.diagnostics {
//!     eprintln!("{}", diagnostic.message_text);
//! }
//! ```

pub mod chunks;
pub use chunks::{Bundle, Chunk, ChunkingPolicy, Module, PerModule};

mod driver;

pub mod host;
pub use host::{EmitHost, HostSink, NativeArtifactFilter, OutputSink, SystemHost};

pub mod plugins;
pub use plugins::{Plugin, PluginSpec, PrintRequest, VisitorMap, resolve_plugins};

pub mod program;
pub use program::{Program, SourceNode, SourceUnit, SyntaxKind, UnitFlags};

pub mod testing;

pub mod transform;
pub use transform::{TransformContext, TransformResult, transform_source_unit};

pub mod transpilation;
pub use transpilation::Transpilation;

pub mod transpiler;
pub use transpiler::{EmitOptions, EmitResult, Transpiler};

pub mod visitors;
