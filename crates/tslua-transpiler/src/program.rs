//! The boundary with the foreign front-end.
//!
//! The front-end parses and type-checks the input program; this driver only
//! consumes its results. [`Program`] is the contract: compiler options, unit
//! enumeration, the diagnostic queries, and the native emit machinery that
//! drives custom transformers and a write callback.

use bitflags::bitflags;
use std::path::PathBuf;

use tslua_common::{CompilerOptions, Diagnostic, Position};

use crate::host::OutputSink;

/// Syntax kinds of the front-end AST that the driver and its visitor rules
/// dispatch on. The front-end owns the full grammar; this enum covers the
/// projection handed to transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    VariableStatement,
    FunctionDeclaration,
    ExpressionStatement,
    ReturnStatement,
    Identifier,
    NumericLiteral,
    StringLiteral,
    TrueKeyword,
    FalseKeyword,
    NullKeyword,
    CallExpression,
    BinaryExpression,
    PropertyAccessExpression,
    ArrayLiteralExpression,
    SpreadElement,
    Unknown,
}

/// One node of the front-end's typed tree, as projected for transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceNode {
    pub kind: SyntaxKind,
    /// Kind-specific payload: identifier name, literal text, operator.
    pub text: String,
    pub pos: Position,
    /// Byte offset and length in the unit's source text.
    pub start: u32,
    pub length: u32,
    pub children: Vec<SourceNode>,
}

impl SourceNode {
    pub fn new(kind: SyntaxKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            pos: Position::default(),
            start: 0,
            length: 0,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: SyntaxKind, text: impl Into<String>, children: Vec<SourceNode>) -> Self {
        Self {
            children,
            ..Self::new(kind, text)
        }
    }

    pub fn at(mut self, pos: Position) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_span(mut self, start: u32, length: u32) -> Self {
        self.start = start;
        self.length = length;
        self
    }
}

bitflags! {
    /// Per-unit flags reported by the front-end.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct UnitFlags: u32 {
        /// A structured-data unit (pass-through emission, no native
        /// transformer hook).
        const JSON_FILE = 1 << 0;
        /// A declaration-only unit; never printed.
        const DECLARATION_FILE = 1 << 1;
    }
}

/// One compilation unit of the typed program. Immutable input.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUnit {
    pub file_name: PathBuf,
    pub text: String,
    pub flags: UnitFlags,
    /// Top-level statements, pre-parsed by the front-end.
    pub roots: Vec<SourceNode>,
}

impl SourceUnit {
    pub fn new(file_name: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            text: text.into(),
            flags: UnitFlags::empty(),
            roots: Vec::new(),
        }
    }

    pub fn with_roots(mut self, roots: Vec<SourceNode>) -> Self {
        self.roots = roots;
        self
    }

    pub fn with_flags(mut self, flags: UnitFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_json(&self) -> bool {
        self.flags.contains(UnitFlags::JSON_FILE)
    }

    pub fn file_name_str(&self) -> String {
        self.file_name.to_string_lossy().into_owned()
    }
}

/// Callback the native emit machinery invokes for each unit it processes.
pub type UnitTransformer<'a> = &'a mut dyn FnMut(&SourceUnit);

/// The fully resolved, type-checked program produced by the front-end.
///
/// Diagnostic queries are grouped the way the front-end exposes them;
/// ordering between the groups is the driver's concern, not the program's.
pub trait Program {
    fn options(&self) -> &CompilerOptions;

    fn source_units(&self) -> &[SourceUnit];

    fn options_diagnostics(&self) -> Vec<Diagnostic>;

    fn global_diagnostics(&self) -> Vec<Diagnostic>;

    fn syntactic_diagnostics(&self, unit: &SourceUnit) -> Vec<Diagnostic>;

    fn semantic_diagnostics(&self, unit: &SourceUnit) -> Vec<Diagnostic>;

    fn declaration_diagnostics(&self) -> Vec<Diagnostic>;

    fn is_unit_from_external_library(&self, unit: &SourceUnit) -> bool;

    /// Run the native emit machinery over `target` (or every unit when
    /// `None`), invoking `transformer` per processed unit and routing all
    /// native writes through `sink`. `force_emit` runs the machinery even
    /// under `noEmit` options: several diagnostics are only produced as a
    /// byproduct of emission, so the driver always forces and re-applies
    /// the effective no-emit decision afterwards.
    fn emit(
        &self,
        target: Option<&SourceUnit>,
        sink: &mut dyn OutputSink,
        transformer: UnitTransformer<'_>,
        force_emit: bool,
    ) -> Vec<Diagnostic>;
}
