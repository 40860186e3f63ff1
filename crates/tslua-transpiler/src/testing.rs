//! Test utilities: an in-memory host and a scriptable front-end.
//!
//! Public so plugin authors can drive the façade without a real front-end;
//! this repository's own tests use the same types.

use anyhow::{Result, bail};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use tslua_common::{CompilerOptions, Diagnostic};

use crate::host::{EmitHost, OutputSink};
use crate::program::{Program, SourceUnit, UnitFlags, UnitTransformer};

/// One write captured by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenFile {
    pub content: String,
    pub emit_bom: bool,
    pub source_files: Vec<PathBuf>,
}

/// An [`EmitHost`] over in-memory state, recording every write in order.
pub struct MemoryHost {
    current_directory: PathBuf,
    files: FxHashMap<PathBuf, String>,
    written: IndexMap<PathBuf, WrittenFile>,
    failing_path: Option<PathBuf>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::with_current_directory("/")
    }

    pub fn with_current_directory(path: impl Into<PathBuf>) -> Self {
        Self {
            current_directory: path.into(),
            files: FxHashMap::default(),
            written: IndexMap::new(),
            failing_path: None,
        }
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    /// Make every write to `path` fail, to exercise write-error reporting.
    pub fn fail_writes_to(&mut self, path: impl Into<PathBuf>) {
        self.failing_path = Some(path.into());
    }

    pub fn written(&self) -> &IndexMap<PathBuf, WrittenFile> {
        &self.written
    }

    pub fn written_paths(&self) -> Vec<PathBuf> {
        self.written.keys().cloned().collect()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl EmitHost for MemoryHost {
    fn current_directory(&self) -> PathBuf {
        self.current_directory.clone()
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        self.files.get(path).cloned()
    }

    fn write_file(
        &mut self,
        path: &Path,
        content: &str,
        emit_bom: bool,
        source_files: &[PathBuf],
    ) -> Result<()> {
        if self.failing_path.as_deref() == Some(path) {
            bail!("no space left on device");
        }
        self.written.insert(
            path.to_path_buf(),
            WrittenFile {
                content: content.to_string(),
                emit_bom,
                source_files: source_files.to_vec(),
            },
        );
        Ok(())
    }
}

/// A scriptable [`Program`]: configured units and diagnostics, plus a native
/// emit that behaves like the foreign front-end's — it invokes the installed
/// transformer per ordinary unit, skips JSON/declaration/external units, and
/// writes its own `.js`/`.js.map` artifacts through the provided sink.
pub struct FakeProgram {
    options: CompilerOptions,
    units: Vec<SourceUnit>,
    options_diagnostics: Vec<Diagnostic>,
    global_diagnostics: Vec<Diagnostic>,
    declaration_diagnostics: Vec<Diagnostic>,
    syntactic: FxHashMap<PathBuf, Vec<Diagnostic>>,
    semantic: FxHashMap<PathBuf, Vec<Diagnostic>>,
    emit_diagnostics: Vec<Diagnostic>,
    external_units: FxHashSet<PathBuf>,
    write_native_artifacts: bool,
    emit_invocations: Cell<usize>,
    transformed: RefCell<Vec<PathBuf>>,
}

impl FakeProgram {
    pub fn new(options: CompilerOptions, units: Vec<SourceUnit>) -> Self {
        Self {
            options,
            units,
            options_diagnostics: Vec::new(),
            global_diagnostics: Vec::new(),
            declaration_diagnostics: Vec::new(),
            syntactic: FxHashMap::default(),
            semantic: FxHashMap::default(),
            emit_diagnostics: Vec::new(),
            external_units: FxHashSet::default(),
            write_native_artifacts: true,
            emit_invocations: Cell::new(0),
            transformed: RefCell::new(Vec::new()),
        }
    }

    pub fn with_options_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.options_diagnostics.push(diagnostic);
        self
    }

    pub fn with_global_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.global_diagnostics.push(diagnostic);
        self
    }

    pub fn with_declaration_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.declaration_diagnostics.push(diagnostic);
        self
    }

    pub fn with_syntactic_diagnostic(mut self, file: impl Into<PathBuf>, diagnostic: Diagnostic) -> Self {
        self.syntactic.entry(file.into()).or_default().push(diagnostic);
        self
    }

    pub fn with_semantic_diagnostic(mut self, file: impl Into<PathBuf>, diagnostic: Diagnostic) -> Self {
        self.semantic.entry(file.into()).or_default().push(diagnostic);
        self
    }

    /// A diagnostic only produced while the emit machinery runs, keyed by
    /// the `file` field of the diagnostic.
    pub fn with_emit_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.emit_diagnostics.push(diagnostic);
        self
    }

    pub fn with_external_unit(mut self, file: impl Into<PathBuf>) -> Self {
        self.external_units.insert(file.into());
        self
    }

    pub fn without_native_artifacts(mut self) -> Self {
        self.write_native_artifacts = false;
        self
    }

    /// How often the native emit machinery was invoked.
    pub fn emit_invocations(&self) -> usize {
        self.emit_invocations.get()
    }

    /// The units handed to the installed transformer, in order.
    pub fn transformed_units(&self) -> Vec<PathBuf> {
        self.transformed.borrow().clone()
    }
}

impl Program for FakeProgram {
    fn options(&self) -> &CompilerOptions {
        &self.options
    }

    fn source_units(&self) -> &[SourceUnit] {
        &self.units
    }

    fn options_diagnostics(&self) -> Vec<Diagnostic> {
        self.options_diagnostics.clone()
    }

    fn global_diagnostics(&self) -> Vec<Diagnostic> {
        self.global_diagnostics.clone()
    }

    fn syntactic_diagnostics(&self, unit: &SourceUnit) -> Vec<Diagnostic> {
        self.syntactic.get(&unit.file_name).cloned().unwrap_or_default()
    }

    fn semantic_diagnostics(&self, unit: &SourceUnit) -> Vec<Diagnostic> {
        self.semantic.get(&unit.file_name).cloned().unwrap_or_default()
    }

    fn declaration_diagnostics(&self) -> Vec<Diagnostic> {
        self.declaration_diagnostics.clone()
    }

    fn is_unit_from_external_library(&self, unit: &SourceUnit) -> bool {
        self.external_units.contains(&unit.file_name)
    }

    fn emit(
        &self,
        target: Option<&SourceUnit>,
        sink: &mut dyn OutputSink,
        transformer: UnitTransformer<'_>,
        force_emit: bool,
    ) -> Vec<Diagnostic> {
        self.emit_invocations.set(self.emit_invocations.get() + 1);
        if self.options.no_emit && !force_emit {
            return Vec::new();
        }

        let targets: Vec<&SourceUnit> = match target {
            Some(unit) => vec![unit],
            None => self.units.iter().collect(),
        };

        let mut diagnostics = Vec::new();
        for unit in targets {
            if self.is_unit_from_external_library(unit)
                || unit.flags.contains(UnitFlags::JSON_FILE)
                || unit.flags.contains(UnitFlags::DECLARATION_FILE)
            {
                continue;
            }
            self.transformed.borrow_mut().push(unit.file_name.clone());
            transformer(unit);

            if self.write_native_artifacts {
                let native = unit.file_name.with_extension("js");
                let native = native.to_string_lossy();
                let _ = sink.write(&native, "// native artifact\n", false, &[]);
                let _ = sink.write(&format!("{native}.map"), "{}", false, &[]);
            }

            let unit_file = unit.file_name_str();
            diagnostics.extend(
                self.emit_diagnostics
                    .iter()
                    .filter(|diagnostic| diagnostic.file == unit_file)
                    .cloned(),
            );
        }
        diagnostics
    }
}
