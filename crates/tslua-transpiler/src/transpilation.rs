//! Per-run transpilation state and chunk assembly.
//!
//! One [`Transpilation`] exists per driver invocation. It owns the effective
//! options snapshot, the resolved plugin set, the diagnostics collected so
//! far, and the modules produced by the orchestrator; its `emit` performs
//! the second stage: grouping modules into chunks and writing them.

use std::path::Path;
use tracing::{debug, trace};

use tslua_common::{CompilerOptions, Diagnostic, diagnostic_codes};

use crate::chunks::{Bundle, Chunk, ChunkingPolicy, Module, PerModule};
use crate::host::OutputSink;
use crate::plugins::{
    ComposedPrinter, Plugin, PluginSpec, VisitorMap, create_printer, create_visitor_map,
    resolve_plugins,
};
use crate::program::{Program, SourceUnit};
use crate::transform::transform_source_unit;

pub struct Transpilation {
    options: CompilerOptions,
    plugin_specs: Option<Vec<PluginSpec>>,
    plugins: Vec<Plugin>,
    visitor_map: Option<VisitorMap>,
    printer: Option<ComposedPrinter>,
    policy: Box<dyn ChunkingPolicy>,
    diagnostics: Vec<Diagnostic>,
    modules: Vec<Module>,
}

impl Transpilation {
    pub fn new(options: CompilerOptions, plugin_specs: Vec<PluginSpec>) -> Self {
        let policy: Box<dyn ChunkingPolicy> = if options.bundle.is_some() {
            Box::new(Bundle)
        } else {
            Box::new(PerModule)
        };
        Self {
            options,
            plugin_specs: Some(plugin_specs),
            plugins: Vec::new(),
            visitor_map: None,
            printer: None,
            policy,
            diagnostics: Vec::new(),
            modules: Vec::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn append_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn discard_modules(&mut self) {
        self.modules.clear();
    }

    /// Replace the chunking policy chosen from the options.
    pub fn set_chunking_policy(&mut self, policy: Box<dyn ChunkingPolicy>) {
        self.policy = policy;
    }

    /// Resolve the configured plugins and derive the composed visitor map
    /// and printer. Called once, after the pre-transformation gate; a gated
    /// run never resolves plugins.
    pub fn resolve_plugins(&mut self) {
        let specs = self.plugin_specs.take().unwrap_or_default();
        self.plugins = resolve_plugins(&mut self.diagnostics, specs);
        self.visitor_map = Some(create_visitor_map(&self.plugins));
        self.printer = Some(create_printer(&self.plugins));
    }

    /// Transform one unit, and in emit mode print it and collect the
    /// resulting module. Transformation diagnostics are recorded either way.
    pub fn process_unit(
        &mut self,
        program: &dyn Program,
        current_directory: &Path,
        unit: &SourceUnit,
    ) {
        let visitor_map = self
            .visitor_map
            .as_ref()
            .expect("plugins resolved before units are processed");
        let result = transform_source_unit(unit, visitor_map, &self.options);
        self.diagnostics.extend(result.diagnostics);

        if self.options.no_emit || self.options.emit_declaration_only {
            return;
        }

        let mut lua_ast = result.lua_ast;
        let mut features = result.lua_lib_features;
        let file_name_str = unit.file_name_str();
        let printer = self
            .printer
            .as_ref()
            .expect("plugins resolved before units are processed");
        let print_result = printer.print(
            program,
            &self.options,
            &file_name_str,
            &mut lua_ast,
            &mut features,
        );

        let file_name = if unit.file_name.is_absolute() {
            unit.file_name.clone()
        } else {
            // Resolving against a relative directory would silently fall
            // back to the ambient process directory.
            assert!(
                current_directory.is_absolute(),
                "Invalid path: {}",
                current_directory.display()
            );
            current_directory.join(&unit.file_name)
        };

        trace!(file = %file_name.display(), "collected module");
        self.modules.push(Module {
            source_files: vec![unit.file_name.clone()],
            file_name,
            lua_ast,
            code: print_result.code,
            source_map: print_result.source_map,
        });
    }

    /// Assemble the collected modules into chunks and write them. Returns
    /// the chunks actually written; an empty list is a valid outcome.
    pub fn emit(&mut self, sink: &mut dyn OutputSink) -> Vec<Chunk> {
        let emit_bom = self.options.emit_bom;
        let chunks = self.policy.assemble(&self.modules, &self.options);
        debug!(
            modules = self.modules.len(),
            chunks = chunks.len(),
            "assembling output chunks"
        );

        let mut written = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let output_path = chunk.output_path.to_string_lossy().into_owned();
            if let Err(error) = sink.write(&output_path, &chunk.code, emit_bom, &chunk.source_files)
            {
                self.diagnostics.push(Diagnostic::global(
                    format!("could not write file '{output_path}': {error:#}"),
                    diagnostic_codes::COULD_NOT_WRITE_FILE,
                ));
                continue;
            }
            if self.options.source_map {
                if let Some(map) = &chunk.source_map {
                    let map_path = format!("{output_path}.map");
                    if let Err(error) = sink.write(&map_path, map, emit_bom, &chunk.source_files) {
                        self.diagnostics.push(Diagnostic::global(
                            format!("could not write file '{map_path}': {error:#}"),
                            diagnostic_codes::COULD_NOT_WRITE_FILE,
                        ));
                    }
                }
            }
            written.push(chunk);
        }
        written
    }
}
