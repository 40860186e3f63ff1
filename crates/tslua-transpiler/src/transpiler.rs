//! The transpiler façade.

use tracing::debug;

use tslua_common::{Diagnostic, contains_errors};

use crate::chunks::ChunkingPolicy;
use crate::driver::emit_program_modules;
use crate::host::{EmitHost, HostSink, SystemHost};
use crate::plugins::PluginSpec;
use crate::program::{Program, SourceUnit};
use crate::transpilation::Transpilation;

/// Inputs of one emit invocation.
pub struct EmitOptions<'a> {
    pub program: &'a dyn Program,
    /// Restrict the run to these units; `None` means every unit of the
    /// program, in its enumeration order.
    pub source_units: Option<&'a [SourceUnit]>,
    pub plugins: Vec<PluginSpec>,
    /// Overrides the policy derived from the compiler options.
    pub chunking_policy: Option<Box<dyn ChunkingPolicy>>,
}

impl<'a> EmitOptions<'a> {
    pub fn new(program: &'a dyn Program) -> Self {
        Self {
            program,
            source_units: None,
            plugins: Vec::new(),
            chunking_policy: None,
        }
    }

    pub fn with_source_units(mut self, source_units: &'a [SourceUnit]) -> Self {
        self.source_units = Some(source_units);
        self
    }

    pub fn with_plugins(mut self, plugins: Vec<PluginSpec>) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_chunking_policy(mut self, policy: Box<dyn ChunkingPolicy>) -> Self {
        self.chunking_policy = Some(policy);
        self
    }
}

/// Terminal value of one driver invocation. When `emit_skipped` is true,
/// zero chunks were written; diagnostics are returned either way.
#[derive(Debug, Clone)]
pub struct EmitResult {
    pub emit_skipped: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Entry point: binds a host and exposes the emit operation.
pub struct Transpiler<H: EmitHost = SystemHost> {
    pub host: H,
}

impl Transpiler<SystemHost> {
    /// A transpiler bound to the ambient process capabilities.
    pub fn new() -> Self {
        Self { host: SystemHost }
    }
}

impl Default for Transpiler<SystemHost> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: EmitHost> Transpiler<H> {
    pub fn with_host(host: H) -> Self {
        Self { host }
    }

    pub fn emit(&mut self, emit_options: EmitOptions<'_>) -> EmitResult {
        let program = emit_options.program;
        let options = program.options().clone();
        let current_directory = self.host.current_directory();

        let mut session = Transpilation::new(options.clone(), emit_options.plugins);
        if let Some(policy) = emit_options.chunking_policy {
            session.set_chunking_policy(policy);
        }
        let mut sink = HostSink::new(&mut self.host);
        emit_program_modules(
            &mut session,
            &mut sink,
            &current_directory,
            program,
            emit_options.source_units,
        );

        if options.no_emit || (options.no_emit_on_error && contains_errors(session.diagnostics()))
        {
            debug!("emit skipped before chunk assembly");
            return EmitResult {
                emit_skipped: true,
                diagnostics: session.into_diagnostics(),
            };
        }

        let chunks = session.emit(&mut sink);
        let emit_skipped = chunks.is_empty();
        debug!(chunks = chunks.len(), emit_skipped, "emit complete");
        EmitResult {
            emit_skipped,
            diagnostics: session.into_diagnostics(),
        }
    }
}
