//! The transformation orchestrator.
//!
//! Runs the per-unit transform/print pass for one session: evaluates the
//! cheap pre-transformation gate, resolves plugins, drives the front-end's
//! native emit machinery with `process_unit` installed as a transformer and
//! the native-artifact filter substituted for the real sink, routes
//! pass-through JSON units directly, and re-applies the effective no-emit
//! decision to the collected modules.

use std::path::Path;
use tracing::debug;

use tslua_common::Diagnostic;
use tslua_common::options::validate_options;

use crate::host::{NativeArtifactFilter, OutputSink};
use crate::program::{Program, SourceUnit};
use crate::transpilation::Transpilation;

pub(crate) fn emit_program_modules(
    session: &mut Transpilation,
    sink: &mut dyn OutputSink,
    current_directory: &Path,
    program: &dyn Program,
    target_units: Option<&[SourceUnit]>,
) {
    let options = session.options().clone();
    session.append_diagnostics(validate_options(&options));

    // Cheap, coarse checks run and short-circuit before any per-unit work.
    if options.no_emit_on_error {
        let mut gate: Vec<Diagnostic> = Vec::new();
        gate.extend(program.options_diagnostics());
        gate.extend(program.global_diagnostics());
        match target_units {
            Some(units) => {
                for unit in units {
                    gate.extend(program.syntactic_diagnostics(unit));
                    gate.extend(program.semantic_diagnostics(unit));
                }
            }
            None => {
                for unit in program.source_units() {
                    gate.extend(program.syntactic_diagnostics(unit));
                    gate.extend(program.semantic_diagnostics(unit));
                }
            }
        }
        if session.diagnostics().is_empty()
            && gate.is_empty()
            && (options.declaration || options.composite)
        {
            gate.extend(program.declaration_diagnostics());
        }
        let fired = !(session.diagnostics().is_empty() && gate.is_empty());
        session.append_diagnostics(gate);
        if fired {
            debug!("pre-transformation gate fired; no units transformed");
            return;
        }
    }

    session.resolve_plugins();

    let is_emittable_json = |unit: &SourceUnit| {
        unit.is_json()
            && !options.emit_declaration_only
            && !program.is_unit_from_external_library(unit)
    };

    // Native artifacts of the front-end's own target never reach the host.
    let mut filtered = NativeArtifactFilter::new(sink);

    match target_units {
        Some(units) => {
            for unit in units {
                if is_emittable_json(unit) {
                    session.process_unit(program, current_directory, unit);
                } else {
                    let diagnostics = program.emit(
                        Some(unit),
                        &mut filtered,
                        &mut |unit: &SourceUnit| {
                            session.process_unit(program, current_directory, unit);
                        },
                        true,
                    );
                    session.append_diagnostics(diagnostics);
                }
            }
        }
        None => {
            let diagnostics = program.emit(
                None,
                &mut filtered,
                &mut |unit: &SourceUnit| {
                    session.process_unit(program, current_directory, unit);
                },
                true,
            );
            session.append_diagnostics(diagnostics);

            // JSON units have no native transformer hook; route them
            // through process_unit directly.
            for unit in program.source_units() {
                if is_emittable_json(unit) {
                    session.process_unit(program, current_directory, unit);
                }
            }
        }
    }

    // The native pass always ran with emission forced so transformation
    // diagnostics surface; apply the originally requested decision now.
    if options.no_emit || (options.no_emit_on_error && !session.diagnostics().is_empty()) {
        session.discard_modules();
    }
}
