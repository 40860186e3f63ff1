//! End-to-end driver scenarios over the in-memory host.

use std::path::PathBuf;

use tslua_common::{CompilerOptions, diagnostic_codes};
use tslua_transpiler::testing::{FakeProgram, MemoryHost};
use tslua_transpiler::{EmitOptions, SourceNode, SourceUnit, SyntaxKind, Transpiler};

fn code_unit(path: &str, name: &str, value: &str) -> SourceUnit {
    SourceUnit::new(path, format!("let {name} = {value}")).with_roots(vec![
        SourceNode::with_children(
            SyntaxKind::VariableStatement,
            "",
            vec![
                SourceNode::new(SyntaxKind::Identifier, name),
                SourceNode::new(SyntaxKind::NumericLiteral, value),
            ],
        ),
    ])
}

fn two_unit_program(options: CompilerOptions) -> FakeProgram {
    FakeProgram::new(
        options,
        vec![
            code_unit("/proj/a.ts", "a", "1"),
            code_unit("/proj/b.ts", "b", "2"),
        ],
    )
}

#[test]
fn two_units_two_chunks() {
    let options = CompilerOptions {
        no_emit_on_error: true,
        ..Default::default()
    };
    let program = two_unit_program(options);

    let mut transpiler = Transpiler::with_host(MemoryHost::new());
    let result = transpiler.emit(EmitOptions::new(&program));

    assert!(!result.emit_skipped);
    assert!(result.diagnostics.is_empty());

    let written = transpiler.host.written();
    assert_eq!(written.len(), 2);
    let a = &written[&PathBuf::from("/proj/a.lua")];
    assert_eq!(a.content, "local a = 1\n");
    assert_eq!(a.source_files, vec![PathBuf::from("/proj/a.ts")]);
    let b = &written[&PathBuf::from("/proj/b.lua")];
    assert_eq!(b.content, "local b = 2\n");
    assert_eq!(b.source_files, vec![PathBuf::from("/proj/b.ts")]);
}

#[test]
fn no_emit_collects_diagnostics_but_writes_nothing() {
    let options = CompilerOptions {
        no_emit: true,
        ..Default::default()
    };
    let program = two_unit_program(options);

    let mut transpiler = Transpiler::with_host(MemoryHost::new());
    let result = transpiler.emit(EmitOptions::new(&program));

    assert!(result.emit_skipped);
    assert!(result.diagnostics.is_empty());
    assert!(transpiler.host.written().is_empty());
    // Transformation still ran, for diagnostics.
    assert_eq!(
        program.transformed_units(),
        vec![PathBuf::from("/proj/a.ts"), PathBuf::from("/proj/b.ts")]
    );
}

#[test]
fn runs_are_deterministic() {
    let run = || {
        let program = two_unit_program(CompilerOptions {
            source_map: true,
            ..Default::default()
        });
        let mut transpiler = Transpiler::with_host(MemoryHost::new());
        let result = transpiler.emit(EmitOptions::new(&program));
        let written: Vec<(PathBuf, String)> = transpiler
            .host
            .written()
            .iter()
            .map(|(path, file)| (path.clone(), file.content.clone()))
            .collect();
        (written, result.diagnostics)
    };

    let first = run();
    let second = run();
    assert_eq!(first.0, second.0, "chunk outputs are byte-identical");
    assert_eq!(first.1, second.1, "diagnostic sequences are identical");
}

#[test]
fn source_maps_are_written_next_to_chunks() {
    let options = CompilerOptions {
        source_map: true,
        ..Default::default()
    };
    let program = two_unit_program(options);

    let mut transpiler = Transpiler::with_host(MemoryHost::new());
    transpiler.emit(EmitOptions::new(&program));

    let written = transpiler.host.written();
    let map = &written[&PathBuf::from("/proj/a.lua.map")];
    let parsed: serde_json::Value = serde_json::from_str(&map.content).expect("valid map JSON");
    assert_eq!(parsed["version"], 3);
    assert_eq!(parsed["file"], "a.lua");
    assert_eq!(parsed["sources"][0], "/proj/a.ts");
    assert!(!parsed["mappings"].as_str().expect("mappings").is_empty());
    // Map writes carry the same source-unit tags as their chunk.
    assert_eq!(map.source_files, vec![PathBuf::from("/proj/a.ts")]);
}

#[test]
fn bom_applies_uniformly_to_every_write() {
    let options = CompilerOptions {
        emit_bom: true,
        source_map: true,
        ..Default::default()
    };
    let program = two_unit_program(options);

    let mut transpiler = Transpiler::with_host(MemoryHost::new());
    transpiler.emit(EmitOptions::new(&program));

    let written = transpiler.host.written();
    assert_eq!(written.len(), 4);
    assert!(written.values().all(|file| file.emit_bom));
}

#[test]
fn relative_unit_paths_resolve_against_host_directory() {
    let program = FakeProgram::new(
        CompilerOptions::default(),
        vec![code_unit("src/main.ts", "x", "1")],
    );

    let mut transpiler = Transpiler::with_host(MemoryHost::with_current_directory("/proj"));
    let result = transpiler.emit(EmitOptions::new(&program));

    assert!(!result.emit_skipped);
    assert_eq!(
        transpiler.host.written_paths(),
        vec![PathBuf::from("/proj/src/main.lua")]
    );
}

#[test]
#[should_panic(expected = "Invalid path")]
fn relative_host_directory_is_a_contract_violation() {
    let program = FakeProgram::new(
        CompilerOptions::default(),
        vec![code_unit("src/main.ts", "x", "1")],
    );

    let mut transpiler = Transpiler::with_host(MemoryHost::with_current_directory("relative"));
    transpiler.emit(EmitOptions::new(&program));
}

#[test]
fn write_failure_is_reported_and_does_not_abort_the_run() {
    let program = two_unit_program(CompilerOptions::default());

    let mut host = MemoryHost::new();
    host.fail_writes_to("/proj/a.lua");
    let mut transpiler = Transpiler::with_host(host);
    let result = transpiler.emit(EmitOptions::new(&program));

    assert!(!result.emit_skipped);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(
        result.diagnostics[0].code,
        diagnostic_codes::COULD_NOT_WRITE_FILE
    );
    assert_eq!(
        transpiler.host.written_paths(),
        vec![PathBuf::from("/proj/b.lua")]
    );
}

#[test]
fn out_dir_and_root_dir_shape_chunk_paths() {
    let options = CompilerOptions {
        root_dir: Some(PathBuf::from("/proj/src")),
        out_dir: Some(PathBuf::from("/proj/dist")),
        ..Default::default()
    };
    let program = FakeProgram::new(options, vec![code_unit("/proj/src/nested/main.ts", "x", "1")]);

    let mut transpiler = Transpiler::with_host(MemoryHost::new());
    transpiler.emit(EmitOptions::new(&program));

    assert_eq!(
        transpiler.host.written_paths(),
        vec![PathBuf::from("/proj/dist/nested/main.lua")]
    );
}
