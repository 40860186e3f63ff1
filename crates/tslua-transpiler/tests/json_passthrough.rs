//! Pass-through data files: project JSON units transform directly, external
//! ones are skipped, declaration-only runs ignore them.

use std::path::PathBuf;

use tslua_common::CompilerOptions;
use tslua_transpiler::testing::{FakeProgram, MemoryHost};
use tslua_transpiler::{
    EmitOptions, SourceNode, SourceUnit, SyntaxKind, Transpiler, UnitFlags,
};

fn json_unit(path: &str, text: &str) -> SourceUnit {
    SourceUnit::new(path, text).with_flags(UnitFlags::JSON_FILE)
}

fn code_unit(path: &str) -> SourceUnit {
    SourceUnit::new(path, "return").with_roots(vec![SourceNode::new(
        SyntaxKind::ReturnStatement,
        "",
    )])
}

#[test]
fn project_json_unit_produces_exactly_one_module() {
    let program = FakeProgram::new(
        CompilerOptions::default(),
        vec![
            code_unit("/proj/main.ts"),
            json_unit("/proj/config.json", r#"{"enabled": true, "retries": 3}"#),
        ],
    );

    let mut transpiler = Transpiler::with_host(MemoryHost::new());
    let result = transpiler.emit(EmitOptions::new(&program));

    assert!(!result.emit_skipped);
    assert!(result.diagnostics.is_empty());
    // The JSON unit bypassed the native pipeline entirely.
    assert_eq!(
        program.transformed_units(),
        vec![PathBuf::from("/proj/main.ts")]
    );
    let written = transpiler.host.written();
    assert_eq!(
        written[&PathBuf::from("/proj/config.lua")].content,
        "return {enabled = true, retries = 3}\n"
    );
}

#[test]
fn external_json_unit_is_skipped_entirely() {
    let program = FakeProgram::new(
        CompilerOptions::default(),
        vec![
            code_unit("/proj/main.ts"),
            json_unit("/proj/node_modules/dep/data.json", "{}"),
        ],
    )
    .with_external_unit("/proj/node_modules/dep/data.json");

    let mut transpiler = Transpiler::with_host(MemoryHost::new());
    let result = transpiler.emit(EmitOptions::new(&program));

    assert!(!result.emit_skipped);
    assert_eq!(
        transpiler.host.written_paths(),
        vec![PathBuf::from("/proj/main.lua")]
    );
}

#[test]
fn declaration_only_run_ignores_json_units() {
    let options = CompilerOptions {
        declaration: true,
        emit_declaration_only: true,
        ..Default::default()
    };
    let program = FakeProgram::new(
        options,
        vec![
            code_unit("/proj/main.ts"),
            json_unit("/proj/config.json", "{}"),
        ],
    );

    let mut transpiler = Transpiler::with_host(MemoryHost::new());
    let result = transpiler.emit(EmitOptions::new(&program));

    // No modules are printed in declaration-only mode, so no chunks result.
    assert!(result.emit_skipped);
    assert!(transpiler.host.written().is_empty());
}

#[test]
fn targeted_json_unit_transforms_directly() {
    let units = vec![
        code_unit("/proj/main.ts"),
        json_unit("/proj/config.json", r#"[1, "two", null]"#),
    ];
    let program = FakeProgram::new(CompilerOptions::default(), units.clone());

    let subset = vec![units[1].clone()];
    let mut transpiler = Transpiler::with_host(MemoryHost::new());
    let result = transpiler.emit(EmitOptions::new(&program).with_source_units(&subset));

    assert!(!result.emit_skipped);
    // Native emit machinery was never involved for the JSON unit.
    assert_eq!(program.emit_invocations(), 0);
    assert_eq!(
        transpiler.host.written()[&PathBuf::from("/proj/config.lua")].content,
        "return {1, \"two\", nil}\n"
    );
}

#[test]
fn malformed_json_is_a_diagnostic() {
    let program = FakeProgram::new(
        CompilerOptions::default(),
        vec![json_unit("/proj/broken.json", "{ nope")],
    );

    let mut transpiler = Transpiler::with_host(MemoryHost::new());
    let result = transpiler.emit(EmitOptions::new(&program));

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(
        result.diagnostics[0].code,
        tslua_common::diagnostic_codes::INVALID_JSON_SOURCE
    );
}
