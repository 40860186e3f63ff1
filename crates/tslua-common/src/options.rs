use serde::Deserialize;
use std::path::PathBuf;

use crate::diagnostics::{Diagnostic, diagnostic_codes};

/// Lua language version the printed output targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum LuaTarget {
    #[serde(rename = "5.1")]
    Lua51,
    #[serde(rename = "5.2")]
    Lua52,
    #[serde(rename = "5.3")]
    Lua53,
    #[serde(rename = "5.4")]
    Lua54,
    #[serde(rename = "JIT")]
    LuaJit,
    #[serde(rename = "universal")]
    #[default]
    Universal,
}

impl LuaTarget {
    /// `unpack` moved into the `table` library in 5.2.
    pub fn unpack_expression(self) -> &'static str {
        match self {
            LuaTarget::Lua51 | LuaTarget::LuaJit => "unpack",
            _ => "table.unpack",
        }
    }
}

/// How required runtime features are materialized into printed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LuaLibImport {
    /// Embed the source of each required feature at the top of the file.
    Inline,
    /// Emit a single `require("lualib_bundle")` preamble.
    #[default]
    Require,
    /// Leave features unresolved; the surrounding environment provides them.
    None,
}

/// Immutable snapshot of program-wide configuration for one run.
///
/// Deserializes from a tsconfig-style camelCase JSON block. The transient
/// no-emit override used while driving the front-end's emit machinery is NOT
/// a field here; it is threaded explicitly through `Program::emit`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    pub no_emit: bool,
    pub no_emit_on_error: bool,
    pub declaration: bool,
    pub composite: bool,
    pub emit_declaration_only: bool,
    pub source_map: bool,
    pub emit_bom: bool,
    pub out_dir: Option<PathBuf>,
    pub root_dir: Option<PathBuf>,
    pub bundle: Option<PathBuf>,
    pub bundle_entry: Option<PathBuf>,
    pub lua_target: LuaTarget,
    pub lua_lib_import: LuaLibImport,
}

/// Checks cross-option consistency. Pure: no side effects, returns zero or
/// more diagnostics for the caller to aggregate.
pub fn validate_options(options: &CompilerOptions) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if options.bundle.is_some() && options.bundle_entry.is_none() {
        diagnostics.push(Diagnostic::global(
            "'bundle' requires 'bundleEntry' to be set",
            diagnostic_codes::BUNDLE_REQUIRES_BUNDLE_ENTRY,
        ));
    }
    if options.bundle_entry.is_some() && options.bundle.is_none() {
        diagnostics.push(Diagnostic::global(
            "'bundleEntry' requires 'bundle' to be set",
            diagnostic_codes::BUNDLE_ENTRY_REQUIRES_BUNDLE,
        ));
    }
    if options.emit_declaration_only && !(options.declaration || options.composite) {
        diagnostics.push(Diagnostic::global(
            "'emitDeclarationOnly' requires 'declaration' or 'composite' to be set",
            diagnostic_codes::DECLARATION_ONLY_REQUIRES_DECLARATION,
        ));
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_valid() {
        assert!(validate_options(&CompilerOptions::default()).is_empty());
    }

    #[test]
    fn test_bundle_requires_entry() {
        let options = CompilerOptions {
            bundle: Some(PathBuf::from("out/bundle.lua")),
            ..Default::default()
        };
        let diagnostics = validate_options(&options);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].code,
            diagnostic_codes::BUNDLE_REQUIRES_BUNDLE_ENTRY
        );
    }

    #[test]
    fn test_bundle_entry_requires_bundle() {
        let options = CompilerOptions {
            bundle_entry: Some(PathBuf::from("src/main.ts")),
            ..Default::default()
        };
        let diagnostics = validate_options(&options);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].code,
            diagnostic_codes::BUNDLE_ENTRY_REQUIRES_BUNDLE
        );
    }

    #[test]
    fn test_declaration_only_requires_declaration() {
        let options = CompilerOptions {
            emit_declaration_only: true,
            ..Default::default()
        };
        let diagnostics = validate_options(&options);
        assert_eq!(diagnostics.len(), 1);

        let options = CompilerOptions {
            emit_declaration_only: true,
            declaration: true,
            ..Default::default()
        };
        assert!(validate_options(&options).is_empty());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let options: CompilerOptions = serde_json::from_str(
            r#"{
                "noEmitOnError": true,
                "sourceMap": true,
                "luaTarget": "5.1",
                "luaLibImport": "inline",
                "outDir": "dist"
            }"#,
        )
        .unwrap();
        assert!(options.no_emit_on_error);
        assert!(options.source_map);
        assert_eq!(options.lua_target, LuaTarget::Lua51);
        assert_eq!(options.lua_lib_import, LuaLibImport::Inline);
        assert_eq!(options.out_dir.as_deref(), Some(std::path::Path::new("dist")));
    }

    #[test]
    fn test_unpack_expression_per_target() {
        assert_eq!(LuaTarget::Lua51.unpack_expression(), "unpack");
        assert_eq!(LuaTarget::LuaJit.unpack_expression(), "unpack");
        assert_eq!(LuaTarget::Lua54.unpack_expression(), "table.unpack");
    }
}
