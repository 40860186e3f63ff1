//! Grouping printed modules into output chunks.
//!
//! The chunking policy is a collaborator of the session: the driver ships a
//! one-chunk-per-module policy and a bundling policy, and callers may inject
//! their own. Whatever the policy, every chunk keeps the stable mapping back
//! to its constituent source files — downstream tooling (watchers,
//! incremental builds) depends on it.

use std::path::{Path, PathBuf};

use tslua_common::CompilerOptions;
use tslua_common::source_map::{IndexSourceMap, SourceMap, count_lines};
use tslua_emitter::ast::Block;

/// One unit's printed output, before chunk assembly.
#[derive(Clone)]
pub struct Module {
    /// The source units this module was printed from.
    pub source_files: Vec<PathBuf>,
    /// Absolute path identifying the module.
    pub file_name: PathBuf,
    pub lua_ast: Block,
    pub code: String,
    pub source_map: Option<SourceMap>,
}

/// One final output artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub output_path: PathBuf,
    pub code: String,
    /// Serialized source map JSON, when one applies.
    pub source_map: Option<String>,
    /// The source units that produced this chunk.
    pub source_files: Vec<PathBuf>,
}

pub trait ChunkingPolicy {
    fn assemble(&self, modules: &[Module], options: &CompilerOptions) -> Vec<Chunk>;
}

/// `src/a.ts` -> `<outDir>/a.lua`, honoring `rootDir` the way the
/// front-end's own emit-path computation does.
pub fn lua_output_path(file_name: &Path, options: &CompilerOptions) -> PathBuf {
    let mut output = match &options.out_dir {
        Some(out_dir) => {
            let relative = match &options.root_dir {
                Some(root_dir) => file_name.strip_prefix(root_dir).unwrap_or(file_name),
                None => file_name,
            };
            // Joining an absolute path would discard out_dir; keep the
            // file name in that case.
            let relative = if relative.is_absolute() {
                relative.file_name().map(Path::new).unwrap_or(relative)
            } else {
                relative
            };
            out_dir.join(relative)
        }
        None => file_name.to_path_buf(),
    };
    output.set_extension("lua");
    output
}

fn module_name(file_name: &Path) -> String {
    file_name
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string_lossy().into_owned())
}

/// The default policy: every module becomes its own chunk.
pub struct PerModule;

impl ChunkingPolicy for PerModule {
    fn assemble(&self, modules: &[Module], options: &CompilerOptions) -> Vec<Chunk> {
        modules
            .iter()
            .map(|module| Chunk {
                output_path: lua_output_path(&module.file_name, options),
                code: module.code.clone(),
                source_map: module.source_map.as_ref().map(SourceMap::to_json),
                source_files: module.source_files.clone(),
            })
            .collect()
    }
}

/// Concatenates every module into a single `package.preload` bundle with the
/// configured entry, producing one chunk whose source map is a Source Map v3
/// index map over the per-module maps.
pub struct Bundle;

impl ChunkingPolicy for Bundle {
    fn assemble(&self, modules: &[Module], options: &CompilerOptions) -> Vec<Chunk> {
        if modules.is_empty() {
            return Vec::new();
        }
        let output_path = options
            .bundle
            .clone()
            .unwrap_or_else(|| PathBuf::from("bundle.lua"));
        let bundle_name = output_path.to_string_lossy().into_owned();

        let mut code = String::new();
        let mut index_map = IndexSourceMap::new(&bundle_name);
        let mut line = 0u32;
        let mut source_files = Vec::new();

        for module in modules {
            let name = module_name(&module.file_name);
            code.push_str(&format!("package.preload[\"{name}\"] = function(...)\n"));
            line += 1;

            if let Some(map) = &module.source_map {
                index_map.add_section(line, map.clone());
            }
            code.push_str(&module.code);
            line += count_lines(&module.code);
            if !module.code.is_empty() && !module.code.ends_with('\n') {
                code.push('\n');
                line += 1;
            }

            code.push_str("end\n");
            line += 1;

            source_files.extend(module.source_files.iter().cloned());
        }

        let entry = options
            .bundle_entry
            .as_deref()
            .map(module_name)
            .unwrap_or_else(|| module_name(&modules[0].file_name));
        code.push_str(&format!("return require(\"{entry}\")\n"));

        let source_map = options.source_map.then(|| index_map.to_json());
        vec![Chunk {
            output_path,
            code,
            source_map,
            source_files,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(file_name: &str, code: &str) -> Module {
        Module {
            source_files: vec![PathBuf::from(file_name)],
            file_name: PathBuf::from(file_name),
            lua_ast: Block::default(),
            code: code.to_string(),
            source_map: None,
        }
    }

    #[test]
    fn test_lua_output_path_in_place() {
        let options = CompilerOptions::default();
        assert_eq!(
            lua_output_path(Path::new("/proj/src/main.ts"), &options),
            PathBuf::from("/proj/src/main.lua")
        );
    }

    #[test]
    fn test_lua_output_path_with_out_and_root_dir() {
        let options = CompilerOptions {
            root_dir: Some(PathBuf::from("/proj/src")),
            out_dir: Some(PathBuf::from("/proj/dist")),
            ..Default::default()
        };
        assert_eq!(
            lua_output_path(Path::new("/proj/src/sub/main.ts"), &options),
            PathBuf::from("/proj/dist/sub/main.lua")
        );
    }

    #[test]
    fn test_lua_output_path_absolute_outside_root() {
        let options = CompilerOptions {
            root_dir: Some(PathBuf::from("/proj/src")),
            out_dir: Some(PathBuf::from("/proj/dist")),
            ..Default::default()
        };
        assert_eq!(
            lua_output_path(Path::new("/elsewhere/x.ts"), &options),
            PathBuf::from("/proj/dist/x.lua")
        );
    }

    #[test]
    fn test_per_module_policy() {
        let options = CompilerOptions::default();
        let chunks = PerModule.assemble(
            &[module("/p/a.ts", "return 1\n"), module("/p/b.ts", "return 2\n")],
            &options,
        );
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].output_path, PathBuf::from("/p/a.lua"));
        assert_eq!(chunks[0].source_files, vec![PathBuf::from("/p/a.ts")]);
        assert_eq!(chunks[1].code, "return 2\n");
    }

    #[test]
    fn test_bundle_policy_single_chunk() {
        let options = CompilerOptions {
            bundle: Some(PathBuf::from("out/bundle.lua")),
            bundle_entry: Some(PathBuf::from("/p/a.ts")),
            ..Default::default()
        };
        let chunks = Bundle.assemble(
            &[module("/p/a.ts", "return 1\n"), module("/p/b.ts", "return 2\n")],
            &options,
        );
        assert_eq!(chunks.len(), 1);
        let chunk = &chunks[0];
        assert_eq!(chunk.output_path, PathBuf::from("out/bundle.lua"));
        assert!(chunk.code.contains("package.preload[\"a\"] = function(...)"));
        assert!(chunk.code.contains("package.preload[\"b\"] = function(...)"));
        assert!(chunk.code.ends_with("return require(\"a\")\n"));
        assert_eq!(
            chunk.source_files,
            vec![PathBuf::from("/p/a.ts"), PathBuf::from("/p/b.ts")]
        );
    }

    #[test]
    fn test_bundle_section_offsets() {
        let mut first = module("/p/a.ts", "return 1\n");
        first.source_map = Some(
            tslua_common::source_map::SourceMapBuilder::new("a.lua", "/p/a.ts").build(),
        );
        let mut second = module("/p/b.ts", "return 2\n");
        second.source_map = Some(
            tslua_common::source_map::SourceMapBuilder::new("b.lua", "/p/b.ts").build(),
        );
        let options = CompilerOptions {
            bundle: Some(PathBuf::from("bundle.lua")),
            bundle_entry: Some(PathBuf::from("/p/a.ts")),
            source_map: true,
            ..Default::default()
        };
        let chunks = Bundle.assemble(&[first, second], &options);
        let map = chunks[0].source_map.as_ref().expect("bundle map");
        let parsed: serde_json::Value = serde_json::from_str(map).unwrap();
        let sections = parsed["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 2);
        // First module body starts after its preload header line; the second
        // after header + body + end + header.
        assert_eq!(sections[0]["offset"]["line"], 1);
        assert_eq!(sections[1]["offset"]["line"], 4);
    }

    #[test]
    fn test_bundle_empty_input() {
        let options = CompilerOptions::default();
        assert!(Bundle.assemble(&[], &options).is_empty());
    }
}
