//! Plugin resolution and composition.
//!
//! A plugin is a capability-tagged record: it may contribute visitor rules,
//! a pre-print hook, a terminal printer, or any combination. Plugins compose
//! left-to-right in configuration order with documented precedence:
//!
//! - visitor rules for one syntax kind run in registration order, built-in
//!   rules first;
//! - every pre-print hook runs, in registration order;
//! - the terminal printer is last-registered-wins, falling back to the
//!   default Lua printer.
//!
//! A plugin that fails to resolve is a diagnostic, never a crash; the run
//! continues with the remaining plugins.

use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

use tslua_common::{CompilerOptions, Diagnostic, diagnostic_codes};
use tslua_emitter::ast::{Block, Statement, StatementKind};
use tslua_emitter::lualib::LuaLibFeature;
use tslua_emitter::printer::{PrintResult, print_block};

use crate::program::{Program, SourceNode, SyntaxKind};
use crate::transform::TransformContext;

/// One visit rule: lowers a statement-position source node into Lua
/// statements, reporting diagnostics and runtime features via the context.
pub type VisitorFn = dyn Fn(&SourceNode, &mut TransformContext<'_>) -> Vec<Statement> + Send + Sync;

/// Mutates the unit's printed inputs before the terminal printer runs.
pub type PrePrintHook = dyn Fn(&mut Block, &mut IndexSet<LuaLibFeature>) + Send + Sync;

/// Terminal print step for one unit.
pub type PrintFn = dyn Fn(&PrintRequest<'_>) -> PrintResult + Send + Sync;

/// Everything a printer implementation may consult.
pub struct PrintRequest<'a> {
    pub program: &'a dyn Program,
    pub options: &'a CompilerOptions,
    pub file_name: &'a str,
    pub ast: &'a Block,
    pub features: &'a IndexSet<LuaLibFeature>,
}

/// Syntax-kind-indexed table of visit rules, in invocation order.
#[derive(Clone, Default)]
pub struct VisitorMap {
    rules: FxHashMap<SyntaxKind, Vec<Arc<VisitorFn>>>,
}

impl VisitorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: SyntaxKind, rule: Arc<VisitorFn>) {
        self.rules.entry(kind).or_default().push(rule);
    }

    pub fn rules(&self, kind: SyntaxKind) -> &[Arc<VisitorFn>] {
        self.rules.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_rules(&self, kind: SyntaxKind) -> bool {
        !self.rules(kind).is_empty()
    }

    /// Append every rule of `other` after the rules already registered for
    /// the same kind.
    pub fn extend_from(&mut self, other: &VisitorMap) {
        for (kind, rules) in &other.rules {
            self.rules
                .entry(*kind)
                .or_default()
                .extend(rules.iter().cloned());
        }
    }
}

/// A resolved plugin. All capabilities are optional.
#[derive(Clone, Default)]
pub struct Plugin {
    pub name: String,
    pub visitors: Option<VisitorMap>,
    pub before_print: Option<Arc<PrePrintHook>>,
    pub printer: Option<Arc<PrintFn>>,
}

impl Plugin {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_visitors(mut self, visitors: VisitorMap) -> Self {
        self.visitors = Some(visitors);
        self
    }

    pub fn with_before_print(mut self, hook: Arc<PrePrintHook>) -> Self {
        self.before_print = Some(hook);
        self
    }

    pub fn with_printer(mut self, printer: Arc<PrintFn>) -> Self {
        self.printer = Some(printer);
        self
    }

    fn contributes_nothing(&self) -> bool {
        self.visitors.is_none() && self.before_print.is_none() && self.printer.is_none()
    }
}

/// How the caller supplies a plugin: an in-process value, or the name of a
/// bundled optional plugin.
pub enum PluginSpec {
    Inline(Plugin),
    Named(String),
}

/// The bundled optional plugins resolvable by name.
fn bundled_plugin(name: &str) -> Option<Plugin> {
    match name {
        "banner" => Some(Plugin::named("banner").with_before_print(Arc::new(
            |block: &mut Block, _features: &mut IndexSet<LuaLibFeature>| {
                block.statements.insert(
                    0,
                    Statement::new(StatementKind::Comment("generated by tslua".to_string())),
                );
            },
        ))),
        _ => None,
    }
}

/// Resolve the configured plugin set. Resolution failures append to
/// `diagnostics` and drop the entry; the remaining plugins stay active.
pub fn resolve_plugins(
    diagnostics: &mut Vec<Diagnostic>,
    specs: Vec<PluginSpec>,
) -> Vec<Plugin> {
    let mut plugins = Vec::with_capacity(specs.len());
    for spec in specs {
        let plugin = match spec {
            PluginSpec::Inline(plugin) => plugin,
            PluginSpec::Named(name) => match bundled_plugin(&name) {
                Some(plugin) => plugin,
                None => {
                    diagnostics.push(Diagnostic::global(
                        format!("could not resolve plugin '{name}'"),
                        diagnostic_codes::COULD_NOT_RESOLVE_PLUGIN,
                    ));
                    continue;
                }
            },
        };
        if plugin.contributes_nothing() {
            diagnostics.push(Diagnostic::warning(
                "",
                0,
                0,
                format!(
                    "plugin '{}' contributes neither visitors nor printer behavior",
                    plugin.name
                ),
                diagnostic_codes::PLUGIN_CONTRIBUTES_NOTHING,
            ));
        }
        plugins.push(plugin);
    }
    debug!(count = plugins.len(), "resolved plugins");
    plugins
}

/// Merge the built-in visitor rules with every plugin contribution, in
/// registration order.
pub fn create_visitor_map(plugins: &[Plugin]) -> VisitorMap {
    let mut map = crate::visitors::standard_visitors();
    for plugin in plugins {
        if let Some(visitors) = &plugin.visitors {
            map.extend_from(visitors);
        }
    }
    map
}

/// The composed printer for a run: the pre-print hook chain plus the
/// terminal print step.
pub struct ComposedPrinter {
    hooks: Vec<Arc<PrePrintHook>>,
    terminal: Option<Arc<PrintFn>>,
}

impl ComposedPrinter {
    pub fn print(
        &self,
        program: &dyn Program,
        options: &CompilerOptions,
        file_name: &str,
        ast: &mut Block,
        features: &mut IndexSet<LuaLibFeature>,
    ) -> PrintResult {
        for hook in &self.hooks {
            hook(ast, features);
        }
        match &self.terminal {
            Some(printer) => printer(&PrintRequest {
                program,
                options,
                file_name,
                ast,
                features,
            }),
            None => print_block(ast, features, options, file_name),
        }
    }
}

/// Compose the printers of the resolved plugin list. Every `before_print`
/// hook participates; the last registered `printer` wins the terminal step.
pub fn create_printer(plugins: &[Plugin]) -> ComposedPrinter {
    let hooks = plugins
        .iter()
        .filter_map(|plugin| plugin.before_print.clone())
        .collect();
    let terminal = plugins
        .iter()
        .rev()
        .find_map(|plugin| plugin.printer.clone());
    ComposedPrinter { hooks, terminal }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_named_plugin_is_a_diagnostic() {
        let mut diagnostics = Vec::new();
        let plugins = resolve_plugins(
            &mut diagnostics,
            vec![
                PluginSpec::Named("does-not-exist".to_string()),
                PluginSpec::Named("banner".to_string()),
            ],
        );
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].name, "banner");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].code,
            diagnostic_codes::COULD_NOT_RESOLVE_PLUGIN
        );
    }

    #[test]
    fn test_empty_plugin_warns_but_stays() {
        let mut diagnostics = Vec::new();
        let plugins = resolve_plugins(
            &mut diagnostics,
            vec![PluginSpec::Inline(Plugin::named("noop"))],
        );
        assert_eq!(plugins.len(), 1);
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics[0].is_error());
    }

    #[test]
    fn test_visitor_map_rule_order() {
        let mut map = VisitorMap::new();
        map.add(SyntaxKind::ReturnStatement, Arc::new(|_, _| Vec::new()));
        assert_eq!(map.rules(SyntaxKind::ReturnStatement).len(), 1);
        let mut second = VisitorMap::new();
        second.add(SyntaxKind::ReturnStatement, Arc::new(|_, _| Vec::new()));
        map.extend_from(&second);
        assert_eq!(map.rules(SyntaxKind::ReturnStatement).len(), 2);
        assert!(!map.has_rules(SyntaxKind::Unknown));
    }

    #[test]
    fn test_terminal_printer_is_last_registered() {
        let first = Plugin::named("a").with_printer(Arc::new(|_| PrintResult {
            code: "-- a\n".to_string(),
            source_map: None,
        }));
        let second = Plugin::named("b").with_printer(Arc::new(|_| PrintResult {
            code: "-- b\n".to_string(),
            source_map: None,
        }));
        let composed = create_printer(&[first, second]);
        assert!(composed.terminal.is_some());
        // Terminal step comes from "b"; exercised end to end in the
        // plugin_precedence integration tests.
        let printer = composed.terminal.as_ref().unwrap();
        let block = Block::default();
        let features = IndexSet::new();
        let options = CompilerOptions::default();
        let program = crate::testing::FakeProgram::new(options.clone(), Vec::new());
        let result = printer(&PrintRequest {
            program: &program,
            options: &options,
            file_name: "t.ts",
            ast: &block,
            features: &features,
        });
        assert_eq!(result.code, "-- b\n");
    }
}
