//! Per-unit transformation into the Lua AST.
//!
//! Statement-position nodes dispatch through the composed visitor map;
//! expression lowering is built in. Diagnostics and required runtime
//! features accumulate on the context and travel out in the
//! [`TransformResult`] — they are collected even when the run will never
//! print, so check-only runs see the same diagnostics as emitting runs.

use indexmap::IndexSet;
use tracing::debug;

use tslua_common::{CompilerOptions, Diagnostic, diagnostic_codes};
use tslua_emitter::ast::{Block, Expression, Statement, StatementKind, TableField};
use tslua_emitter::lualib::LuaLibFeature;

use crate::plugins::VisitorMap;
use crate::program::{SourceNode, SourceUnit, SyntaxKind};

/// Output of transforming one source unit.
#[derive(Clone)]
pub struct TransformResult {
    pub lua_ast: Block,
    pub lua_lib_features: IndexSet<LuaLibFeature>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Shared state for one unit's transformation, handed to visitor rules.
pub struct TransformContext<'a> {
    options: &'a CompilerOptions,
    visitor_map: &'a VisitorMap,
    file_name: String,
    diagnostics: Vec<Diagnostic>,
    features: IndexSet<LuaLibFeature>,
}

impl<'a> TransformContext<'a> {
    fn new(unit: &SourceUnit, visitor_map: &'a VisitorMap, options: &'a CompilerOptions) -> Self {
        Self {
            options,
            visitor_map,
            file_name: unit.file_name_str(),
            diagnostics: Vec::new(),
            features: IndexSet::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        self.options
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Record that the printed output depends on a runtime feature.
    pub fn use_feature(&mut self, feature: LuaLibFeature) {
        self.features.insert(feature);
    }

    /// Dispatch a statement-position node through the visitor map. Every
    /// registered rule for the kind runs, in registration order.
    pub fn transform_statement(&mut self, node: &SourceNode) -> Vec<Statement> {
        let rules: Vec<_> = self.visitor_map.rules(node.kind).to_vec();
        if rules.is_empty() {
            self.report_unsupported(node);
            return Vec::new();
        }
        let mut statements = Vec::new();
        for rule in rules {
            statements.extend(rule(node, self));
        }
        statements
    }

    /// Built-in expression lowering.
    pub fn transform_expression(&mut self, node: &SourceNode) -> Expression {
        match node.kind {
            SyntaxKind::Identifier => Expression::Identifier(node.text.clone()),
            SyntaxKind::NumericLiteral => Expression::Number(node.text.clone()),
            SyntaxKind::StringLiteral => Expression::String(node.text.clone()),
            SyntaxKind::TrueKeyword => Expression::True,
            SyntaxKind::FalseKeyword => Expression::False,
            SyntaxKind::NullKeyword => Expression::Nil,
            SyntaxKind::CallExpression => self.transform_call(node),
            SyntaxKind::BinaryExpression => self.transform_binary(node),
            SyntaxKind::PropertyAccessExpression => self.transform_property_access(node),
            SyntaxKind::ArrayLiteralExpression => self.transform_array_literal(node),
            SyntaxKind::SpreadElement => self.transform_spread(node),
            _ => {
                self.report_unsupported(node);
                Expression::Nil
            }
        }
    }

    fn transform_call(&mut self, node: &SourceNode) -> Expression {
        let Some((callee, arguments)) = node.children.split_first() else {
            self.report_unsupported(node);
            return Expression::Nil;
        };
        let callee = self.transform_expression(callee);
        let arguments = arguments
            .iter()
            .map(|argument| self.transform_expression(argument))
            .collect();
        Expression::Call {
            callee: Box::new(callee),
            arguments,
        }
    }

    fn transform_binary(&mut self, node: &SourceNode) -> Expression {
        if node.children.len() != 2 {
            self.report_unsupported(node);
            return Expression::Nil;
        }
        let left = self.transform_expression(&node.children[0]);
        let right = self.transform_expression(&node.children[1]);
        Expression::Binary {
            left: Box::new(left),
            operator: node.text.clone(),
            right: Box::new(right),
        }
    }

    fn transform_property_access(&mut self, node: &SourceNode) -> Expression {
        let Some(object) = node.children.first() else {
            self.report_unsupported(node);
            return Expression::Nil;
        };
        let table = self.transform_expression(object);
        Expression::Index {
            table: Box::new(table),
            key: Box::new(Expression::String(node.text.clone())),
        }
    }

    /// Array literals without spread lower to a plain table constructor;
    /// with spread, to `__TS__ArrayConcat` over segment tables.
    fn transform_array_literal(&mut self, node: &SourceNode) -> Expression {
        let has_spread = node
            .children
            .iter()
            .any(|child| child.kind == SyntaxKind::SpreadElement);
        if !has_spread {
            let fields = node
                .children
                .iter()
                .map(|child| TableField::positional(self.transform_expression(child)))
                .collect();
            return Expression::Table(fields);
        }

        self.use_feature(LuaLibFeature::ArrayConcat);
        let mut segments: Vec<Expression> = Vec::new();
        let mut run: Vec<TableField> = Vec::new();
        for child in &node.children {
            if child.kind == SyntaxKind::SpreadElement {
                if !run.is_empty() {
                    segments.push(Expression::Table(std::mem::take(&mut run)));
                }
                if let Some(inner) = child.children.first() {
                    let expression = self.transform_expression(inner);
                    segments.push(expression);
                } else {
                    self.report_unsupported(child);
                }
            } else {
                let expression = self.transform_expression(child);
                run.push(TableField::positional(expression));
            }
        }
        if !run.is_empty() {
            segments.push(Expression::Table(run));
        }
        Expression::call(
            Expression::identifier(LuaLibFeature::ArrayConcat.name()),
            vec![Expression::Table(
                segments.into_iter().map(TableField::positional).collect(),
            )],
        )
    }

    /// A spread outside an array literal (e.g. in call arguments) expands
    /// through `__TS__Unpack`; multi-value expansion is only complete in
    /// tail position, as in Lua itself.
    fn transform_spread(&mut self, node: &SourceNode) -> Expression {
        let Some(inner) = node.children.first() else {
            self.report_unsupported(node);
            return Expression::Nil;
        };
        self.use_feature(LuaLibFeature::Unpack);
        let inner = self.transform_expression(inner);
        Expression::call(
            Expression::identifier(LuaLibFeature::Unpack.name()),
            vec![inner],
        )
    }

    fn report_unsupported(&mut self, node: &SourceNode) {
        let file = self.file_name.clone();
        self.report(Diagnostic::error(
            file,
            node.start,
            node.length,
            format!("unsupported syntax kind {:?}", node.kind),
            diagnostic_codes::UNSUPPORTED_SYNTAX_KIND,
        ));
    }

    fn finish(self, lua_ast: Block) -> TransformResult {
        TransformResult {
            lua_ast,
            lua_lib_features: self.features,
            diagnostics: self.diagnostics,
        }
    }
}

/// Transform one unit into a Lua AST plus its required runtime features.
pub fn transform_source_unit(
    unit: &SourceUnit,
    visitor_map: &VisitorMap,
    options: &CompilerOptions,
) -> TransformResult {
    debug!(file = %unit.file_name.display(), json = unit.is_json(), "transforming unit");
    let mut context = TransformContext::new(unit, visitor_map, options);

    if unit.is_json() {
        let lua_ast = transform_json_unit(unit, &mut context);
        return context.finish(lua_ast);
    }

    let mut statements = Vec::new();
    for root in &unit.roots {
        let mut lowered = context.transform_statement(root);
        for statement in &mut lowered {
            if statement.origin.is_none() {
                statement.origin = Some(root.pos);
            }
        }
        statements.extend(lowered);
    }
    context.finish(Block::new(statements))
}

/// Pass-through lowering for structured-data units: the module evaluates to
/// the parsed value.
fn transform_json_unit(unit: &SourceUnit, context: &mut TransformContext<'_>) -> Block {
    match serde_json::from_str::<serde_json::Value>(&unit.text) {
        Ok(value) => {
            let expression = json_value_to_expression(&value);
            Block::new(vec![Statement::new(StatementKind::Return(vec![
                expression,
            ]))])
        }
        Err(error) => {
            context.report(Diagnostic::error(
                unit.file_name_str(),
                0,
                unit.text.len() as u32,
                format!("invalid JSON source: {error}"),
                diagnostic_codes::INVALID_JSON_SOURCE,
            ));
            Block::default()
        }
    }
}

fn json_value_to_expression(value: &serde_json::Value) -> Expression {
    use serde_json::Value;
    match value {
        Value::Null => Expression::Nil,
        Value::Bool(true) => Expression::True,
        Value::Bool(false) => Expression::False,
        Value::Number(number) => Expression::Number(number.to_string()),
        Value::String(text) => Expression::String(text.clone()),
        Value::Array(items) => Expression::Table(
            items
                .iter()
                .map(|item| TableField::positional(json_value_to_expression(item)))
                .collect(),
        ),
        Value::Object(entries) => Expression::Table(
            entries
                .iter()
                .map(|(key, item)| {
                    TableField::keyed(
                        Expression::String(key.clone()),
                        json_value_to_expression(item),
                    )
                })
                .collect(),
        ),
    }
}
