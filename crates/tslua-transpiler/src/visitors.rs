//! Built-in visitor rules.
//!
//! The full per-construct rule set of a production transpiler lives behind
//! the visitor-map seam; these rules cover the statement forms the driver
//! itself must route, and serve as the base plugins extend. Plugin rules for
//! the same kind run after these.

use std::sync::Arc;

use tslua_emitter::ast::{Expression, Statement, StatementKind};

use crate::plugins::VisitorMap;
use crate::program::{SourceNode, SyntaxKind};
use crate::transform::TransformContext;

pub fn standard_visitors() -> VisitorMap {
    let mut map = VisitorMap::new();
    map.add(SyntaxKind::VariableStatement, Arc::new(visit_variable_statement));
    map.add(
        SyntaxKind::FunctionDeclaration,
        Arc::new(visit_function_declaration),
    );
    map.add(
        SyntaxKind::ExpressionStatement,
        Arc::new(visit_expression_statement),
    );
    map.add(SyntaxKind::ReturnStatement, Arc::new(visit_return_statement));
    map
}

/// `let x = init` -> `local x = init`
fn visit_variable_statement(
    node: &SourceNode,
    context: &mut TransformContext<'_>,
) -> Vec<Statement> {
    let mut children = node.children.iter();
    let Some(name) = children.next().filter(|child| child.kind == SyntaxKind::Identifier) else {
        return unsupported(node, context);
    };
    let expressions = children
        .map(|initializer| context.transform_expression(initializer))
        .collect();
    vec![Statement::with_origin(
        StatementKind::Local {
            names: vec![name.text.clone()],
            expressions,
        },
        node.pos,
    )]
}

/// `function f(a, b) { body }` -> `local f = function(a, b) ... end`
fn visit_function_declaration(
    node: &SourceNode,
    context: &mut TransformContext<'_>,
) -> Vec<Statement> {
    if node.text.is_empty() {
        return unsupported(node, context);
    }
    let parameters: Vec<String> = node
        .children
        .iter()
        .filter(|child| child.kind == SyntaxKind::Identifier)
        .map(|child| child.text.clone())
        .collect();
    let mut body = Vec::new();
    for child in &node.children {
        if child.kind != SyntaxKind::Identifier {
            body.extend(context.transform_statement(child));
        }
    }
    vec![Statement::with_origin(
        StatementKind::Local {
            names: vec![node.text.clone()],
            expressions: vec![Expression::Function {
                parameters,
                body: tslua_emitter::ast::Block::new(body),
            }],
        },
        node.pos,
    )]
}

/// Calls stay statements; any other expression is bound to a throwaway
/// local, since Lua has no bare expression statements.
fn visit_expression_statement(
    node: &SourceNode,
    context: &mut TransformContext<'_>,
) -> Vec<Statement> {
    let Some(inner) = node.children.first() else {
        return unsupported(node, context);
    };
    let expression = context.transform_expression(inner);
    let kind = if expression.is_call() {
        StatementKind::Call(expression)
    } else {
        StatementKind::Local {
            names: vec!["____".to_string()],
            expressions: vec![expression],
        }
    };
    vec![Statement::with_origin(kind, node.pos)]
}

fn visit_return_statement(node: &SourceNode, context: &mut TransformContext<'_>) -> Vec<Statement> {
    let expressions = node
        .children
        .iter()
        .map(|child| context.transform_expression(child))
        .collect();
    vec![Statement::with_origin(
        StatementKind::Return(expressions),
        node.pos,
    )]
}

fn unsupported(node: &SourceNode, context: &mut TransformContext<'_>) -> Vec<Statement> {
    context.report(tslua_common::Diagnostic::error(
        context.file_name().to_string(),
        node.start,
        node.length,
        format!("malformed {:?} node", node.kind),
        tslua_common::diagnostic_codes::UNSUPPORTED_SYNTAX_KIND,
    ));
    Vec::new()
}
