//! Renders Lua AST trees to source text.
//!
//! The printer tracks generated line/column as it writes so statement
//! origins can be recorded into a source map without a second pass.

use indexmap::IndexSet;
use tracing::debug;
use tslua_common::options::{CompilerOptions, LuaLibImport};
use tslua_common::source_map::{SourceMap, SourceMapBuilder};

use crate::ast::{Block, Expression, Statement, StatementKind, TableField};
use crate::lualib::{LUALIB_BUNDLE_MODULE, LuaLibFeature};

const INDENT: &str = "    ";

const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

pub fn is_valid_identifier(name: &str) -> bool {
    if name.is_empty() || LUA_KEYWORDS.contains(&name) {
        return false;
    }
    let mut bytes = name.bytes();
    let first = bytes.next().expect("checked non-empty");
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return false;
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Printed output for one unit: code plus its source map, when enabled.
#[derive(Debug, Clone)]
pub struct PrintResult {
    pub code: String,
    pub source_map: Option<SourceMap>,
}

pub struct Printer {
    output: String,
    indent: usize,
    line: u32,
    column: u32,
    map: Option<SourceMapBuilder>,
}

impl Printer {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
            line: 0,
            column: 0,
            map: None,
        }
    }

    pub fn enable_source_map(&mut self, output_name: &str, source_name: &str) {
        self.map = Some(SourceMapBuilder::new(output_name, source_name));
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn generate_source_map(&mut self) -> Option<SourceMap> {
        self.map.take().map(SourceMapBuilder::build)
    }

    /// Write a token that contains no newline.
    fn write(&mut self, text: &str) {
        debug_assert!(!text.contains('\n'));
        self.output.push_str(text);
        self.column += text.len() as u32;
    }

    /// Write text that may span lines, keeping position tracking correct.
    fn write_raw(&mut self, text: &str) {
        match memchr::memrchr(b'\n', text.as_bytes()) {
            Some(last) => {
                self.line += memchr::memchr_iter(b'\n', text.as_bytes()).count() as u32;
                self.column = (text.len() - last - 1) as u32;
            }
            None => self.column += text.len() as u32,
        }
        self.output.push_str(text);
    }

    fn new_line(&mut self) {
        self.output.push('\n');
        self.line += 1;
        self.column = 0;
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.write(INDENT);
        }
    }

    fn add_mapping(&mut self, statement: &Statement) {
        if let (Some(map), Some(origin)) = (self.map.as_mut(), statement.origin) {
            map.add_mapping(self.line, self.column, origin.line, origin.column);
        }
    }

    /// Materialize required runtime features at the top of the output.
    pub fn emit_lualib_preamble(
        &mut self,
        features: &IndexSet<LuaLibFeature>,
        options: &CompilerOptions,
    ) {
        if features.is_empty() || options.lua_lib_import == LuaLibImport::None {
            return;
        }
        match options.lua_lib_import {
            LuaLibImport::Require => {
                self.write(&format!(
                    "local ____lualib = require(\"{LUALIB_BUNDLE_MODULE}\")"
                ));
                self.new_line();
                for feature in features {
                    self.write(&format!(
                        "local {name} = ____lualib.{name}",
                        name = feature.name()
                    ));
                    self.new_line();
                }
            }
            LuaLibImport::Inline => {
                for feature in features {
                    self.write_raw(&feature.inline_source(options.lua_target));
                }
            }
            LuaLibImport::None => unreachable!("handled above"),
        }
        self.new_line();
    }

    pub fn emit_block(&mut self, block: &Block) {
        for statement in &block.statements {
            self.emit_statement(statement);
        }
    }

    pub fn emit_statement(&mut self, statement: &Statement) {
        self.write_indent();
        self.add_mapping(statement);
        match &statement.kind {
            StatementKind::Local { names, expressions } => {
                self.write("local ");
                self.write(&names.join(", "));
                if !expressions.is_empty() {
                    self.write(" = ");
                    self.emit_expression_list(expressions);
                }
            }
            StatementKind::Assignment {
                targets,
                expressions,
            } => {
                self.emit_expression_list(targets);
                self.write(" = ");
                self.emit_expression_list(expressions);
            }
            StatementKind::Call(expression) => {
                self.emit_expression(expression);
            }
            StatementKind::Do(block) => {
                self.write("do");
                self.new_line();
                self.indent += 1;
                self.emit_block(block);
                self.indent -= 1;
                self.write_indent();
                self.write("end");
            }
            StatementKind::Return(expressions) => {
                self.write("return");
                if !expressions.is_empty() {
                    self.write(" ");
                    self.emit_expression_list(expressions);
                }
            }
            StatementKind::Comment(text) => {
                self.write("-- ");
                self.write(text);
            }
        }
        self.new_line();
    }

    fn emit_expression_list(&mut self, expressions: &[Expression]) {
        for (i, expression) in expressions.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.emit_expression(expression);
        }
    }

    pub fn emit_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Nil => self.write("nil"),
            Expression::True => self.write("true"),
            Expression::False => self.write("false"),
            Expression::Number(text) => self.write(text),
            Expression::String(value) => self.emit_string_literal(value),
            Expression::Identifier(name) => self.write(name),
            Expression::Table(fields) => self.emit_table(fields),
            Expression::Function { parameters, body } => {
                self.write("function(");
                self.write(&parameters.join(", "));
                self.write(")");
                self.new_line();
                self.indent += 1;
                self.emit_block(body);
                self.indent -= 1;
                self.write_indent();
                self.write("end");
            }
            Expression::Call { callee, arguments } => {
                self.emit_prefix_expression(callee);
                self.write("(");
                self.emit_expression_list(arguments);
                self.write(")");
            }
            Expression::Index { table, key } => {
                self.emit_prefix_expression(table);
                match key.as_ref() {
                    Expression::String(name) if is_valid_identifier(name) => {
                        self.write(".");
                        self.write(name);
                    }
                    _ => {
                        self.write("[");
                        self.emit_expression(key);
                        self.write("]");
                    }
                }
            }
            Expression::Binary {
                left,
                operator,
                right,
            } => {
                self.emit_operand(left);
                self.write(" ");
                self.write(operator);
                self.write(" ");
                self.emit_operand(right);
            }
        }
    }

    /// Lua only allows identifiers, index chains, calls, and parenthesized
    /// expressions before a call or index suffix.
    fn emit_prefix_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Identifier(_) | Expression::Index { .. } | Expression::Call { .. } => {
                self.emit_expression(expression);
            }
            _ => {
                self.write("(");
                self.emit_expression(expression);
                self.write(")");
            }
        }
    }

    /// Nested binaries are parenthesized rather than reasoning about
    /// precedence; the output stays unambiguous.
    fn emit_operand(&mut self, expression: &Expression) {
        match expression {
            Expression::Binary { .. } => {
                self.write("(");
                self.emit_expression(expression);
                self.write(")");
            }
            _ => self.emit_expression(expression),
        }
    }

    fn emit_table(&mut self, fields: &[TableField]) {
        if fields.is_empty() {
            self.write("{}");
            return;
        }
        self.write("{");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            match &field.key {
                None => self.emit_expression(&field.value),
                Some(Expression::String(name)) if is_valid_identifier(name) => {
                    self.write(name);
                    self.write(" = ");
                    self.emit_expression(&field.value);
                }
                Some(key) => {
                    self.write("[");
                    self.emit_expression(key);
                    self.write("] = ");
                    self.emit_expression(&field.value);
                }
            }
        }
        self.write("}");
    }

    fn emit_string_literal(&mut self, value: &str) {
        let mut escaped = String::with_capacity(value.len() + 2);
        escaped.push('"');
        for c in value.chars() {
            match c {
                '"' => escaped.push_str("\\\""),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                c if (c as u32) < 0x20 => escaped.push_str(&format!("\\{}", c as u32)),
                c => escaped.push(c),
            }
        }
        escaped.push('"');
        self.write(&escaped);
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

/// `main.ts` -> `main.lua`, keeping only the file name.
pub fn lua_output_name(source_name: &str) -> String {
    let base = source_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source_name);
    match base.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.lua"),
        None => format!("{base}.lua"),
    }
}

/// The default printer: lualib preamble, then the block, with a source map
/// when the options ask for one.
pub fn print_block(
    block: &Block,
    features: &IndexSet<LuaLibFeature>,
    options: &CompilerOptions,
    source_name: &str,
) -> PrintResult {
    let mut printer = Printer::new();
    if options.source_map {
        printer.enable_source_map(&lua_output_name(source_name), source_name);
    }
    printer.emit_lualib_preamble(features, options);
    printer.emit_block(block);

    let code = printer.take_output();
    let source_map = printer.generate_source_map();
    debug!(
        file = source_name,
        statements = block.statements.len(),
        features = features.len(),
        bytes = code.len(),
        "printed unit"
    );
    PrintResult { code, source_map }
}
