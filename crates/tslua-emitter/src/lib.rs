//! Lua AST and printer for the tslua transpiler.
//!
//! Transformation produces trees of [`ast`] nodes; the [`printer`] renders
//! them to Lua source text with optional source maps. Runtime support code
//! required by transformed output is tracked as [`lualib`] features and
//! materialized by the printer according to the configured import mode.

pub mod ast;
pub use ast::{Block, Expression, Statement, StatementKind, TableField};

pub mod lualib;
pub use lualib::LuaLibFeature;

pub mod printer;
pub use printer::{PrintResult, Printer, is_valid_identifier, lua_output_name, print_block};
