//! Abstract Syntax Tree (AST) for YSH
//!
//! `types` holds the closed set of node types produced by the parser;
//! `printer` turns a tree back into canonical source.
//!
//! Architecture:
//!   Input → Lexer → Parser → AST → Printer / JSON

pub mod printer;
pub mod types;
