//! Parser module for YSH scripts
//!
//! This module contains the two-mode lexer, the string and expansion
//! sub-lexer and the recursive-descent parser built on top of them.

pub mod types;
pub mod errors;
pub mod lexer;
pub mod string_lexer;
pub mod expression_parser;
pub mod word_parser;
pub mod expansion_parser;
pub mod compound_parser;
pub mod definition_parser;
pub mod command_parser;
pub mod parser;

// Re-exports
pub use errors::{Diagnostic, DiagnosticError, DiagnosticKind, LexError, Severity, SyntaxError};
pub use lexer::{LexMode, Lexer, Token, TokenType};
pub use parser::{parse, parse_with_options, Parser};
pub use types::ParserOptions;
