//! ysh-syntax - A parser for the YSH shell language
//!
//! This library turns YSH source text into a syntax tree plus a list of
//! diagnostics. Parsing never fails: malformed statements become error
//! nodes and parsing resumes at the next statement.
//!
//! ```
//! let (program, diagnostics) = ysh_syntax::parse("var x = 1 + 2");
//! assert_eq!(program.statements.len(), 1);
//! assert!(diagnostics.is_empty());
//! ```

pub mod ast;
pub mod parser;

pub use ast::printer::to_source;
pub use ast::types::*;
pub use parser::{
    parse, parse_with_options, Diagnostic, DiagnosticKind, Parser, ParserOptions, Severity,
};
