//! Diagnostic Types
//!
//! Lexical errors, syntax errors and informational notices, plus the
//! `Diagnostic` wrapper that the parser appends to its side list.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::ast::types::{line_column, Span, StringVariant};

/// Errors raised while classifying raw source text into tokens.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum LexError {
    #[error("unterminated {variant} string literal")]
    UnterminatedString {
        variant: StringVariant,
        triple: bool,
        span: Span,
    },

    #[error("unterminated literal list, expected `|`")]
    UnterminatedLiteralList { span: Span },

    #[error("unterminated eggex, expected `/`")]
    UnterminatedEggex { span: Span },

    #[error("unterminated expansion, expected `{expected}`")]
    UnterminatedExpansion { expected: char, span: Span },

    #[error("invalid escape sequence `{sequence}`")]
    InvalidEscape { sequence: String, span: Span },

    #[error("invalid byte escape `{sequence}`")]
    InvalidByteEscape { sequence: String, span: Span },

    #[error("unrecognized input `{text}`")]
    UnrecognizedInput { text: String, span: Span },

    #[error("malformed number literal `{text}`")]
    MalformedNumber { text: String, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            Self::UnterminatedString { span, .. }
            | Self::UnterminatedLiteralList { span }
            | Self::UnterminatedEggex { span }
            | Self::UnterminatedExpansion { span, .. }
            | Self::InvalidEscape { span, .. }
            | Self::InvalidByteEscape { span, .. }
            | Self::UnrecognizedInput { span, .. }
            | Self::MalformedNumber { span, .. } => *span,
        }
    }
}

/// Errors raised by the recursive-descent parser.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum SyntaxError {
    #[error("unexpected {found}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        span: Span,
    },

    #[error("expected an expression, found {found}")]
    ExpectedExpression { found: String, span: Span },

    #[error("expected a statement terminator, found {found}")]
    MissingTerminator { found: String, span: Span },

    #[error("unclosed block, expected `}}`")]
    UnclosedBlock { span: Span },

    #[error("unclosed parenthesis, expected `)`")]
    UnclosedParen { span: Span },

    #[error("unclosed bracket, expected `]`")]
    UnclosedBracket { span: Span },

    #[error("malformed parameter list: {reason}")]
    MalformedParameterList { reason: String, span: Span },

    #[error("bad redirection target for `{operator}`")]
    BadRedirectionTarget { operator: String, span: Span },

    #[error("reserved word `{word}` cannot be used as an identifier")]
    ReservedWordAsIdentifier { word: String, span: Span },

    #[error("block must contain at least one statement")]
    EmptyBlock { span: Span },

    #[error("nesting deeper than {limit} levels")]
    NestingTooDeep { limit: usize, span: Span },

    #[error("input too large: {size} bytes exceeds limit of {limit}")]
    InputTooLarge { size: usize, limit: usize, span: Span },

    #[error("environment binding must be followed by a command")]
    MissingCommand { span: Span },
}

impl SyntaxError {
    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::ExpectedExpression { span, .. }
            | Self::MissingTerminator { span, .. }
            | Self::UnclosedBlock { span }
            | Self::UnclosedParen { span }
            | Self::UnclosedBracket { span }
            | Self::MalformedParameterList { span, .. }
            | Self::BadRedirectionTarget { span, .. }
            | Self::ReservedWordAsIdentifier { span, .. }
            | Self::EmptyBlock { span }
            | Self::NestingTooDeep { span, .. }
            | Self::InputTooLarge { span, .. }
            | Self::MissingCommand { span } => *span,
        }
    }
}

/// Non-fatal notices about constructs that are accepted but easy to misread.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum DiagnosticError {
    #[error("call-style arguments directly after a command call")]
    AmbiguousCallArguments { span: Span },
}

impl DiagnosticError {
    pub fn span(&self) -> Span {
        match self {
            Self::AmbiguousCallArguments { span } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DiagnosticKind {
    Lex(LexError),
    Syntax(SyntaxError),
    Notice(DiagnosticError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub span: Span,
}

impl Diagnostic {
    pub fn message(&self) -> String {
        match &self.kind {
            DiagnosticKind::Lex(e) => e.to_string(),
            DiagnosticKind::Syntax(e) => e.to_string(),
            DiagnosticKind::Notice(e) => e.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// `line:column: severity: message`, positions taken from `source`.
    pub fn render(&self, source: &str) -> String {
        let (line, column) = line_column(source, self.span.start);
        format!("{}:{}: {}: {}", line, column, self.severity, self.message())
    }
}

impl From<LexError> for Diagnostic {
    fn from(error: LexError) -> Self {
        Self {
            severity: Severity::Error,
            span: error.span(),
            kind: DiagnosticKind::Lex(error),
        }
    }
}

impl From<SyntaxError> for Diagnostic {
    fn from(error: SyntaxError) -> Self {
        Self {
            severity: Severity::Error,
            span: error.span(),
            kind: DiagnosticKind::Syntax(error),
        }
    }
}

impl From<DiagnosticError> for Diagnostic {
    fn from(notice: DiagnosticError) -> Self {
        Self {
            severity: Severity::Info,
            span: notice.span(),
            kind: DiagnosticKind::Notice(notice),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_becomes_error_diagnostic() {
        let diagnostic: Diagnostic = SyntaxError::ReservedWordAsIdentifier {
            word: "if".to_string(),
            span: Span::new(4, 6),
        }
        .into();
        assert!(diagnostic.is_error());
        assert_eq!(diagnostic.span, Span::new(4, 6));
        assert_eq!(
            diagnostic.message(),
            "reserved word `if` cannot be used as an identifier"
        );
    }

    #[test]
    fn test_notice_is_info() {
        let diagnostic: Diagnostic = DiagnosticError::AmbiguousCallArguments {
            span: Span::new(0, 3),
        }
        .into();
        assert_eq!(diagnostic.severity, Severity::Info);
        assert!(!diagnostic.is_error());
    }

    #[test]
    fn test_render_uses_line_and_column() {
        let source = "echo hi\nvar = 1";
        let diagnostic: Diagnostic = SyntaxError::UnclosedBlock {
            span: Span::new(8, 9),
        }
        .into();
        assert_eq!(
            diagnostic.render(source),
            "2:1: error: unclosed block, expected `}`"
        );
    }

    #[test]
    fn test_unterminated_string_message_names_variant() {
        let error = LexError::UnterminatedString {
            variant: StringVariant::Raw,
            triple: false,
            span: Span::new(0, 5),
        };
        assert_eq!(error.to_string(), "unterminated raw string literal");
    }
}
