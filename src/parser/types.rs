//! Parser Types and Constants
//!
//! Shared limits, options, and classification tables used across parser
//! modules. All tables are read-only after initialization.

use std::collections::HashSet;

use crate::ast::types::{BinaryOperator, RedirectionOperator};
use crate::parser::lexer::TokenType;

// Parser limits to prevent hangs and resource exhaustion
pub const MAX_INPUT_SIZE: usize = 10 * 1024 * 1024; // 10MB max input
pub const MAX_PARSER_DEPTH: usize = 64; // Max nesting units; fits a 2MB stack in debug builds
pub const MAX_DIAGNOSTICS: usize = 1000; // Diagnostics beyond this are dropped

/// Tunables for one parse invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    pub max_input_size: usize,
    pub max_depth: usize,
    pub max_diagnostics: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_input_size: MAX_INPUT_SIZE,
            max_depth: MAX_PARSER_DEPTH,
            max_diagnostics: MAX_DIAGNOSTICS,
        }
    }
}

lazy_static::lazy_static! {
    /// Words that cannot name a variable, parameter, function, or loop binding
    pub static ref RESERVED_WORDS: HashSet<&'static str> = [
        "var",
        "setvar",
        "setglobal",
        "const",
        "for",
        "in",
        "while",
        "if",
        "elif",
        "else",
        "case",
    ]
    .into_iter()
    .collect();
}

pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.contains(word)
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check if a token type is a redirection operator
pub fn is_redirection_token(t: TokenType) -> bool {
    redirection_operator(t).is_some()
}

pub fn redirection_operator(t: TokenType) -> Option<RedirectionOperator> {
    let op = match t {
        TokenType::Less => RedirectionOperator::Less,
        TokenType::LessGreat => RedirectionOperator::LessGreat,
        TokenType::LessAnd => RedirectionOperator::LessAnd,
        TokenType::GreatAnd => RedirectionOperator::GreatAnd,
        TokenType::AndGreat => RedirectionOperator::AndGreat,
        TokenType::Great => RedirectionOperator::Great,
        TokenType::Clobber => RedirectionOperator::Clobber,
        TokenType::DGreat => RedirectionOperator::DGreat,
        TokenType::AndDGreat => RedirectionOperator::AndDGreat,
        TokenType::DGreatAnd => RedirectionOperator::DGreatAnd,
        TokenType::TLess => RedirectionOperator::TLess,
        _ => return None,
    };
    Some(op)
}

/// Tokens that end a statement
pub fn is_terminator_token(t: TokenType) -> bool {
    matches!(
        t,
        TokenType::Semicolon | TokenType::DSemi | TokenType::Amp | TokenType::Newline
    )
}

/// Tokens that end a run of command arguments
pub fn is_argument_end(t: TokenType) -> bool {
    is_terminator_token(t)
        || matches!(
            t,
            TokenType::Eof
                | TokenType::Pipe
                | TokenType::RBrace
                | TokenType::RParen
                | TokenType::LBrace
                | TokenType::LParen
        )
}

/// Tokens that can start or continue a shell word
pub fn is_word_piece_token(t: TokenType) -> bool {
    matches!(
        t,
        TokenType::Word
            | TokenType::StringStart(..)
            | TokenType::DollarName
            | TokenType::DollarBrace
            | TokenType::DollarBracket
            | TokenType::DollarParen
            | TokenType::AtName
            | TokenType::AtBracket
            | TokenType::AtParen
            | TokenType::CaretBracket
            | TokenType::CaretParen
            | TokenType::LBracket
            | TokenType::RBracket
    )
}

/// Binary operator levels from loosest to tightest binding. Every level is
/// left-associative. Index 0 is reserved for a ternary form and holds no
/// operators.
pub const BINARY_PRECEDENCE: &[&[BinaryOperator]] = &[
    &[],
    &[BinaryOperator::Or],
    &[BinaryOperator::And],
    &[BinaryOperator::BitOr],
    &[BinaryOperator::BitXor],
    &[BinaryOperator::BitAnd],
    &[
        BinaryOperator::Equal,
        BinaryOperator::NotEqual,
        BinaryOperator::NotIdentical,
        BinaryOperator::Identical,
        BinaryOperator::ApproxEqual,
    ],
    &[
        BinaryOperator::Less,
        BinaryOperator::Greater,
        BinaryOperator::LessEqual,
        BinaryOperator::GreaterEqual,
        BinaryOperator::Match,
        BinaryOperator::NotMatch,
        BinaryOperator::GlobMatch,
        BinaryOperator::NotGlobMatch,
    ],
    &[BinaryOperator::ShiftLeft, BinaryOperator::ShiftRight],
    &[
        BinaryOperator::Add,
        BinaryOperator::Subtract,
        BinaryOperator::Concatenate,
    ],
    &[
        BinaryOperator::Multiply,
        BinaryOperator::Divide,
        BinaryOperator::Modulo,
    ],
    &[BinaryOperator::Power],
    &[BinaryOperator::Chain],
];

/// Level of `op` in `BINARY_PRECEDENCE`
pub fn precedence(op: BinaryOperator) -> usize {
    BINARY_PRECEDENCE
        .iter()
        .position(|level| level.contains(&op))
        .unwrap_or(0)
}

/// Map an expression-mode token to the binary operator it spells
pub fn binary_operator(t: TokenType) -> Option<BinaryOperator> {
    let op = match t {
        TokenType::Or => BinaryOperator::Or,
        TokenType::And => BinaryOperator::And,
        TokenType::Pipe => BinaryOperator::BitOr,
        TokenType::Caret => BinaryOperator::BitXor,
        TokenType::Amp => BinaryOperator::BitAnd,
        TokenType::EqEq => BinaryOperator::Equal,
        TokenType::NotEq => BinaryOperator::NotEqual,
        TokenType::NotEqEq => BinaryOperator::NotIdentical,
        TokenType::EqEqEq => BinaryOperator::Identical,
        TokenType::TildeEqEq => BinaryOperator::ApproxEqual,
        TokenType::Lt => BinaryOperator::Less,
        TokenType::Gt => BinaryOperator::Greater,
        TokenType::LtEq => BinaryOperator::LessEqual,
        TokenType::GtEq => BinaryOperator::GreaterEqual,
        TokenType::Tilde => BinaryOperator::Match,
        TokenType::NotTilde => BinaryOperator::NotMatch,
        TokenType::DTilde => BinaryOperator::GlobMatch,
        TokenType::NotDTilde => BinaryOperator::NotGlobMatch,
        TokenType::ShiftLeft => BinaryOperator::ShiftLeft,
        TokenType::ShiftRight => BinaryOperator::ShiftRight,
        TokenType::Plus => BinaryOperator::Add,
        TokenType::Minus => BinaryOperator::Subtract,
        TokenType::DPlus => BinaryOperator::Concatenate,
        TokenType::Star => BinaryOperator::Multiply,
        TokenType::Slash => BinaryOperator::Divide,
        TokenType::Percent => BinaryOperator::Modulo,
        TokenType::DStar => BinaryOperator::Power,
        TokenType::FatArrow => BinaryOperator::Chain,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_words() {
        for word in ["var", "setvar", "setglobal", "const", "for", "in", "while", "if", "elif", "else", "case"] {
            assert!(is_reserved_word(word), "{} should be reserved", word);
        }
        assert!(!is_reserved_word("func"));
        assert!(!is_reserved_word("proc"));
        assert!(!is_reserved_word("echo"));
    }

    #[test]
    fn test_precedence_order() {
        assert!(precedence(BinaryOperator::Or) < precedence(BinaryOperator::And));
        assert!(precedence(BinaryOperator::Add) < precedence(BinaryOperator::Multiply));
        assert!(precedence(BinaryOperator::Multiply) < precedence(BinaryOperator::Power));
        // `=>` binds tighter than `**`
        assert!(precedence(BinaryOperator::Power) < precedence(BinaryOperator::Chain));
        assert_eq!(
            precedence(BinaryOperator::Equal),
            precedence(BinaryOperator::ApproxEqual)
        );
    }

    #[test]
    fn test_every_operator_has_a_level() {
        for level in BINARY_PRECEDENCE {
            for op in *level {
                assert!(precedence(*op) > 0);
            }
        }
    }

    #[test]
    fn test_redirection_tokens() {
        assert!(is_redirection_token(TokenType::DGreatAnd));
        assert!(is_redirection_token(TokenType::LessAnd));
        assert!(!is_redirection_token(TokenType::Pipe));
        assert_eq!(
            redirection_operator(TokenType::Clobber),
            Some(RedirectionOperator::Clobber)
        );
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("_x1"));
        assert!(!is_valid_name("1x"));
        assert!(!is_valid_name("a-b"));
        assert!(!is_valid_name(""));
    }
}
