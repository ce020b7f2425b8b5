//! Lexer for YSH Source
//!
//! The lexer is a pull-based cursor: the parser asks for one token at a time
//! and says which lexical mode it wants. It handles:
//! - Extras (blanks, line continuations, escaped blanks, comments)
//! - Shell words and redirection operators (command mode)
//! - Identifiers, numbers, keywords and operators (expression mode)
//! - Expansion and string openers (both modes)
//!
//! String bodies, eggex bodies and `${...}` names are read by the sub-lexer
//! in `string_lexer.rs` after the parser has consumed the opening token.

use std::collections::HashMap;
use tracing::trace;

use crate::ast::types::{Span, StringVariant};
use crate::parser::errors::LexError;

/// Which token grammar applies at the current position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexMode {
    /// Shell words, redirections, terminators
    Command,
    /// Typed expressions: identifiers, numbers, operators
    Expression,
}

/// Token types for the YSH lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // End of input
    Eof,

    // Terminators
    Newline,
    Semicolon, // ;
    DSemi,     // ;;
    Amp,       // & (also bitwise-and / reference in expressions)
    Pipe,      // | (also bitwise-or in expressions)

    // Redirections
    Less,      // <
    LessGreat, // <>
    LessAnd,   // <&
    GreatAnd,  // >&
    AndGreat,  // &>
    Great,     // >
    Clobber,   // >|
    DGreat,    // >>
    AndDGreat, // &>>
    DGreatAnd, // >>&
    TLess,     // <<<

    // Grouping
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]

    // Shell word text
    Word,

    // Expansion openers
    DollarName,    // $name $1 $? $# $* $@
    DollarBrace,   // ${
    DollarBracket, // $[
    DollarParen,   // $(
    AtName,        // @name
    AtBracket,     // @[
    AtParen,       // @(
    CaretBracket,  // ^[
    CaretParen,    // ^(

    // String opener, with variant and triple-delimiter flag
    StringStart(StringVariant, bool),

    // Expression atoms
    Identifier,
    Number,
    CharLiteral, // \n, \t, \u{41}

    // Expression keywords
    And,
    Or,
    Not,
    True,
    False,
    Null,

    // Expression operators
    Plus,          // +
    Minus,         // -
    Star,          // *
    Slash,         // /
    Percent,       // %
    DStar,         // **
    DPlus,         // ++
    EqEq,          // ==
    NotEq,         // !=
    NotEqEq,       // !==
    EqEqEq,        // ===
    TildeEqEq,     // ~==
    Lt,            // <
    Gt,            // >
    LtEq,          // <=
    GtEq,          // >=
    Tilde,         // ~
    NotTilde,      // !~
    DTilde,        // ~~
    NotDTilde,     // !~~
    ShiftLeft,     // <<
    ShiftRight,    // >>
    Caret,         // ^
    FatArrow,      // =>
    Dot,           // .
    Arrow,         // ->
    Comma,         // ,
    Colon,         // :
    Assign,        // =
    PlusAssign,    // +=
    RangeExclusive, // ..<
    Ellipsis,      // ...
    ColonPipe,     // :|
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eof => "end of input",
            Self::Newline => "newline",
            Self::Semicolon => ";",
            Self::DSemi => ";;",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::Less => "<",
            Self::LessGreat => "<>",
            Self::LessAnd => "<&",
            Self::GreatAnd => ">&",
            Self::AndGreat => "&>",
            Self::Great => ">",
            Self::Clobber => ">|",
            Self::DGreat => ">>",
            Self::AndDGreat => "&>>",
            Self::DGreatAnd => ">>&",
            Self::TLess => "<<<",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Word => "word",
            Self::DollarName => "$name",
            Self::DollarBrace => "${",
            Self::DollarBracket => "$[",
            Self::DollarParen => "$(",
            Self::AtName => "@name",
            Self::AtBracket => "@[",
            Self::AtParen => "@(",
            Self::CaretBracket => "^[",
            Self::CaretParen => "^(",
            Self::StringStart(..) => "string",
            Self::Identifier => "identifier",
            Self::Number => "number",
            Self::CharLiteral => "character literal",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::DStar => "**",
            Self::DPlus => "++",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::NotEqEq => "!==",
            Self::EqEqEq => "===",
            Self::TildeEqEq => "~==",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Tilde => "~",
            Self::NotTilde => "!~",
            Self::DTilde => "~~",
            Self::NotDTilde => "!~~",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::Caret => "^",
            Self::FatArrow => "=>",
            Self::Dot => ".",
            Self::Arrow => "->",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::Assign => "=",
            Self::PlusAssign => "+=",
            Self::RangeExclusive => "..<",
            Self::Ellipsis => "...",
            Self::ColonPipe => ":|",
        }
    }
}

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    /// Source text of the token
    pub value: String,
    pub start: usize,
    pub end: usize,
    /// No extras were skipped between the previous position and this token
    pub immediate: bool,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        value: impl Into<String>,
        start: usize,
        end: usize,
        immediate: bool,
    ) -> Self {
        Self {
            token_type,
            value: value.into(),
            start,
            end,
            immediate,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// Human-readable description used in error messages
    pub fn describe(&self) -> String {
        match self.token_type {
            TokenType::Eof => "end of input".to_string(),
            TokenType::Newline => "newline".to_string(),
            _ => format!("`{}`", self.value),
        }
    }
}

lazy_static::lazy_static! {
    /// Keywords recognized in expression mode
    static ref EXPRESSION_KEYWORDS: HashMap<&'static str, TokenType> = {
        let mut m = HashMap::new();
        m.insert("and", TokenType::And);
        m.insert("or", TokenType::Or);
        m.insert("not", TokenType::Not);
        m.insert("true", TokenType::True);
        m.insert("false", TokenType::False);
        m.insert("null", TokenType::Null);
        m
    };

    /// Single-character command-mode operators
    static ref COMMAND_SINGLE_CHAR_OPS: HashMap<char, TokenType> = {
        let mut m = HashMap::new();
        m.insert(';', TokenType::Semicolon);
        m.insert('&', TokenType::Amp);
        m.insert('|', TokenType::Pipe);
        m.insert('<', TokenType::Less);
        m.insert('>', TokenType::Great);
        m.insert('(', TokenType::LParen);
        m.insert(')', TokenType::RParen);
        m.insert('{', TokenType::LBrace);
        m.insert('}', TokenType::RBrace);
        m.insert('[', TokenType::LBracket);
        m.insert(']', TokenType::RBracket);
        m
    };

    /// Single-character expression-mode operators
    static ref EXPRESSION_SINGLE_CHAR_OPS: HashMap<char, TokenType> = {
        let mut m = HashMap::new();
        m.insert(';', TokenType::Semicolon);
        m.insert('&', TokenType::Amp);
        m.insert('|', TokenType::Pipe);
        m.insert('(', TokenType::LParen);
        m.insert(')', TokenType::RParen);
        m.insert('{', TokenType::LBrace);
        m.insert('}', TokenType::RBrace);
        m.insert('[', TokenType::LBracket);
        m.insert(']', TokenType::RBracket);
        m.insert('+', TokenType::Plus);
        m.insert('-', TokenType::Minus);
        m.insert('*', TokenType::Star);
        m.insert('/', TokenType::Slash);
        m.insert('%', TokenType::Percent);
        m.insert('<', TokenType::Lt);
        m.insert('>', TokenType::Gt);
        m.insert('~', TokenType::Tilde);
        m.insert('^', TokenType::Caret);
        m.insert('.', TokenType::Dot);
        m.insert(',', TokenType::Comma);
        m.insert(':', TokenType::Colon);
        m.insert('=', TokenType::Assign);
        m
    };
}

/// Three-character command-mode operators
const COMMAND_THREE_CHAR_OPS: &[(&str, TokenType)] = &[
    ("<<<", TokenType::TLess),
    ("&>>", TokenType::AndDGreat),
    (">>&", TokenType::DGreatAnd),
];

/// Two-character command-mode operators
const COMMAND_TWO_CHAR_OPS: &[(&str, TokenType)] = &[
    (";;", TokenType::DSemi),
    ("<>", TokenType::LessGreat),
    ("<&", TokenType::LessAnd),
    (">&", TokenType::GreatAnd),
    ("&>", TokenType::AndGreat),
    (">|", TokenType::Clobber),
    (">>", TokenType::DGreat),
];

/// Three-character expression-mode operators
const EXPRESSION_THREE_CHAR_OPS: &[(&str, TokenType)] = &[
    ("!==", TokenType::NotEqEq),
    ("===", TokenType::EqEqEq),
    ("~==", TokenType::TildeEqEq),
    ("!~~", TokenType::NotDTilde),
    ("..<", TokenType::RangeExclusive),
    ("...", TokenType::Ellipsis),
];

/// Two-character expression-mode operators
const EXPRESSION_TWO_CHAR_OPS: &[(&str, TokenType)] = &[
    ("**", TokenType::DStar),
    ("++", TokenType::DPlus),
    ("==", TokenType::EqEq),
    ("!=", TokenType::NotEq),
    ("<=", TokenType::LtEq),
    (">=", TokenType::GtEq),
    ("!~", TokenType::NotTilde),
    ("~~", TokenType::DTilde),
    ("<<", TokenType::ShiftLeft),
    (">>", TokenType::ShiftRight),
    ("=>", TokenType::FatArrow),
    ("->", TokenType::Arrow),
    ("+=", TokenType::PlusAssign),
    (":|", TokenType::ColonPipe),
];

/// Characters that end a bare shell word
pub fn is_word_special(c: char) -> bool {
    matches!(
        c,
        '\'' | '"' | '<' | '>' | '{' | '}' | '[' | ']' | '(' | ')' | '`' | '$' | '|' | '&' | ';'
            | '\\'
    ) || c.is_whitespace()
}

pub fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

fn is_octal_digit(c: char) -> bool {
    matches!(c, '0'..='7')
}

fn is_binary_digit(c: char) -> bool {
    matches!(c, '0' | '1')
}

/// Pull-based tokenizer over a source buffer. Positions are byte offsets.
pub struct Lexer<'a> {
    pub(crate) source: &'a str,
    pub(crate) pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the cursor back (or forward) to a previously observed position
    pub fn reset(&mut self, pos: usize) {
        self.pos = pos.min(self.source.len());
    }

    /// Tokenize the whole remaining input in a single mode.
    ///
    /// The parser never does this; it is a convenience for tooling and
    /// tests. Errors are collected rather than stopping the scan.
    pub fn tokenize(&mut self, mode: LexMode) -> (Vec<Token>, Vec<LexError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        loop {
            match self.next_token(mode) {
                Ok(token) => {
                    let eof = token.token_type == TokenType::Eof;
                    tokens.push(token);
                    if eof {
                        break;
                    }
                }
                Err(e) => errors.push(e),
            }
        }
        (tokens, errors)
    }

    pub(crate) fn current(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    pub(crate) fn peek_char(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    pub(crate) fn advance(&mut self) -> Option<char> {
        let c = self.current()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub(crate) fn starts_with(&self, text: &str) -> bool {
        self.source[self.pos..].starts_with(text)
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Skip blanks, line continuations, escaped blanks and comments.
    /// Returns true when anything was skipped.
    pub fn skip_extras(&mut self) -> bool {
        let start = self.pos;
        while let Some(c) = self.current() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.pos += 1;
                }
                '\\' if matches!(self.peek_char(1), Some('\n') | Some(' ') | Some('\t')) => {
                    self.pos += 2;
                }
                '#' => {
                    while let Some(c) = self.current() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
        self.pos > start
    }

    /// Produce the next token in the given mode.
    ///
    /// On a lexical error the cursor has already moved past the offending
    /// input, so calling again resumes scanning.
    pub fn next_token(&mut self, mode: LexMode) -> Result<Token, LexError> {
        let skipped = self.skip_extras();
        let immediate = !skipped;
        let token = match mode {
            LexMode::Command => self.next_command_token(immediate)?,
            LexMode::Expression => self.next_expression_token(immediate)?,
        };
        trace!(
            target: "tokenize",
            kind = token.token_type.as_str(),
            start = token.start,
            end = token.end,
            "token"
        );
        Ok(token)
    }

    fn make(&self, token_type: TokenType, start: usize, immediate: bool) -> Token {
        Token::new(
            token_type,
            &self.source[start..self.pos],
            start,
            self.pos,
            immediate,
        )
    }

    fn match_table(&mut self, table: &[(&str, TokenType)]) -> Option<TokenType> {
        for (op_str, token_type) in table {
            if self.starts_with(op_str) {
                self.pos += op_str.len();
                return Some(*token_type);
            }
        }
        None
    }

    fn unrecognized(&mut self, start: usize) -> LexError {
        self.advance();
        LexError::UnrecognizedInput {
            text: self.source[start..self.pos].to_string(),
            span: Span::new(start, self.pos),
        }
    }

    fn next_command_token(&mut self, immediate: bool) -> Result<Token, LexError> {
        let start = self.pos;
        let c0 = match self.current() {
            Some(c) => c,
            None => return Ok(self.make(TokenType::Eof, start, immediate)),
        };

        if c0 == '\n' {
            self.pos += 1;
            return Ok(self.make(TokenType::Newline, start, immediate));
        }

        if let Some(token_type) = self.match_table(COMMAND_THREE_CHAR_OPS) {
            return Ok(self.make(token_type, start, immediate));
        }
        if let Some(token_type) = self.match_table(COMMAND_TWO_CHAR_OPS) {
            return Ok(self.make(token_type, start, immediate));
        }
        if let Some(&token_type) = COMMAND_SINGLE_CHAR_OPS.get(&c0) {
            self.pos += 1;
            return Ok(self.make(token_type, start, immediate));
        }

        if let Some(token_type) = self.lex_string_start() {
            return Ok(self.make(token_type, start, immediate));
        }
        if c0 == '$' {
            if let Some(token_type) = self.lex_dollar() {
                return Ok(self.make(token_type, start, immediate));
            }
            // A lone `$` is literal word text
            self.pos += 1;
            return Ok(self.make(TokenType::Word, start, immediate));
        }
        if let Some(token_type) = self.lex_sigil() {
            return Ok(self.make(token_type, start, immediate));
        }
        if c0 == '`' {
            return Err(self.unrecognized(start));
        }

        self.read_word(start, immediate)
    }

    /// Maximal run of non-special characters, with `\c` escape pairs inline
    fn read_word(&mut self, start: usize, immediate: bool) -> Result<Token, LexError> {
        while let Some(c) = self.current() {
            if c == '\\' {
                match self.peek_char(1) {
                    // Escaped blanks and line continuations end the word
                    Some('\n') | Some(' ') | Some('\t') => break,
                    Some(_) => {
                        self.advance();
                        self.advance();
                        continue;
                    }
                    None => break,
                }
            }
            if is_word_special(c) {
                break;
            }
            self.advance();
        }
        if self.pos == start {
            return Err(self.unrecognized(start));
        }
        Ok(self.make(TokenType::Word, start, immediate))
    }

    /// `"`, `'`, `r'`, `u'`, `b'`, each optionally tripled
    fn lex_string_start(&mut self) -> Option<TokenType> {
        let (variant, prefix_len) = match self.current()? {
            '"' => (StringVariant::DoubleQuoted, 0),
            '\'' => (StringVariant::SingleQuoted, 0),
            'r' if self.peek_char(1) == Some('\'') => (StringVariant::Raw, 1),
            'u' if self.peek_char(1) == Some('\'') => (StringVariant::J8, 1),
            'b' if self.peek_char(1) == Some('\'') => (StringVariant::Byte, 1),
            _ => return None,
        };
        let quote = variant.quote();
        let rest = &self.source[self.pos + prefix_len..];
        let triple_delim: String = std::iter::repeat(quote).take(3).collect();
        let triple = rest.starts_with(&triple_delim);
        self.pos += prefix_len + if triple { 3 } else { 1 };
        Some(TokenType::StringStart(variant, triple))
    }

    /// `$name`, `$1`, `$?`, `${`, `$[`, `$(`
    pub(crate) fn lex_dollar(&mut self) -> Option<TokenType> {
        let next = self.peek_char(1)?;
        let token_type = match next {
            '{' => {
                self.pos += 2;
                TokenType::DollarBrace
            }
            '[' => {
                self.pos += 2;
                TokenType::DollarBracket
            }
            '(' => {
                self.pos += 2;
                TokenType::DollarParen
            }
            '?' | '#' | '*' | '@' => {
                self.pos += 2;
                TokenType::DollarName
            }
            // Positionals stop after two digits: `$123` is `$12` then `3`
            c if c.is_ascii_digit() => {
                self.pos += 2;
                if matches!(self.current(), Some(c) if c.is_ascii_digit()) {
                    self.pos += 1;
                }
                TokenType::DollarName
            }
            c if is_identifier_start(c) => {
                self.pos += 1;
                while matches!(self.current(), Some(c) if is_identifier_char(c)) {
                    self.pos += 1;
                }
                TokenType::DollarName
            }
            _ => return None,
        };
        Some(token_type)
    }

    /// `@name`, `@[`, `@(`, `^[`, `^(`
    fn lex_sigil(&mut self) -> Option<TokenType> {
        let c0 = self.current()?;
        let c1 = self.peek_char(1)?;
        let token_type = match (c0, c1) {
            ('@', '[') => TokenType::AtBracket,
            ('@', '(') => TokenType::AtParen,
            ('^', '[') => TokenType::CaretBracket,
            ('^', '(') => TokenType::CaretParen,
            ('@', c) if is_identifier_start(c) => {
                self.pos += 1;
                while matches!(self.current(), Some(c) if is_identifier_char(c)) {
                    self.pos += 1;
                }
                return Some(TokenType::AtName);
            }
            _ => return None,
        };
        self.pos += 2;
        Some(token_type)
    }

    fn next_expression_token(&mut self, immediate: bool) -> Result<Token, LexError> {
        let start = self.pos;
        let c0 = match self.current() {
            Some(c) => c,
            None => return Ok(self.make(TokenType::Eof, start, immediate)),
        };

        if c0 == '\n' {
            self.pos += 1;
            return Ok(self.make(TokenType::Newline, start, immediate));
        }

        if let Some(token_type) = self.lex_string_start() {
            return Ok(self.make(token_type, start, immediate));
        }
        if c0.is_ascii_digit() {
            return self.read_number(start, immediate);
        }
        if is_identifier_start(c0) {
            while matches!(self.current(), Some(c) if is_identifier_char(c)) {
                self.pos += 1;
            }
            let text = &self.source[start..self.pos];
            let token_type = EXPRESSION_KEYWORDS
                .get(text)
                .copied()
                .unwrap_or(TokenType::Identifier);
            return Ok(self.make(token_type, start, immediate));
        }
        if c0 == '$' {
            if let Some(token_type) = self.lex_dollar() {
                return Ok(self.make(token_type, start, immediate));
            }
            return Err(self.unrecognized(start));
        }
        if let Some(token_type) = self.lex_sigil() {
            return Ok(self.make(token_type, start, immediate));
        }
        if c0 == '\\' {
            return self.read_char_literal(start, immediate);
        }

        if let Some(token_type) = self.match_table(EXPRESSION_THREE_CHAR_OPS) {
            return Ok(self.make(token_type, start, immediate));
        }
        if let Some(token_type) = self.match_table(EXPRESSION_TWO_CHAR_OPS) {
            return Ok(self.make(token_type, start, immediate));
        }
        if let Some(&token_type) = EXPRESSION_SINGLE_CHAR_OPS.get(&c0) {
            self.pos += 1;
            return Ok(self.make(token_type, start, immediate));
        }

        Err(self.unrecognized(start))
    }

    /// Decimal, `0x`, `0o`, `0b` integers with `_` separators, and floats
    fn read_number(&mut self, start: usize, immediate: bool) -> Result<Token, LexError> {
        let radix_digits: Option<fn(char) -> bool> = if self.current() == Some('0') {
            match self.peek_char(1) {
                Some('x') | Some('X') => Some(is_hex_digit),
                Some('o') | Some('O') => Some(is_octal_digit),
                Some('b') | Some('B') => Some(is_binary_digit),
                _ => None,
            }
        } else {
            None
        };

        let mut valid = true;
        if let Some(is_digit) = radix_digits {
            self.pos += 2;
            let digits_start = self.pos;
            while matches!(self.current(), Some(c) if is_digit(c) || c == '_') {
                self.pos += 1;
            }
            if self.pos == digits_start {
                valid = false;
            }
        } else {
            self.eat_decimal_digits();
            // Fraction only when a digit follows the dot, so `1..<5` stays a range
            if self.current() == Some('.') && matches!(self.peek_char(1), Some(c) if c.is_ascii_digit())
            {
                self.pos += 1;
                self.eat_decimal_digits();
            }
            if matches!(self.current(), Some('e') | Some('E')) {
                let exponent_start = self.pos;
                self.pos += 1;
                if matches!(self.current(), Some('+') | Some('-')) {
                    self.pos += 1;
                }
                if matches!(self.current(), Some(c) if c.is_ascii_digit()) {
                    self.eat_decimal_digits();
                } else {
                    self.pos = exponent_start;
                }
            }
        }

        // Trailing identifier characters make the whole run malformed
        if matches!(self.current(), Some(c) if is_identifier_char(c)) {
            while matches!(self.current(), Some(c) if is_identifier_char(c)) {
                self.pos += 1;
            }
            valid = false;
        }

        if !valid {
            return Err(LexError::MalformedNumber {
                text: self.source[start..self.pos].to_string(),
                span: Span::new(start, self.pos),
            });
        }
        Ok(self.make(TokenType::Number, start, immediate))
    }

    fn eat_decimal_digits(&mut self) {
        while matches!(self.current(), Some(c) if c.is_ascii_digit() || c == '_') {
            self.pos += 1;
        }
    }

    /// `\n`, `\t`, `\\`, `\u{41}`, `\x41`
    fn read_char_literal(&mut self, start: usize, immediate: bool) -> Result<Token, LexError> {
        self.pos += 1;
        match self.current() {
            Some('u') if self.peek_char(1) == Some('{') => {
                self.pos += 2;
                while matches!(self.current(), Some(c) if c.is_ascii_hexdigit()) {
                    self.pos += 1;
                }
                if self.current() != Some('}') {
                    return Err(LexError::InvalidEscape {
                        sequence: self.source[start..self.pos].to_string(),
                        span: Span::new(start, self.pos),
                    });
                }
                self.pos += 1;
            }
            Some('x') => {
                self.pos += 1;
                for _ in 0..2 {
                    if matches!(self.current(), Some(c) if c.is_ascii_hexdigit()) {
                        self.pos += 1;
                    }
                }
            }
            Some(c) if !c.is_whitespace() => {
                self.pos += c.len_utf8();
            }
            _ => {
                return Err(LexError::InvalidEscape {
                    sequence: "\\".to_string(),
                    span: Span::new(start, self.pos),
                });
            }
        }
        Ok(self.make(TokenType::CharLiteral, start, immediate))
    }
}
