//! String & Expansion Sub-Lexer
//!
//! Once the parser has consumed a quote-opening token it pulls the literal's
//! body from here one piece at a time: runs of text, escape sequences, and
//! `$` expansion openers. Expansion bodies are handed back to the parser,
//! which parses them recursively and then resumes pulling pieces.
//!
//! The same cursor also reads eggex bodies and `${...}` names, which have no
//! token grammar of their own.

use crate::ast::types::{Span, StringVariant};
use crate::parser::errors::LexError;
use crate::parser::lexer::{is_identifier_char, is_identifier_start, Lexer, Token};

/// One unit of a string literal's body
#[derive(Debug, Clone, PartialEq)]
pub enum StringPiece {
    Text { value: String, span: Span },
    Escape { raw: String, span: Span },
    /// An escape the variant does not allow; kept as text, error reported
    BadEscape { raw: String, span: Span, error: LexError },
    /// `$name`, `${`, `$[`, `$(` inside a double-quoted string
    Expansion(Token),
    /// The closing delimiter
    Close(Span),
}

const J8_SIMPLE_ESCAPES: &[char] = &['\\', '\'', '"', '/', 'b', 'f', 'n', 'r', 't'];
const DOUBLE_QUOTED_ESCAPES: &[char] = &['\\', '$', '"', 'n', '\n'];

fn closing_delimiter(variant: StringVariant, triple: bool) -> &'static str {
    match (variant.quote(), triple) {
        ('"', true) => "\"\"\"",
        ('"', false) => "\"",
        (_, true) => "'''",
        (_, false) => "'",
    }
}

impl<'a> Lexer<'a> {
    /// Pull the next piece of a string literal body.
    ///
    /// `open` is the span of the opening token, used to anchor the error
    /// when input ends before the closing delimiter.
    pub fn next_string_piece(
        &mut self,
        variant: StringVariant,
        triple: bool,
        open: Span,
    ) -> Result<StringPiece, LexError> {
        let close = closing_delimiter(variant, triple);
        let start = self.pos;

        if self.at_eof() {
            return Err(LexError::UnterminatedString {
                variant,
                triple,
                span: open,
            });
        }
        if self.starts_with(close) {
            self.pos += close.len();
            return Ok(StringPiece::Close(Span::new(start, self.pos)));
        }

        match variant {
            StringVariant::SingleQuoted | StringVariant::Raw => {
                Ok(self.read_string_text(close, &[], false))
            }
            StringVariant::DoubleQuoted => match self.current() {
                Some('\\') => match self.peek_char(1) {
                    Some(c) if DOUBLE_QUOTED_ESCAPES.contains(&c) => {
                        self.advance();
                        self.advance();
                        Ok(StringPiece::Escape {
                            raw: self.source[start..self.pos].to_string(),
                            span: Span::new(start, self.pos),
                        })
                    }
                    _ => Ok(self.read_string_text(close, &['$'], true)),
                },
                Some('$') => {
                    if let Some(token_type) = self.lex_dollar() {
                        return Ok(StringPiece::Expansion(Token::new(
                            token_type,
                            &self.source[start..self.pos],
                            start,
                            self.pos,
                            true,
                        )));
                    }
                    self.advance();
                    let piece = self.read_string_text(close, &['$'], true);
                    Ok(prepend_text("$", start, piece))
                }
                _ => Ok(self.read_string_text(close, &['$'], true)),
            },
            StringVariant::J8 | StringVariant::Byte => {
                if self.current() == Some('\\') {
                    return Ok(self.read_j8_escape(variant, close));
                }
                Ok(self.read_string_text(close, &['\\'], false))
            }
        }
    }

    /// Maximal text run up to the closing delimiter, end of input or a
    /// stop character. When `literal_backslash` is set, a backslash that
    /// does not start a recognized escape is absorbed as text.
    fn read_string_text(&mut self, close: &str, stops: &[char], literal_backslash: bool) -> StringPiece {
        let start = self.pos;
        while let Some(c) = self.current() {
            if self.starts_with(close) || stops.contains(&c) {
                break;
            }
            if c == '\\' && literal_backslash {
                if let Some(next) = self.peek_char(1) {
                    if DOUBLE_QUOTED_ESCAPES.contains(&next) && self.pos > start {
                        break;
                    }
                }
            }
            self.advance();
        }
        StringPiece::Text {
            value: self.source[start..self.pos].to_string(),
            span: Span::new(start, self.pos),
        }
    }

    fn read_j8_escape(&mut self, variant: StringVariant, close: &str) -> StringPiece {
        let start = self.pos;
        self.advance();
        let Some(kind) = self.current() else {
            return StringPiece::Text {
                value: "\\".to_string(),
                span: Span::new(start, self.pos),
            };
        };
        // Never swallow the closing delimiter as an escape payload
        let valid = if J8_SIMPLE_ESCAPES.contains(&kind) {
            self.advance();
            true
        } else {
            match kind {
                'x' => {
                    self.advance();
                    self.eat_hex_digits(2, 2, close)
                }
                'u' if self.peek_char(1) == Some('{') => {
                    self.advance();
                    self.advance();
                    let ok = self.eat_hex_digits(1, 6, close);
                    if ok && self.current() == Some('}') {
                        self.advance();
                        true
                    } else {
                        false
                    }
                }
                'u' => {
                    self.advance();
                    self.eat_hex_digits(4, 4, close)
                }
                'y' if variant == StringVariant::Byte => {
                    self.advance();
                    let ok = self.eat_hex_digits(2, 2, close);
                    if !ok {
                        let raw = self.source[start..self.pos].to_string();
                        let span = Span::new(start, self.pos);
                        return StringPiece::BadEscape {
                            error: LexError::InvalidByteEscape {
                                sequence: raw.clone(),
                                span,
                            },
                            raw,
                            span,
                        };
                    }
                    true
                }
                _ => {
                    if !self.starts_with(close) {
                        self.advance();
                    }
                    false
                }
            }
        };

        let raw = self.source[start..self.pos].to_string();
        let span = Span::new(start, self.pos);
        if valid {
            StringPiece::Escape { raw, span }
        } else {
            StringPiece::BadEscape {
                error: LexError::InvalidEscape {
                    sequence: raw.clone(),
                    span,
                },
                raw,
                span,
            }
        }
    }

    /// Consume between `min` and `max` hex digits; false when fewer than `min`
    fn eat_hex_digits(&mut self, min: usize, max: usize, close: &str) -> bool {
        let mut count = 0;
        while count < max {
            match self.current() {
                Some(c) if c.is_ascii_hexdigit() && !self.starts_with(close) => {
                    self.advance();
                    count += 1;
                }
                _ => break,
            }
        }
        count >= min
    }

    /// Read an eggex body after its opening `/`, through the closing `/`.
    /// Returns the trimmed pattern and the position after the closing slash.
    pub fn read_eggex_body(&mut self, open: Span) -> Result<(String, usize), LexError> {
        let start = self.pos;
        while let Some(c) = self.current() {
            match c {
                '/' => {
                    let pattern = self.source[start..self.pos].trim().to_string();
                    self.advance();
                    return Ok((pattern, self.pos));
                }
                '\\' => {
                    self.advance();
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
        Err(LexError::UnterminatedEggex { span: open })
    }

    /// Name inside `${...}`: identifier, positional digits, or one of `?#*@`
    pub fn read_braced_name(&mut self) -> Option<(String, Span)> {
        let start = self.pos;
        match self.current()? {
            c if is_identifier_start(c) => {
                while matches!(self.current(), Some(c) if is_identifier_char(c)) {
                    self.advance();
                }
            }
            c if c.is_ascii_digit() => {
                while matches!(self.current(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            }
            '?' | '#' | '*' | '@' => {
                self.advance();
            }
            _ => return None,
        }
        Some((
            self.source[start..self.pos].to_string(),
            Span::new(start, self.pos),
        ))
    }

    /// Consume the `:-` default operator of a braced expansion
    pub fn eat_default_operator(&mut self) -> bool {
        if self.starts_with(":-") {
            self.pos += 2;
            true
        } else {
            false
        }
    }

    /// Consume a closing `}` that immediately follows the cursor
    pub fn eat_close_brace(&mut self) -> Option<Span> {
        if self.current() == Some('}') {
            self.pos += 1;
            Some(Span::new(self.pos - 1, self.pos))
        } else {
            None
        }
    }
}

fn prepend_text(prefix: &str, start: usize, piece: StringPiece) -> StringPiece {
    match piece {
        StringPiece::Text { value, span } => StringPiece::Text {
            value: format!("{}{}", prefix, value),
            span: Span::new(start, span.end),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::{LexMode, TokenType};

    fn pieces(input: &str, variant: StringVariant, triple: bool) -> Vec<StringPiece> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            match lexer.next_string_piece(variant, triple, Span::new(0, 1)) {
                Ok(StringPiece::Close(_)) => break,
                Ok(piece) => out.push(piece),
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        out
    }

    #[test]
    fn test_single_quoted_is_literal() {
        let out = pieces(r"a\nb'", StringVariant::SingleQuoted, false);
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], StringPiece::Text { value, .. } if value == r"a\nb"));
    }

    #[test]
    fn test_double_quoted_escape_and_expansion() {
        let out = pieces(r#"a\nb $x""#, StringVariant::DoubleQuoted, false);
        assert!(matches!(&out[0], StringPiece::Text { value, .. } if value == "a"));
        assert!(matches!(&out[1], StringPiece::Escape { raw, .. } if raw == r"\n"));
        assert!(matches!(&out[2], StringPiece::Text { value, .. } if value == "b "));
        assert!(
            matches!(&out[3], StringPiece::Expansion(t) if t.token_type == TokenType::DollarName)
        );
    }

    #[test]
    fn test_double_quoted_unknown_backslash_is_text() {
        let out = pieces(r#"\d+""#, StringVariant::DoubleQuoted, false);
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], StringPiece::Text { value, .. } if value == r"\d+"));
    }

    #[test]
    fn test_lone_dollar_is_text() {
        let out = pieces(r#"cost: $ 5""#, StringVariant::DoubleQuoted, false);
        let text: String = out
            .iter()
            .map(|p| match p {
                StringPiece::Text { value, .. } => value.clone(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(text, "cost: $ 5");
    }

    #[test]
    fn test_triple_quoted_allows_single_delimiter() {
        let out = pieces(r#"say "hi" now""""#, StringVariant::DoubleQuoted, true);
        assert!(matches!(&out[0], StringPiece::Text { value, .. } if value == r#"say "hi" now"#));
    }

    #[test]
    fn test_j8_escapes() {
        let out = pieces(r"\u{1F600}\x41\t'", StringVariant::J8, false);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|p| matches!(p, StringPiece::Escape { .. })));
    }

    #[test]
    fn test_j8_rejects_unknown_escape() {
        let out = pieces(r"\q'", StringVariant::J8, false);
        assert!(matches!(
            &out[0],
            StringPiece::BadEscape { error: LexError::InvalidEscape { .. }, .. }
        ));
    }

    #[test]
    fn test_byte_escape() {
        let out = pieces(r"\yff'", StringVariant::Byte, false);
        assert!(matches!(&out[0], StringPiece::Escape { raw, .. } if raw == r"\yff"));

        let bad = pieces(r"\yz'", StringVariant::Byte, false);
        assert!(matches!(
            &bad[0],
            StringPiece::BadEscape { error: LexError::InvalidByteEscape { .. }, .. }
        ));
    }

    #[test]
    fn test_unterminated_string_anchors_at_opener() {
        let mut lexer = Lexer::new("abc");
        let open = Span::new(10, 11);
        assert!(lexer
            .next_string_piece(StringVariant::Raw, false, open)
            .is_ok());
        let err = lexer
            .next_string_piece(StringVariant::Raw, false, open)
            .unwrap_err();
        assert_eq!(
            err,
            LexError::UnterminatedString {
                variant: StringVariant::Raw,
                triple: false,
                span: open
            }
        );
    }

    #[test]
    fn test_eggex_body() {
        let mut lexer = Lexer::new(" d+ '.' / rest");
        let (pattern, end) = lexer.read_eggex_body(Span::new(0, 1)).unwrap();
        assert_eq!(pattern, "d+ '.'");
        assert_eq!(end, 9);
        assert_eq!(lexer.next_token(LexMode::Command).unwrap().value, "rest");
    }

    #[test]
    fn test_braced_name() {
        let mut lexer = Lexer::new("name:-x}");
        let (name, _) = lexer.read_braced_name().unwrap();
        assert_eq!(name, "name");
        assert!(lexer.eat_default_operator());
    }
}
