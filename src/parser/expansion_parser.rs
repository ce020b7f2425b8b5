//! Expansion Parsing
//!
//! Handles the `$`, `@` and `^` forms once the lexer has produced their
//! opening token:
//!
//! - `$name`, `$1`, `$?` ...        simple
//! - `${name}`, `${name:-default}`  braced
//! - `@name`                        splice
//! - `$[e]`, `@[e]`, `^[e]`         indexed
//! - `$(cmd)`, `@(cmd)`, `^(cmd)`   command substitution
//!
//! The same entry point serves words, double-quoted strings and expressions.

use crate::ast::types::{ExpansionKind, ExpansionNode, Sigil, Span, WordNode, AST};
use crate::parser::errors::{LexError, SyntaxError};
use crate::parser::lexer::{LexMode, Token, TokenType};
use crate::parser::parser::Parser;

fn sigil_of(token_type: TokenType) -> Sigil {
    match token_type {
        TokenType::AtBracket | TokenType::AtParen => Sigil::At,
        TokenType::CaretBracket | TokenType::CaretParen => Sigil::Caret,
        _ => Sigil::Dollar,
    }
}

impl<'a> Parser<'a> {
    /// Parse an expansion whose opening token has already been consumed
    pub(crate) fn parse_expansion(&mut self, opener: Token) -> Result<ExpansionNode, SyntaxError> {
        match opener.token_type {
            TokenType::DollarName => {
                let name = opener.value.strip_prefix('$').unwrap_or(&opener.value);
                Ok(AST::expansion(
                    ExpansionKind::Simple {
                        name: name.to_string(),
                    },
                    opener.span(),
                ))
            }
            TokenType::AtName => {
                let name = opener.value.strip_prefix('@').unwrap_or(&opener.value);
                Ok(AST::expansion(
                    ExpansionKind::Splice {
                        name: name.to_string(),
                    },
                    opener.span(),
                ))
            }
            TokenType::DollarBrace => self.parse_braced_expansion(opener),
            TokenType::DollarBracket | TokenType::AtBracket | TokenType::CaretBracket => {
                let expression = self.bracketed(|p| {
                    let expression = p.parse_expression()?;
                    p.expect_closing(LexMode::Expression, TokenType::RBracket, opener.span())?;
                    Ok(expression)
                })?;
                Ok(AST::expansion(
                    ExpansionKind::Indexed {
                        sigil: sigil_of(opener.token_type),
                        expression,
                    },
                    Span::new(opener.start, self.last_end()),
                ))
            }
            TokenType::DollarParen | TokenType::AtParen | TokenType::CaretParen => {
                let body = self.nested(|p| {
                    Ok(p.unbracketed(|p| p.parse_statement_list(Some(TokenType::RParen))))
                })?;
                self.expect_closing(LexMode::Command, TokenType::RParen, opener.span())?;
                Ok(AST::expansion(
                    ExpansionKind::CommandSubstitution {
                        sigil: sigil_of(opener.token_type),
                        body,
                    },
                    Span::new(opener.start, self.last_end()),
                ))
            }
            _ => Err(SyntaxError::UnexpectedToken {
                found: opener.describe(),
                expected: "expansion".to_string(),
                span: opener.span(),
            }),
        }
    }

    /// `${name}` or `${name:-default}` after the `${`
    fn parse_braced_expansion(&mut self, opener: Token) -> Result<ExpansionNode, SyntaxError> {
        let Some((name, _)) = self.raw(|lexer| lexer.read_braced_name()) else {
            return Err(self.unexpected(LexMode::Command, "name after `${`"));
        };

        let default = if self.raw(|lexer| lexer.eat_default_operator()) {
            let start = self.last_end();
            match self.raw(|lexer| lexer.eat_close_brace()) {
                Some(_) => {
                    let node = AST::expansion(
                        ExpansionKind::Braced {
                            name,
                            default: Some(WordNode {
                                parts: Vec::new(),
                                span: Span::point(start),
                            }),
                        },
                        Span::new(opener.start, self.last_end()),
                    );
                    return Ok(node);
                }
                None => Some(self.parse_word()?),
            }
        } else {
            None
        };

        if self.raw(|lexer| lexer.eat_close_brace()).is_none() {
            let token = self.peek(LexMode::Command);
            if token.token_type != TokenType::Eof {
                return Err(SyntaxError::UnexpectedToken {
                    found: token.describe(),
                    expected: "`}`".to_string(),
                    span: token.span(),
                });
            }
            self.report(LexError::UnterminatedExpansion {
                expected: '}',
                span: opener.span(),
            });
        }

        Ok(AST::expansion(
            ExpansionKind::Braced { name, default },
            Span::new(opener.start, self.last_end()),
        ))
    }
}
