//! Command Parser
//!
//! Handles command calls: negation, environment bindings, arguments,
//! redirections, call-style argument lists and trailing blocks.
//!
//!   command_call ::= '!'? (NAME '=' word)* word argument*
//!                    ('(' args ')')? (block redirection*)?
//!   argument     ::= redirection | word
//!   redirection  ::= FD? operator word

use crate::ast::types::{
    ArgumentNode, BooleanLiteralNode, CommandCallNode, EnvBindingNode, LiteralNode,
    NumberLiteralNode, Radix, RedirectionNode, Span, WordNode, WordPart, AST,
};
use crate::parser::errors::{DiagnosticError, SyntaxError};
use crate::parser::lexer::{LexMode, TokenType};
use crate::parser::parser::Parser;
use crate::parser::types::{
    is_argument_end, is_redirection_token, is_reserved_word, is_valid_name, is_word_piece_token,
    redirection_operator,
};
use crate::parser::word_parser::push_word_text;

const CMD: LexMode = LexMode::Command;

/// Split `NAME=rest` into the name and the byte offset of `rest`
fn split_env_binding(text: &str) -> Option<(&str, usize)> {
    let eq = text.find('=')?;
    let name = &text[..eq];
    if !is_valid_name(name) {
        return None;
    }
    Some((name, eq + 1))
}

/// Single-part words that spell a number, boolean, string or expansion
/// become literal arguments; everything else stays a word.
fn classify_argument(word: WordNode) -> ArgumentNode {
    if word.parts.len() != 1 {
        return ArgumentNode::Word(word);
    }
    let span = word.span;
    if let WordPart::Bare(bare) = &word.parts[0] {
        if !bare.value.is_empty() && bare.value.bytes().all(|b| b.is_ascii_digit()) {
            return ArgumentNode::Literal(LiteralNode::Number(NumberLiteralNode {
                raw: bare.value.clone(),
                radix: Radix::Decimal,
                is_float: false,
                span,
            }));
        }
        if bare.value == "true" || bare.value == "false" {
            return ArgumentNode::Literal(LiteralNode::Boolean(BooleanLiteralNode {
                value: bare.value == "true",
                span,
            }));
        }
    }
    let mut parts = word.parts;
    match parts.pop() {
        Some(WordPart::String(literal)) => ArgumentNode::Literal(LiteralNode::String(literal)),
        Some(WordPart::Expansion(expansion)) => ArgumentNode::Expansion(expansion),
        Some(part) => ArgumentNode::Word(WordNode {
            parts: vec![part],
            span,
        }),
        None => ArgumentNode::Word(WordNode { parts, span }),
    }
}

impl<'a> Parser<'a> {
    /// Parse a command call. `allow_block` is false where a following `{`
    /// belongs to an enclosing construct (`if`/`while` conditions).
    pub(crate) fn parse_command_call(
        &mut self,
        allow_block: bool,
    ) -> Result<CommandCallNode, SyntaxError> {
        let start = self.peek(CMD).start;

        let negated = self.peek_word("!");
        if negated {
            self.advance(CMD);
        }

        let mut env_bindings = Vec::new();
        while let Some(binding) = self.parse_env_binding()? {
            env_bindings.push(binding);
        }
        if !env_bindings.is_empty() && is_argument_end(self.peek_type(CMD)) {
            return Err(SyntaxError::MissingCommand {
                span: Span::new(start, self.last_end()),
            });
        }

        let name = self.parse_word()?;
        if let Some(text) = name.as_bare_text() {
            if is_reserved_word(&text) {
                return Err(SyntaxError::ReservedWordAsIdentifier {
                    word: text,
                    span: name.span,
                });
            }
        }

        let mut arguments = Vec::new();
        loop {
            let token_type = self.peek_type(CMD);
            if is_argument_end(token_type) {
                break;
            }
            if is_redirection_token(token_type) {
                let start = self.peek(CMD).start;
                let redirection = self.parse_redirection(None, start)?;
                arguments.push(ArgumentNode::Redirection(redirection));
                continue;
            }
            if !is_word_piece_token(token_type) {
                return Err(self.unexpected(CMD, "argument"));
            }
            if let Some(redirection) = self.parse_fd_redirection()? {
                arguments.push(ArgumentNode::Redirection(redirection));
                continue;
            }
            let word = self.parse_word()?;
            arguments.push(classify_argument(word));
        }

        let mut call_arguments = None;
        let paren = self.peek(CMD);
        if paren.token_type == TokenType::LParen {
            if paren.immediate {
                self.report(DiagnosticError::AmbiguousCallArguments {
                    span: paren.span(),
                });
            }
            call_arguments = Some(self.parse_argument_list()?);
        }

        let mut block = None;
        let mut block_redirections = Vec::new();
        if allow_block && self.peek_type(CMD) == TokenType::LBrace {
            block = Some(self.parse_block()?);
            loop {
                let token = self.peek(CMD);
                if is_redirection_token(token.token_type) {
                    block_redirections.push(self.parse_redirection(None, token.start)?);
                } else if let Some(redirection) = self.parse_fd_redirection()? {
                    block_redirections.push(redirection);
                } else {
                    break;
                }
            }
        }

        Ok(CommandCallNode {
            negated,
            env_bindings,
            name,
            arguments,
            call_arguments,
            block,
            block_redirections,
            span: Span::new(start, self.last_end()),
        })
    }

    /// `NAME=value` with no space around `=`
    fn parse_env_binding(&mut self) -> Result<Option<EnvBindingNode>, SyntaxError> {
        let token = self.peek(CMD);
        if token.token_type != TokenType::Word {
            return Ok(None);
        }
        let Some((name, value_offset)) = split_env_binding(&token.value) else {
            return Ok(None);
        };
        let name = AST::identifier(name, Span::new(token.start, token.start + value_offset - 1));
        self.advance(CMD);

        let mut parts = Vec::new();
        push_word_text(&mut parts, &token.value[value_offset..], token.start + value_offset);
        self.extend_word(&mut parts, true)?;
        let value = if parts.is_empty() {
            WordNode {
                parts,
                span: Span::point(token.end),
            }
        } else {
            AST::word(parts)
        };

        Ok(Some(EnvBindingNode {
            span: Span::new(token.start, value.span.end.max(token.end)),
            name,
            value,
        }))
    }

    /// A digit word directly followed by a redirection operator: `2>&1`
    fn parse_fd_redirection(&mut self) -> Result<Option<RedirectionNode>, SyntaxError> {
        let token = self.peek(CMD);
        if token.token_type != TokenType::Word
            || token.value.is_empty()
            || !token.value.bytes().all(|b| b.is_ascii_digit())
        {
            return Ok(None);
        }
        let checkpoint = self.checkpoint();
        self.advance(CMD);
        let next = self.peek(CMD);
        if next.immediate && is_redirection_token(next.token_type) {
            let Ok(fd) = token.value.parse::<u32>() else {
                return Err(SyntaxError::BadRedirectionTarget {
                    operator: next.value,
                    span: token.span(),
                });
            };
            return self.parse_redirection(Some(fd), token.start).map(Some);
        }
        self.restore(checkpoint);
        Ok(None)
    }

    /// Parse an operator and its target; `start` covers any fd prefix
    fn parse_redirection(
        &mut self,
        fd: Option<u32>,
        start: usize,
    ) -> Result<RedirectionNode, SyntaxError> {
        let op_token = self.peek(CMD);
        let Some(operator) = redirection_operator(op_token.token_type) else {
            return Err(self.unexpected(CMD, "redirection operator"));
        };
        self.advance(CMD);

        let target_token = self.peek(CMD);
        if !is_word_piece_token(target_token.token_type) {
            return Err(SyntaxError::BadRedirectionTarget {
                operator: operator.as_str().to_string(),
                span: target_token.span(),
            });
        }
        let target = self.parse_word()?;
        Ok(RedirectionNode {
            fd,
            operator,
            span: Span::new(start, target.span.end),
            target,
        })
    }
}
