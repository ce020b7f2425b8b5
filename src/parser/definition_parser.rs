//! Definition Parser
//!
//! Handles `func` and `proc` definitions, their parameter lists and the
//! `return` statement allowed inside their bodies.
//!
//! Parameter tiers are separated by `;` and always appear in this order:
//!
//!   func: positional ; named
//!   proc: positional ; typed ; named ; block
//!
//! A func's named tier requires at least one positional parameter before
//! the `;`. Proc tiers may be empty. A `...rest` parameter ends its tier and
//! is not allowed in the named or block tiers.

use crate::ast::types::{
    FunctionDefinitionNode, ParameterGroupNode, ParameterListNode, ParameterNode,
    ProcDefinitionNode, ReturnNode, ReturnValue, Span, StatementNode, BlockNode, AST,
};
use crate::parser::errors::SyntaxError;
use crate::parser::lexer::{LexMode, Token, TokenType};
use crate::parser::parser::{DefinitionKind, Parser};
use crate::parser::types::{is_reserved_word, is_word_piece_token};

const CMD: LexMode = LexMode::Command;
const EXPR: LexMode = LexMode::Expression;

fn malformed(reason: &str, span: Span) -> SyntaxError {
    SyntaxError::MalformedParameterList {
        reason: reason.to_string(),
        span,
    }
}

impl<'a> Parser<'a> {
    /// func name(params) { body }
    pub(crate) fn parse_function_definition(&mut self) -> Result<StatementNode, SyntaxError> {
        let keyword = self.advance(CMD);
        let name = self.parse_binding_name()?;
        let open = self.expect(EXPR, TokenType::LParen, "`(` after function name")?;
        let parameters = self.parse_parameter_list(DefinitionKind::Func, &open)?;
        let body = self.parse_definition_body(DefinitionKind::Func)?;
        Ok(StatementNode::FunctionDefinition(FunctionDefinitionNode {
            name,
            parameters,
            span: Span::new(keyword.start, body.span.end),
            body,
        }))
    }

    /// proc name (params)? { body }
    pub(crate) fn parse_proc_definition(&mut self) -> Result<StatementNode, SyntaxError> {
        let keyword = self.advance(CMD);

        let token = self.peek(CMD);
        if token.token_type != TokenType::Word {
            return Err(self.unexpected(CMD, "proc name"));
        }
        if is_reserved_word(&token.value) {
            let span = token.span();
            return Err(SyntaxError::ReservedWordAsIdentifier {
                word: token.value,
                span,
            });
        }
        self.advance(CMD);
        let name = AST::identifier(token.value.clone(), token.span());

        let parameters = if self.peek_type(CMD) == TokenType::LParen {
            let open = self.advance(CMD);
            Some(self.parse_parameter_list(DefinitionKind::Proc, &open)?)
        } else {
            None
        };

        let body = self.parse_definition_body(DefinitionKind::Proc)?;
        Ok(StatementNode::ProcDefinition(ProcDefinitionNode {
            name,
            parameters,
            span: Span::new(keyword.start, body.span.end),
            body,
        }))
    }

    fn parse_definition_body(&mut self, kind: DefinitionKind) -> Result<BlockNode, SyntaxError> {
        let saved = self.definition.replace(kind);
        let body = self.parse_block();
        self.definition = saved;
        body
    }

    /// Tiers after the opening `(`, through the closing `)`
    fn parse_parameter_list(
        &mut self,
        kind: DefinitionKind,
        open: &Token,
    ) -> Result<ParameterListNode, SyntaxError> {
        let max_tiers = match kind {
            DefinitionKind::Func => 2,
            DefinitionKind::Proc => 4,
        };

        self.bracketed(|p| {
            let positional = p.parse_parameter_group(true)?;
            let mut typed = None;
            let mut named = None;
            let mut block = None;

            let mut tier = 1;
            while p.peek_type(EXPR) == TokenType::Semicolon {
                let separator = p.advance(EXPR);
                tier += 1;
                if tier > max_tiers {
                    let reason = match kind {
                        DefinitionKind::Func => "a func takes at most 2 parameter groups",
                        DefinitionKind::Proc => "a proc takes at most 4 parameter groups",
                    };
                    return Err(malformed(reason, separator.span()));
                }
                match (kind, tier) {
                    (DefinitionKind::Func, _) => {
                        if positional.parameters.is_empty() && positional.rest.is_none() {
                            return Err(malformed(
                                "named parameters must follow at least one positional parameter",
                                separator.span(),
                            ));
                        }
                        named = Some(p.parse_parameter_group(false)?);
                    }
                    (DefinitionKind::Proc, 2) => typed = Some(p.parse_parameter_group(true)?),
                    (DefinitionKind::Proc, 3) => named = Some(p.parse_parameter_group(false)?),
                    (DefinitionKind::Proc, _) => block = p.parse_block_parameter()?,
                }
            }

            p.expect_closing(EXPR, TokenType::RParen, open.span())?;
            Ok(ParameterListNode {
                positional,
                typed,
                named,
                block,
                span: Span::new(open.start, p.last_end()),
            })
        })
    }

    /// Comma-separated parameters up to the next `;` or `)`
    fn parse_parameter_group(&mut self, allow_rest: bool) -> Result<ParameterGroupNode, SyntaxError> {
        let begin = self.peek(EXPR).start;
        let mut parameters = Vec::new();
        let mut rest = None;

        loop {
            match self.peek_type(EXPR) {
                TokenType::RParen | TokenType::Semicolon => break,
                TokenType::Ellipsis => {
                    let dots = self.advance(EXPR);
                    if !allow_rest {
                        return Err(malformed(
                            "rest parameter is not allowed among named parameters",
                            dots.span(),
                        ));
                    }
                    let name = self.parse_binding_name()?;
                    rest = Some(ParameterNode {
                        span: Span::new(dots.start, name.span.end),
                        name,
                        default: None,
                    });
                    if self.peek_type(EXPR) == TokenType::Comma {
                        self.advance(EXPR);
                    }
                    let next = self.peek(EXPR);
                    if !matches!(next.token_type, TokenType::RParen | TokenType::Semicolon) {
                        return Err(malformed("rest parameter must come last", next.span()));
                    }
                    break;
                }
                _ => {
                    parameters.push(self.parse_parameter()?);
                    if self.peek_type(EXPR) != TokenType::Comma {
                        break;
                    }
                    self.advance(EXPR);
                }
            }
        }

        Ok(ParameterGroupNode {
            parameters,
            rest,
            span: Span::new(begin, self.last_end().max(begin)),
        })
    }

    /// name or name = default
    fn parse_parameter(&mut self) -> Result<ParameterNode, SyntaxError> {
        let name = self.parse_binding_name()?;
        let mut default = None;
        if self.peek_type(EXPR) == TokenType::Assign {
            self.advance(EXPR);
            default = Some(self.parse_expression()?);
        }
        let end = default.as_ref().map_or(name.span.end, |d| d.span().end);
        Ok(ParameterNode {
            span: Span::new(name.span.start, end),
            name,
            default,
        })
    }

    /// The proc block tier: empty or exactly one parameter
    fn parse_block_parameter(&mut self) -> Result<Option<ParameterNode>, SyntaxError> {
        let token = self.peek(EXPR);
        match token.token_type {
            TokenType::RParen => return Ok(None),
            TokenType::Ellipsis => {
                return Err(malformed(
                    "rest parameter is not allowed for the block parameter",
                    token.span(),
                ))
            }
            _ => {}
        }
        let parameter = self.parse_parameter()?;
        if self.peek_type(EXPR) == TokenType::Comma {
            self.advance(EXPR);
        }
        let next = self.peek(EXPR);
        if next.token_type != TokenType::RParen && next.token_type != TokenType::Semicolon {
            return Err(malformed("only one block parameter is allowed", next.span()));
        }
        Ok(Some(parameter))
    }

    /// `return (expr)` in a func, `return word` in a proc; the value is optional
    pub(crate) fn parse_return(&mut self) -> Result<StatementNode, SyntaxError> {
        let keyword = self.advance(CMD);
        let value = match self.definition {
            Some(DefinitionKind::Func) => {
                if self.peek_type(CMD) == TokenType::LParen {
                    let open = self.advance(CMD);
                    let expression = self.bracketed(|p| {
                        let expression = p.parse_expression()?;
                        p.expect_closing(EXPR, TokenType::RParen, open.span())?;
                        Ok(expression)
                    })?;
                    Some(ReturnValue::Expression(expression))
                } else {
                    None
                }
            }
            _ => {
                if is_word_piece_token(self.peek_type(CMD)) {
                    Some(ReturnValue::Word(self.parse_word()?))
                } else {
                    None
                }
            }
        };
        Ok(StatementNode::Return(ReturnNode {
            value,
            span: Span::new(keyword.start, self.last_end()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::types::*;
    use crate::parser::errors::{DiagnosticKind, SyntaxError};
    use crate::parser::parse;
    use assert_matches::assert_matches;

    fn statement(source: &str) -> StatementNode {
        let (program, diagnostics) = parse(source);
        assert!(
            diagnostics.iter().all(|d| !d.is_error()),
            "unexpected diagnostics for {:?}: {:?}",
            source,
            diagnostics
        );
        program.statements.into_iter().next().unwrap()
    }

    fn function(source: &str) -> FunctionDefinitionNode {
        match statement(source) {
            StatementNode::FunctionDefinition(f) => f,
            other => panic!("expected func, got {:?}", other),
        }
    }

    fn proc_definition(source: &str) -> ProcDefinitionNode {
        match statement(source) {
            StatementNode::ProcDefinition(p) => p,
            other => panic!("expected proc, got {:?}", other),
        }
    }

    fn syntax_errors(source: &str) -> Vec<SyntaxError> {
        parse(source)
            .1
            .into_iter()
            .filter_map(|d| match d.kind {
                DiagnosticKind::Syntax(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    fn names(group: &ParameterGroupNode) -> Vec<&str> {
        group.parameters.iter().map(|p| p.name.name.as_str()).collect()
    }

    #[test]
    fn test_func_positional_and_named() {
        let f = function("func f(a, b; c=1) { return (a) }");
        assert_eq!(f.name.name, "f");
        assert_eq!(names(&f.parameters.positional), vec!["a", "b"]);
        let named = f.parameters.named.as_ref().unwrap();
        assert_eq!(names(named), vec!["c"]);
        assert_matches!(&named.parameters[0].default, Some(ExpressionNode::Literal(LiteralNode::Number(n))) if n.raw == "1");
        assert!(f.parameters.typed.is_none());
        assert!(f.parameters.block.is_none());
    }

    #[test]
    fn test_func_named_tier_needs_positional() {
        let errors = syntax_errors("func f(; a) { return (a) }");
        assert_matches!(&errors[0], SyntaxError::MalformedParameterList { span, .. } if *span == Span::new(7, 8));
    }

    #[test]
    fn test_func_rest_parameter() {
        let f = function("func f(first, ...rest) { return (rest) }");
        assert_eq!(names(&f.parameters.positional), vec!["first"]);
        let rest = f.parameters.positional.rest.as_ref().unwrap();
        assert_eq!(rest.name.name, "rest");
        assert_eq!(rest.span, Span::new(14, 21));
    }

    #[test]
    fn test_rest_parameter_must_be_last() {
        let errors = syntax_errors("func f(...rest, x) { return (x) }");
        assert_matches!(&errors[0], SyntaxError::MalformedParameterList { reason, .. } if reason.contains("last"));
    }

    #[test]
    fn test_rest_parameter_not_allowed_in_named_tier() {
        let errors = syntax_errors("func f(a; ...opts) { return (a) }");
        assert_matches!(&errors[0], SyntaxError::MalformedParameterList { reason, .. } if reason.contains("named"));
    }

    #[test]
    fn test_func_tier_limit() {
        let errors = syntax_errors("func f(a; b; c) { return (a) }");
        assert_matches!(&errors[0], SyntaxError::MalformedParameterList { .. });
    }

    #[test]
    fn test_func_name_is_not_reserved() {
        let errors = syntax_errors("func if() { return (1) }");
        assert_matches!(&errors[0], SyntaxError::ReservedWordAsIdentifier { word, .. } if word == "if");
    }

    #[test]
    fn test_proc_name_is_not_reserved() {
        let errors = syntax_errors("proc while { echo hi }");
        assert_matches!(&errors[0], SyntaxError::ReservedWordAsIdentifier { word, span } if word == "while" && *span == Span::new(5, 10));
    }

    #[test]
    fn test_multiline_parameters() {
        let f = function("func f(\n  a,\n  b = 2,\n) {\n  return (a + b)\n}");
        assert_eq!(names(&f.parameters.positional), vec!["a", "b"]);
    }

    #[test]
    fn test_proc_four_tiers() {
        let p = proc_definition("proc deploy (target, ...more; typed; verbose=false; block) { echo }");
        let params = p.parameters.as_ref().unwrap();
        assert_eq!(names(&params.positional), vec!["target"]);
        assert!(params.positional.rest.is_some());
        assert_eq!(names(params.typed.as_ref().unwrap()), vec!["typed"]);
        assert_eq!(names(params.named.as_ref().unwrap()), vec!["verbose"]);
        assert_eq!(params.block.as_ref().unwrap().name.name, "block");
    }

    #[test]
    fn test_proc_empty_tiers() {
        let p = proc_definition("proc p (;;; b) { echo }");
        let params = p.parameters.as_ref().unwrap();
        assert!(params.positional.parameters.is_empty());
        assert!(params.typed.as_ref().unwrap().parameters.is_empty());
        assert!(params.named.as_ref().unwrap().parameters.is_empty());
        assert!(params.block.is_some());
    }

    #[test]
    fn test_proc_single_block_parameter() {
        let errors = syntax_errors("proc p (;;; a, b) { echo }");
        assert_matches!(&errors[0], SyntaxError::MalformedParameterList { reason, .. } if reason.contains("one block"));
    }

    #[test]
    fn test_proc_without_parameters() {
        let p = proc_definition("proc my-proc {\n  echo hi\n}");
        assert_eq!(p.name.name, "my-proc");
        assert!(p.parameters.is_none());
    }

    #[test]
    fn test_proc_return_word() {
        let p = proc_definition("proc p { return 1 }");
        assert_matches!(
            &p.body.statements[0],
            StatementNode::Return(ReturnNode { value: Some(ReturnValue::Word(w)), .. })
                if w.as_bare_text().as_deref() == Some("1")
        );
    }

    #[test]
    fn test_return_in_nested_block() {
        let f = function("func f(x) {\n  if (x) {\n    return (1)\n  }\n  return\n}");
        let StatementNode::If(node) = &f.body.statements[0] else {
            panic!("expected if");
        };
        assert_matches!(&node.branches[0].body.statements[0], StatementNode::Return(_));
        assert_matches!(&f.body.statements[1], StatementNode::Return(ReturnNode { value: None, .. }));
    }

    #[test]
    fn test_return_scope_ends_with_body() {
        let (program, _) = parse("func f() { return (1) }\nreturn 2");
        assert_matches!(&program.statements[1], StatementNode::CommandCall(_));
    }
}
