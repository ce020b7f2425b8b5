//! Compound Statement Parser
//!
//! Handles blocks and control flow: if, while, for and case.
//!
//!   block     ::= '{' statement_list '}'
//!   condition ::= '(' expr ')' | command_call
//!   if        ::= 'if' condition block ('elif' condition block)* ('else' block)?
//!   while     ::= 'while' condition block
//!   for       ::= 'for' NAME (',' NAME)* 'in' iterable block
//!   iterable  ::= '(' expr '..<' expr ')' | '(' expr ')' | word+
//!   case      ::= 'case' '(' expr ')' '{' (pattern block)* '}'
//!   pattern   ::= '(' 'else' ')' | '(' expr ')' | eggex | word ('|' word)*

use tracing::debug;

use crate::ast::types::{
    BlockNode, CaseArmNode, CaseConditionNode, CaseNode, ConditionNode, ExpressionNode,
    ForIterableNode, ForNode, GlobNode, IfBranchNode, IfNode, RangeNode, Span, StatementNode,
    WhileNode, AST,
};
use crate::parser::errors::SyntaxError;
use crate::parser::lexer::{LexMode, TokenType};
use crate::parser::parser::Parser;
use crate::parser::types::is_word_piece_token;

const CMD: LexMode = LexMode::Command;
const EXPR: LexMode = LexMode::Expression;

impl<'a> Parser<'a> {
    /// `{ statements }`. A missing `}` is reported and the block kept.
    pub(crate) fn parse_block(&mut self) -> Result<BlockNode, SyntaxError> {
        let open = self.expect(CMD, TokenType::LBrace, "`{`")?;
        let statements = self.nested(|p| {
            Ok(p.unbracketed(|p| p.parse_statement_list(Some(TokenType::RBrace))))
        })?;
        let end = self.finish_block(open.span());
        let span = Span::new(open.start, end);
        if statements.is_empty() {
            self.report(SyntaxError::EmptyBlock { span });
        }
        Ok(AST::block(statements, span))
    }

    /// Consume the `}` closing a block opened at `open`; returns the end offset
    fn finish_block(&mut self, open: Span) -> usize {
        match self.expect_closing(CMD, TokenType::RBrace, open) {
            Ok(close) => close.end,
            Err(error) => {
                self.report(error);
                self.last_end()
            }
        }
    }

    /// `( expr )` with the parentheses consumed
    fn parse_parenthesized(&mut self) -> Result<ExpressionNode, SyntaxError> {
        let open = self.expect(CMD, TokenType::LParen, "`(`")?;
        self.bracketed(|p| {
            let expression = p.parse_expression()?;
            p.expect_closing(EXPR, TokenType::RParen, open.span())?;
            Ok(expression)
        })
    }

    /// `(expr)` or a command whose exit status is tested
    fn parse_condition(&mut self) -> Result<ConditionNode, SyntaxError> {
        if self.peek_type(CMD) == TokenType::LParen {
            let expression = self.parse_parenthesized()?;
            return Ok(ConditionNode::Expression(expression));
        }
        let command = self.parse_command_call(false)?;
        Ok(ConditionNode::Command(Box::new(command)))
    }

    pub(crate) fn parse_if(&mut self) -> Result<StatementNode, SyntaxError> {
        let keyword = self.advance(CMD);
        let mut branches = Vec::new();

        let condition = self.parse_condition()?;
        let body = self.parse_block()?;
        branches.push(IfBranchNode {
            span: Span::new(keyword.start, body.span.end),
            condition,
            body,
        });

        let mut else_body = None;
        loop {
            // `elif` and `else` may start on a following line
            let checkpoint = self.checkpoint();
            self.skip_newlines();
            if self.peek_word("elif") {
                let elif = self.advance(CMD);
                let condition = self.parse_condition()?;
                let body = self.parse_block()?;
                branches.push(IfBranchNode {
                    span: Span::new(elif.start, body.span.end),
                    condition,
                    body,
                });
            } else if self.peek_word("else") {
                self.advance(CMD);
                else_body = Some(self.parse_block()?);
                break;
            } else {
                self.restore(checkpoint);
                break;
            }
        }

        Ok(StatementNode::If(IfNode {
            branches,
            else_body,
            span: Span::new(keyword.start, self.last_end()),
        }))
    }

    pub(crate) fn parse_while(&mut self) -> Result<StatementNode, SyntaxError> {
        let keyword = self.advance(CMD);
        let condition = self.parse_condition()?;
        let body = self.parse_block()?;
        Ok(StatementNode::While(WhileNode {
            span: Span::new(keyword.start, body.span.end),
            condition,
            body,
        }))
    }

    pub(crate) fn parse_for(&mut self) -> Result<StatementNode, SyntaxError> {
        let keyword = self.advance(CMD);

        let mut names = vec![self.parse_binding_name()?];
        while self.peek_type(EXPR) == TokenType::Comma {
            self.advance(EXPR);
            names.push(self.parse_binding_name()?);
        }

        if !self.peek_word("in") {
            return Err(self.unexpected(CMD, "`in`"));
        }
        self.advance(CMD);

        let iterable = if self.peek_type(CMD) == TokenType::LParen {
            let open = self.advance(CMD);
            self.bracketed(|p| {
                let first = p.parse_expression()?;
                let iterable = if p.peek_type(EXPR) == TokenType::RangeExclusive {
                    p.advance(EXPR);
                    let end = p.parse_expression()?;
                    ForIterableNode::Range(RangeNode {
                        span: first.span().to(end.span()),
                        start: first,
                        end,
                    })
                } else {
                    ForIterableNode::Expression(first)
                };
                p.expect_closing(EXPR, TokenType::RParen, open.span())?;
                Ok(iterable)
            })?
        } else {
            let mut words = Vec::new();
            while is_word_piece_token(self.peek_type(CMD)) {
                words.push(self.parse_word()?);
            }
            if words.is_empty() {
                return Err(self.unexpected(CMD, "loop items"));
            }
            ForIterableNode::Words(words)
        };

        let body = self.parse_block()?;
        Ok(StatementNode::For(ForNode {
            names,
            iterable,
            span: Span::new(keyword.start, body.span.end),
            body,
        }))
    }

    pub(crate) fn parse_case(&mut self) -> Result<StatementNode, SyntaxError> {
        let keyword = self.advance(CMD);
        let subject = self.parse_parenthesized()?;
        let open = self.expect(CMD, TokenType::LBrace, "`{` after case subject")?;

        let arms = self.nested(|p| Ok(p.parse_case_arms()))?;
        let end = self.finish_block(open.span());

        Ok(StatementNode::Case(CaseNode {
            subject,
            arms,
            span: Span::new(keyword.start, end),
        }))
    }

    /// Arms up to the closing `}`. A malformed arm is reported and skipped.
    fn parse_case_arms(&mut self) -> Vec<CaseArmNode> {
        let mut arms = Vec::new();
        loop {
            self.skip_separators();
            if matches!(self.peek_type(CMD), TokenType::RBrace | TokenType::Eof) {
                break;
            }
            let start = self.last_end();
            match self.parse_case_arm() {
                Ok(arm) => arms.push(arm),
                Err(error) => {
                    self.report(error);
                    self.skip_case_arm();
                    debug!(target: "parse", start, end = self.last_end(), "skipped case arm");
                }
            }
        }
        arms
    }

    fn parse_case_arm(&mut self) -> Result<CaseArmNode, SyntaxError> {
        let token = self.peek(CMD);
        let condition = match token.token_type {
            TokenType::LParen => {
                let open = self.advance(CMD);
                let next = self.peek(EXPR);
                if next.token_type == TokenType::Identifier && next.value == "else" {
                    self.advance(EXPR);
                    let close = self.expect_closing(EXPR, TokenType::RParen, open.span())?;
                    CaseConditionNode::Else(Span::new(open.start, close.end))
                } else {
                    let expression = self.bracketed(|p| {
                        let expression = p.parse_expression()?;
                        p.expect_closing(EXPR, TokenType::RParen, open.span())?;
                        Ok(expression)
                    })?;
                    CaseConditionNode::Expression(expression)
                }
            }
            TokenType::Word if token.value == "/" => {
                self.advance(CMD);
                CaseConditionNode::Eggex(self.read_eggex(token.span()))
            }
            t if is_word_piece_token(t) => {
                let mut patterns = vec![self.parse_word()?];
                while self.peek_type(CMD) == TokenType::Pipe {
                    self.advance(CMD);
                    patterns.push(self.parse_word()?);
                }
                let span = match (patterns.first(), patterns.last()) {
                    (Some(first), Some(last)) => first.span.to(last.span),
                    _ => token.span(),
                };
                CaseConditionNode::Glob(GlobNode { patterns, span })
            }
            _ => return Err(self.unexpected(CMD, "case pattern")),
        };

        let body = self.parse_block()?;
        Ok(CaseArmNode {
            span: Span::new(token.start, body.span.end),
            condition,
            body,
        })
    }

    /// Skip through the end of the current arm's block, stopping before the
    /// `}` that closes the case itself
    fn skip_case_arm(&mut self) {
        let mut depth: usize = 0;
        loop {
            let token = self.peek(CMD);
            match token.token_type {
                TokenType::Eof => return,
                TokenType::RBrace if depth == 0 => return,
                TokenType::RBrace => {
                    self.advance(CMD);
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                TokenType::LBrace => {
                    self.advance(CMD);
                    depth += 1;
                }
                TokenType::StringStart(variant, triple) => {
                    self.advance(CMD);
                    self.parse_string_body(variant, triple, token.span());
                }
                _ => {
                    self.advance(CMD);
                }
            }
        }
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
        assert_eq!(program.statements.len(), 1, "{:?}", program.statements);
        program.statements.into_iter().next().unwrap()
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

    #[test]
    fn test_if_elif_else() {
        let source = "if (x > 1) {\n  echo big\n} elif test -z $x {\n  echo empty\n}\nelse {\n  echo small\n}";
        let StatementNode::If(node) = statement(source) else {
            panic!("expected if");
        };
        assert_eq!(node.branches.len(), 2);
        assert_matches!(&node.branches[0].condition, ConditionNode::Expression(ExpressionNode::Binary(_)));
        assert_matches!(&node.branches[1].condition, ConditionNode::Command(c)
            if c.name.as_bare_text().as_deref() == Some("test") && c.arguments.len() == 2);
        assert!(node.else_body.is_some());
        assert_eq!(node.span, Span::new(0, source.len()));
    }

    #[test]
    fn test_if_followed_by_statement() {
        let (program, diagnostics) = parse("if (a) { b }\necho next");
        assert!(diagnostics.is_empty());
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn test_while() {
        let StatementNode::While(node) = statement("while (i < 10) { setvar i += 1 }") else {
            panic!("expected while");
        };
        assert_eq!(node.body.statements.len(), 1);
    }

    #[test]
    fn test_for_range() {
        let StatementNode::For(node) = statement("for i in (0 ..< n) { echo $i }") else {
            panic!("expected for");
        };
        assert_eq!(node.names.len(), 1);
        assert_matches!(&node.iterable, ForIterableNode::Range(r)
            if matches!(&r.end, ExpressionNode::Variable(v) if v.name == "n"));
    }

    #[test]
    fn test_for_expression_and_names() {
        let StatementNode::For(node) = statement("for k, v in (mydict) { echo $k }") else {
            panic!("expected for");
        };
        assert_eq!(node.names.len(), 2);
        assert_eq!(node.names[1].name, "v");
        assert_matches!(&node.iterable, ForIterableNode::Expression(ExpressionNode::Variable(_)));
    }

    #[test]
    fn test_for_words() {
        let StatementNode::For(node) = statement("for f in *.py 'a b' $dir/x {\n  echo $f\n}") else {
            panic!("expected for");
        };
        assert_matches!(&node.iterable, ForIterableNode::Words(w) if w.len() == 3);
    }

    #[test]
    fn test_for_requires_in() {
        let errors = syntax_errors("for x (y) { echo }");
        assert_matches!(&errors[0], SyntaxError::UnexpectedToken { expected, .. } if expected == "`in`");
    }

    #[test]
    fn test_case_arms() {
        let source = "case (x) {\n  *.py | *.sh { echo script }\n  (42) { echo answer }\n  / d+ / { echo digits }\n  (else) { echo other }\n}";
        let StatementNode::Case(node) = statement(source) else {
            panic!("expected case");
        };
        assert_eq!(node.arms.len(), 4);
        assert_matches!(&node.arms[0].condition, CaseConditionNode::Glob(g) if g.patterns.len() == 2);
        assert_matches!(&node.arms[1].condition, CaseConditionNode::Expression(_));
        assert_matches!(&node.arms[2].condition, CaseConditionNode::Eggex(e) if e.pattern == "d+");
        assert_matches!(&node.arms[3].condition, CaseConditionNode::Else(_));
    }

    #[test]
    fn test_case_else_need_not_be_last() {
        let StatementNode::Case(node) = statement("case (x) { (else) { echo a }\n b { echo b } }") else {
            panic!("expected case");
        };
        assert_eq!(node.arms.len(), 2);
        assert_matches!(&node.arms[0].condition, CaseConditionNode::Else(_));
    }

    #[test]
    fn test_malformed_case_arm_is_skipped() {
        let (program, diagnostics) =
            parse("case (x) {\n  (1 +) { echo bad }\n  a { echo good }\n}\necho after");
        assert_eq!(diagnostics.iter().filter(|d| d.is_error()).count(), 1);
        assert_eq!(program.statements.len(), 2);
        let StatementNode::Case(node) = &program.statements[0] else {
            panic!("expected case");
        };
        assert_eq!(node.arms.len(), 1);
    }

    #[test]
    fn test_empty_block_is_reported() {
        let (program, diagnostics) = parse("while (true) { }");
        assert_matches!(&program.statements[0], StatementNode::While(_));
        assert_matches!(
            &diagnostics[0].kind,
            DiagnosticKind::Syntax(SyntaxError::EmptyBlock { span }) if *span == Span::new(13, 16)
        );
    }

    #[test]
    fn test_unclosed_block_anchors_at_opener() {
        let (program, diagnostics) = parse("if (x) {\n  echo hi\n");
        assert_matches!(&program.statements[0], StatementNode::If(_));
        assert_matches!(
            &diagnostics[0].kind,
            DiagnosticKind::Syntax(SyntaxError::UnclosedBlock { span }) if *span == Span::new(7, 8)
        );
    }

    #[test]
    fn test_unclosed_condition_paren() {
        let errors = syntax_errors("while (x");
        assert_matches!(&errors[0], SyntaxError::UnclosedParen { span } if *span == Span::new(6, 7));
    }

    #[test]
    fn test_nested_blocks_respect_depth_limit() {
        let options = crate::parser::ParserOptions {
            max_depth: 8,
            ..Default::default()
        };
        let source = format!("{}echo{}", "if (x) { ".repeat(10), " }".repeat(10));
        let (_, diagnostics) = crate::parser::parse_with_options(&source, &options);
        assert!(diagnostics.iter().any(|d| matches!(
            d.kind,
            DiagnosticKind::Syntax(SyntaxError::NestingTooDeep { limit: 8, .. })
        )));
    }
}
