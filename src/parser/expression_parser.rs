//! Expression Parser
//!
//! Precedence climbing over the ordered table in `types::BINARY_PRECEDENCE`.
//!
//! Binding strength, loosest to tightest:
//!   binary operators (table order, all left-associative)
//!   unary prefix: not & + -   (applied once, no chaining)
//!   postfix: .name  [index]  .name(args)  ->name(args)  name(args)
//!   primary: literals, variables, expansions, ( expr )

use crate::ast::types::{
    ArgumentListNode, BooleanLiteralNode, CharLiteralNode, DictEntryNode, DictKeyNode,
    DictLiteralNode, EggexLiteralNode, ExpressionNode, IdentifierNode, ListLiteralNode,
    LiteralListNode, LiteralNode, MethodDispatch, NamedArgumentNode, NullLiteralNode,
    NumberLiteralNode, Radix, Span, UnaryOperator, AST,
};
use crate::parser::errors::{LexError, SyntaxError};
use crate::parser::lexer::{LexMode, Token, TokenType};
use crate::parser::parser::Parser;
use crate::parser::types::{binary_operator, is_reserved_word, is_word_piece_token, precedence};

const EXPR: LexMode = LexMode::Expression;

impl<'a> Parser<'a> {
    /// Parse a full expression
    pub fn parse_expression(&mut self) -> Result<ExpressionNode, SyntaxError> {
        self.nested(|p| p.parse_binary(1))
    }

    /// Parse operators at `min_level` or tighter
    fn parse_binary(&mut self, min_level: usize) -> Result<ExpressionNode, SyntaxError> {
        let mut left = self.parse_unary()?;
        loop {
            let Some(op) = binary_operator(self.peek_type(EXPR)) else {
                break;
            };
            let level = precedence(op);
            if level < min_level {
                break;
            }
            self.advance(EXPR);
            // Left-associative: the right operand only takes tighter operators
            let right = self.parse_binary(level + 1)?;
            left = AST::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<ExpressionNode, SyntaxError> {
        let operator = match self.peek_type(EXPR) {
            TokenType::Not => UnaryOperator::Not,
            TokenType::Amp => UnaryOperator::Reference,
            TokenType::Plus => UnaryOperator::Plus,
            TokenType::Minus => UnaryOperator::Negate,
            _ => return self.parse_postfix(),
        };
        let token = self.advance(EXPR);
        let operand = self.parse_postfix()?;
        Ok(AST::unary(operator, operand, token.start))
    }

    fn parse_postfix(&mut self) -> Result<ExpressionNode, SyntaxError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_type(EXPR) {
                TokenType::Dot => {
                    self.advance(EXPR);
                    let member = self.parse_member_name()?;
                    if self.peek_type(EXPR) == TokenType::LParen {
                        let arguments = self.parse_argument_list()?;
                        expr = AST::method_call(expr, MethodDispatch::Dot, member, arguments);
                    } else {
                        expr = AST::member(expr, member);
                    }
                }
                TokenType::Arrow => {
                    self.advance(EXPR);
                    let method = self.parse_member_name()?;
                    if self.peek_type(EXPR) != TokenType::LParen {
                        return Err(self.unexpected(EXPR, "`(` after method name"));
                    }
                    let arguments = self.parse_argument_list()?;
                    expr = AST::method_call(expr, MethodDispatch::Arrow, method, arguments);
                }
                TokenType::LBracket => {
                    let open = self.advance(EXPR);
                    let index = self.bracketed(|p| {
                        let index = p.parse_expression()?;
                        p.expect_closing(EXPR, TokenType::RBracket, open.span())?;
                        Ok(index)
                    })?;
                    expr = AST::index(expr, index, self.last_end());
                }
                TokenType::LParen => {
                    let ExpressionNode::Variable(variable) = &expr else {
                        break;
                    };
                    let name = AST::identifier(variable.name.clone(), variable.span);
                    let arguments = self.parse_argument_list()?;
                    expr = AST::function_call(name, arguments);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Name after `.` or `->`. Reserved words and keywords are allowed here.
    pub(crate) fn parse_member_name(&mut self) -> Result<IdentifierNode, SyntaxError> {
        let token = self.peek(EXPR);
        match token.token_type {
            TokenType::Identifier
            | TokenType::And
            | TokenType::Or
            | TokenType::Not
            | TokenType::True
            | TokenType::False
            | TokenType::Null => {
                self.advance(EXPR);
                Ok(AST::identifier(token.value.clone(), token.span()))
            }
            _ => Err(SyntaxError::UnexpectedToken {
                found: token.describe(),
                expected: "member name".to_string(),
                span: token.span(),
            }),
        }
    }

    fn parse_primary(&mut self) -> Result<ExpressionNode, SyntaxError> {
        let token = self.peek(EXPR);
        let span = token.span();
        match token.token_type {
            TokenType::Number => {
                self.advance(EXPR);
                Ok(ExpressionNode::Literal(LiteralNode::Number(number_literal(&token))))
            }
            TokenType::True | TokenType::False => {
                self.advance(EXPR);
                Ok(ExpressionNode::Literal(LiteralNode::Boolean(BooleanLiteralNode {
                    value: token.token_type == TokenType::True,
                    span,
                })))
            }
            TokenType::Null => {
                self.advance(EXPR);
                Ok(ExpressionNode::Literal(LiteralNode::Null(NullLiteralNode { span })))
            }
            TokenType::StringStart(variant, triple) => {
                self.advance(EXPR);
                let literal = self.parse_string_body(variant, triple, span);
                Ok(ExpressionNode::Literal(LiteralNode::String(literal)))
            }
            TokenType::CharLiteral => {
                self.advance(EXPR);
                Ok(ExpressionNode::Literal(LiteralNode::Char(CharLiteralNode {
                    raw: token.value.clone(),
                    span,
                })))
            }
            TokenType::Identifier => {
                if is_reserved_word(&token.value) {
                    return Err(SyntaxError::ReservedWordAsIdentifier {
                        word: token.value,
                        span,
                    });
                }
                self.advance(EXPR);
                Ok(AST::variable(token.value, span))
            }
            TokenType::LParen => {
                let open = self.advance(EXPR);
                self.bracketed(|p| {
                    let inner = p.parse_expression()?;
                    p.expect_closing(EXPR, TokenType::RParen, open.span())?;
                    Ok(inner)
                })
            }
            TokenType::LBracket => self.parse_list_literal(),
            TokenType::LBrace => self.parse_dict_literal(),
            TokenType::Slash => self.parse_eggex_literal(),
            TokenType::ColonPipe => self.parse_literal_list(),
            TokenType::DollarName
            | TokenType::DollarBrace
            | TokenType::DollarBracket
            | TokenType::DollarParen
            | TokenType::AtName
            | TokenType::AtBracket
            | TokenType::AtParen
            | TokenType::CaretBracket
            | TokenType::CaretParen => {
                let opener = self.advance(EXPR);
                let expansion = self.parse_expansion(opener)?;
                Ok(ExpressionNode::Expansion(Box::new(expansion)))
            }
            _ => Err(SyntaxError::ExpectedExpression {
                found: token.describe(),
                span,
            }),
        }
    }

    /// [a, b, c]
    fn parse_list_literal(&mut self) -> Result<ExpressionNode, SyntaxError> {
        let open = self.advance(EXPR);
        let elements = self.bracketed(|p| {
            let mut elements = Vec::new();
            while p.peek_type(EXPR) != TokenType::RBracket {
                elements.push(p.parse_expression()?);
                if p.peek_type(EXPR) != TokenType::Comma {
                    break;
                }
                p.advance(EXPR);
            }
            p.expect_closing(EXPR, TokenType::RBracket, open.span())?;
            Ok(elements)
        })?;
        Ok(ExpressionNode::Literal(LiteralNode::List(ListLiteralNode {
            elements,
            span: Span::new(open.start, self.last_end()),
        })))
    }

    /// {name: v, 'key': v, [expr]: v}
    fn parse_dict_literal(&mut self) -> Result<ExpressionNode, SyntaxError> {
        let open = self.advance(EXPR);
        let entries = self.bracketed(|p| {
            let mut entries = Vec::new();
            while p.peek_type(EXPR) != TokenType::RBrace {
                entries.push(p.parse_dict_entry()?);
                if p.peek_type(EXPR) != TokenType::Comma {
                    break;
                }
                p.advance(EXPR);
            }
            p.expect_closing(EXPR, TokenType::RBrace, open.span())?;
            Ok(entries)
        })?;
        Ok(ExpressionNode::Literal(LiteralNode::Dict(DictLiteralNode {
            entries,
            span: Span::new(open.start, self.last_end()),
        })))
    }

    fn parse_dict_entry(&mut self) -> Result<DictEntryNode, SyntaxError> {
        let token = self.peek(EXPR);
        let key = match token.token_type {
            TokenType::StringStart(variant, triple) => {
                self.advance(EXPR);
                DictKeyNode::String(self.parse_string_body(variant, triple, token.span()))
            }
            TokenType::LBracket => {
                let open = self.advance(EXPR);
                let key = self.parse_expression()?;
                self.expect_closing(EXPR, TokenType::RBracket, open.span())?;
                DictKeyNode::Expression(key)
            }
            _ => DictKeyNode::Name(self.parse_member_name()?),
        };
        self.expect(EXPR, TokenType::Colon, "`:` after dict key")?;
        let value = self.parse_expression()?;
        Ok(DictEntryNode {
            key,
            span: Span::new(token.start, value.span().end),
            value,
        })
    }

    /// / pattern /
    fn parse_eggex_literal(&mut self) -> Result<ExpressionNode, SyntaxError> {
        let open = self.advance(EXPR);
        let eggex = self.read_eggex(open.span());
        Ok(ExpressionNode::Literal(LiteralNode::Eggex(eggex)))
    }

    /// Read an eggex body after its opening slash has been consumed
    pub(crate) fn read_eggex(&mut self, open: Span) -> EggexLiteralNode {
        match self.raw(|lexer| lexer.read_eggex_body(open)) {
            Ok((pattern, end)) => EggexLiteralNode {
                pattern,
                span: Span::new(open.start, end),
            },
            Err(error) => {
                self.report(error);
                let end = self.last_end();
                let pattern = self
                    .source()
                    .get(open.end..end)
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                EggexLiteralNode {
                    pattern,
                    span: Span::new(open.start, end),
                }
            }
        }
    }

    /// :| word word |
    fn parse_literal_list(&mut self) -> Result<ExpressionNode, SyntaxError> {
        let open = self.advance(EXPR);
        let mut words = Vec::new();
        loop {
            let token = self.peek(LexMode::Command);
            match token.token_type {
                TokenType::Pipe => {
                    self.advance(LexMode::Command);
                    break;
                }
                TokenType::Newline => {
                    self.advance(LexMode::Command);
                }
                TokenType::Eof => {
                    self.report(LexError::UnterminatedLiteralList { span: open.span() });
                    break;
                }
                t if is_word_piece_token(t) => words.push(self.parse_word()?),
                _ => return Err(self.unexpected(LexMode::Command, "word or `|`")),
            }
        }
        Ok(ExpressionNode::Literal(LiteralNode::LiteralList(LiteralListNode {
            words,
            span: Span::new(open.start, self.last_end()),
        })))
    }

    /// (a, b; name=value), shared by function calls, method calls and
    /// command call-style arguments
    pub(crate) fn parse_argument_list(&mut self) -> Result<ArgumentListNode, SyntaxError> {
        let open = self.expect(EXPR, TokenType::LParen, "`(`")?;
        let (positional, named) = self.bracketed(|p| {
            let mut positional = Vec::new();
            let mut named = Vec::new();
            while !matches!(p.peek_type(EXPR), TokenType::RParen | TokenType::Semicolon) {
                positional.push(p.parse_expression()?);
                if p.peek_type(EXPR) != TokenType::Comma {
                    break;
                }
                p.advance(EXPR);
            }
            if p.peek_type(EXPR) == TokenType::Semicolon {
                p.advance(EXPR);
                while p.peek_type(EXPR) != TokenType::RParen {
                    let name = p.parse_binding_name()?;
                    p.expect(EXPR, TokenType::Assign, "`=` after argument name")?;
                    let value = p.parse_expression()?;
                    named.push(NamedArgumentNode {
                        span: Span::new(name.span.start, value.span().end),
                        name,
                        value,
                    });
                    if p.peek_type(EXPR) != TokenType::Comma {
                        break;
                    }
                    p.advance(EXPR);
                }
            }
            p.expect_closing(EXPR, TokenType::RParen, open.span())?;
            Ok((positional, named))
        })?;
        Ok(ArgumentListNode {
            positional,
            named,
            span: Span::new(open.start, self.last_end()),
        })
    }
}

fn number_literal(token: &Token) -> NumberLiteralNode {
    let lower = token.value.to_ascii_lowercase();
    let radix = if lower.starts_with("0x") {
        Radix::Hex
    } else if lower.starts_with("0o") {
        Radix::Octal
    } else if lower.starts_with("0b") {
        Radix::Binary
    } else {
        Radix::Decimal
    };
    let is_float = radix == Radix::Decimal && (lower.contains('.') || lower.contains('e'));
    NumberLiteralNode {
        raw: token.value.clone(),
        radix,
        is_float,
        span: token.span(),
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::types::*;
    use crate::parser::parse;
    use assert_matches::assert_matches;

    fn expr(source: &str) -> ExpressionNode {
        let input = format!("var _ = {}", source);
        let (program, diagnostics) = parse(&input);
        assert!(
            diagnostics.iter().all(|d| !d.is_error()),
            "unexpected diagnostics for {:?}: {:?}",
            source,
            diagnostics
        );
        match program.statements.into_iter().next() {
            Some(StatementNode::VariableDeclaration(node)) => node.value,
            other => panic!("expected declaration, got {:?}", other),
        }
    }

    fn num(e: &ExpressionNode) -> &str {
        match e {
            ExpressionNode::Literal(LiteralNode::Number(n)) => &n.raw,
            other => panic!("expected number, got {:?}", other),
        }
    }

    fn binary(e: &ExpressionNode) -> &BinaryExpressionNode {
        match e {
            ExpressionNode::Binary(b) => b,
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        let e = expr("1 + 2 * 3");
        let top = binary(&e);
        assert_eq!(top.operator, BinaryOperator::Add);
        assert_eq!(num(&top.left), "1");
        let right = binary(&top.right);
        assert_eq!(right.operator, BinaryOperator::Multiply);
        assert_eq!(num(&right.left), "2");
        assert_eq!(num(&right.right), "3");
    }

    #[test]
    fn test_left_associativity() {
        let e = expr("1 - 2 - 3");
        let top = binary(&e);
        assert_eq!(top.operator, BinaryOperator::Subtract);
        assert_eq!(num(&top.right), "3");
        let left = binary(&top.left);
        assert_eq!(num(&left.left), "1");
        assert_eq!(num(&left.right), "2");
    }

    #[test]
    fn test_power_is_left_associative() {
        let e = expr("2 ** 3 ** 2");
        let top = binary(&e);
        assert_eq!(top.operator, BinaryOperator::Power);
        assert_matches!(&top.left, ExpressionNode::Binary(_));
        assert_eq!(num(&top.right), "2");
    }

    #[test]
    fn test_chain_binds_tighter_than_power() {
        // Documented quirk: `=>` sits above `**`
        let e = expr("a ** b => c");
        let top = binary(&e);
        assert_eq!(top.operator, BinaryOperator::Power);
        assert_eq!(binary(&top.right).operator, BinaryOperator::Chain);
    }

    #[test]
    fn test_logical_and_comparison_levels() {
        let e = expr("a or b and c == d");
        let top = binary(&e);
        assert_eq!(top.operator, BinaryOperator::Or);
        let and = binary(&top.right);
        assert_eq!(and.operator, BinaryOperator::And);
        assert_eq!(binary(&and.right).operator, BinaryOperator::Equal);
    }

    #[test]
    fn test_bitwise_levels() {
        let e = expr("a | b ^ c & d");
        let top = binary(&e);
        assert_eq!(top.operator, BinaryOperator::BitOr);
        let xor = binary(&top.right);
        assert_eq!(xor.operator, BinaryOperator::BitXor);
        assert_eq!(binary(&xor.right).operator, BinaryOperator::BitAnd);
    }

    #[test]
    fn test_match_operators() {
        for (source, op) in [
            ("s ~ pat", BinaryOperator::Match),
            ("s !~ pat", BinaryOperator::NotMatch),
            ("s ~~ pat", BinaryOperator::GlobMatch),
            ("s !~~ pat", BinaryOperator::NotGlobMatch),
            ("a ~== b", BinaryOperator::ApproxEqual),
            ("a === b", BinaryOperator::Identical),
            ("a !== b", BinaryOperator::NotIdentical),
            ("a ++ b", BinaryOperator::Concatenate),
            ("a << b", BinaryOperator::ShiftLeft),
        ] {
            assert_eq!(binary(&expr(source)).operator, op, "{}", source);
        }
    }

    #[test]
    fn test_postfix_chain() {
        let e = expr("a.b[c].d()");
        let ExpressionNode::MethodCall(call) = &e else {
            panic!("expected method call, got {:?}", e);
        };
        assert_eq!(call.method.name, "d");
        assert_eq!(call.dispatch, MethodDispatch::Dot);
        assert!(call.arguments.positional.is_empty());
        let ExpressionNode::Index(index) = &call.receiver else {
            panic!("expected index, got {:?}", call.receiver);
        };
        assert_matches!(&index.index, ExpressionNode::Variable(v) if v.name == "c");
        let ExpressionNode::Member(member) = &index.object else {
            panic!("expected member, got {:?}", index.object);
        };
        assert_eq!(member.member.name, "b");
        assert_matches!(&member.object, ExpressionNode::Variable(v) if v.name == "a");
    }

    #[test]
    fn test_arrow_method_and_function_call() {
        let e = expr("f(x, 1; sep=',')->join()");
        let ExpressionNode::MethodCall(call) = &e else {
            panic!("expected method call, got {:?}", e);
        };
        assert_eq!(call.dispatch, MethodDispatch::Arrow);
        let ExpressionNode::FunctionCall(f) = &call.receiver else {
            panic!("expected function call, got {:?}", call.receiver);
        };
        assert_eq!(f.name.name, "f");
        assert_eq!(f.arguments.positional.len(), 2);
        assert_eq!(f.arguments.named.len(), 1);
        assert_eq!(f.arguments.named[0].name.name, "sep");
    }

    #[test]
    fn test_unary_binds_tighter_than_binary() {
        let e = expr("not a == b");
        let top = binary(&e);
        assert_eq!(top.operator, BinaryOperator::Equal);
        assert_matches!(&top.left, ExpressionNode::Unary(u) if u.operator == UnaryOperator::Not);

        let e = expr("-x * 2");
        let top = binary(&e);
        assert_matches!(&top.left, ExpressionNode::Unary(u) if u.operator == UnaryOperator::Negate);
    }

    #[test]
    fn test_unary_does_not_chain() {
        let (_, diagnostics) = parse("var x = not not y");
        assert!(diagnostics.iter().any(|d| d.is_error()));
    }

    #[test]
    fn test_unary_applies_to_postfix() {
        let e = expr("&a.b");
        let ExpressionNode::Unary(u) = &e else {
            panic!("expected unary, got {:?}", e);
        };
        assert_eq!(u.operator, UnaryOperator::Reference);
        assert_matches!(&u.operand, ExpressionNode::Member(_));
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let e = expr("(1 + 2) * 3");
        let top = binary(&e);
        assert_eq!(top.operator, BinaryOperator::Multiply);
        assert_eq!(binary(&top.left).operator, BinaryOperator::Add);
    }

    #[test]
    fn test_number_literals() {
        let e = expr("0x1F");
        assert_matches!(&e, ExpressionNode::Literal(LiteralNode::Number(n)) if n.radix == Radix::Hex && n.as_i64() == Some(31));
        let e = expr("0b1010");
        assert_matches!(&e, ExpressionNode::Literal(LiteralNode::Number(n)) if n.radix == Radix::Binary && n.as_i64() == Some(10));
        let e = expr("0o17");
        assert_matches!(&e, ExpressionNode::Literal(LiteralNode::Number(n)) if n.radix == Radix::Octal);
        let e = expr("1.5e3");
        assert_matches!(&e, ExpressionNode::Literal(LiteralNode::Number(n)) if n.is_float);
    }

    #[test]
    fn test_keyword_literals() {
        assert_matches!(expr("true"), ExpressionNode::Literal(LiteralNode::Boolean(b)) if b.value);
        assert_matches!(expr("false"), ExpressionNode::Literal(LiteralNode::Boolean(b)) if !b.value);
        assert_matches!(expr("null"), ExpressionNode::Literal(LiteralNode::Null(_)));
    }

    #[test]
    fn test_list_and_dict_literals() {
        let e = expr("[1, 'two', [3],]");
        assert_matches!(&e, ExpressionNode::Literal(LiteralNode::List(l)) if l.elements.len() == 3);

        let e = expr("{name: 'x', 'quoted': 1, [k]: v}");
        let ExpressionNode::Literal(LiteralNode::Dict(d)) = &e else {
            panic!("expected dict, got {:?}", e);
        };
        assert_eq!(d.entries.len(), 3);
        assert_matches!(&d.entries[0].key, DictKeyNode::Name(n) if n.name == "name");
        assert_matches!(&d.entries[1].key, DictKeyNode::String(_));
        assert_matches!(&d.entries[2].key, DictKeyNode::Expression(_));
    }

    #[test]
    fn test_multiline_collections() {
        let e = expr("[\n  1,\n  2\n]");
        assert_matches!(&e, ExpressionNode::Literal(LiteralNode::List(l)) if l.elements.len() == 2);
        let e = expr("{\n  a: 1,\n}");
        assert_matches!(&e, ExpressionNode::Literal(LiteralNode::Dict(d)) if d.entries.len() == 1);
    }

    #[test]
    fn test_eggex_literal() {
        let e = expr("/ d+ '.' d+ /");
        assert_matches!(&e, ExpressionNode::Literal(LiteralNode::Eggex(g)) if g.pattern == "d+ '.' d+");
    }

    #[test]
    fn test_char_literal() {
        assert_matches!(expr(r"\n"), ExpressionNode::Literal(LiteralNode::Char(c)) if c.raw == r"\n");
    }

    #[test]
    fn test_literal_list() {
        let e = expr(":| a b 'c d' |");
        let ExpressionNode::Literal(LiteralNode::LiteralList(list)) = &e else {
            panic!("expected literal list, got {:?}", e);
        };
        assert_eq!(list.words.len(), 3);
        assert_eq!(list.words[0].as_bare_text().as_deref(), Some("a"));
    }

    #[test]
    fn test_expansions_in_expressions() {
        assert_matches!(expr("$(hostname)"), ExpressionNode::Expansion(e)
            if matches!(&e.kind, ExpansionKind::CommandSubstitution { sigil: Sigil::Dollar, .. }));
        assert_matches!(expr("@(ls)"), ExpressionNode::Expansion(e)
            if matches!(&e.kind, ExpansionKind::CommandSubstitution { sigil: Sigil::At, .. }));
        assert_matches!(expr("^[x + 1]"), ExpressionNode::Expansion(e)
            if matches!(&e.kind, ExpansionKind::Indexed { sigil: Sigil::Caret, .. }));
    }

    #[test]
    fn test_reserved_word_as_variable_reference() {
        let (_, diagnostics) = parse("var x = while");
        assert!(diagnostics.iter().any(|d| d.message().contains("reserved word `while`")));
    }

    #[test]
    fn test_reserved_word_as_member_is_allowed() {
        let e = expr("obj.if");
        assert_matches!(&e, ExpressionNode::Member(m) if m.member.name == "if");
    }

    #[test]
    fn test_expected_expression() {
        let (_, diagnostics) = parse("var x = * 2");
        assert!(diagnostics
            .iter()
            .any(|d| d.message().starts_with("expected an expression")));
    }

    #[test]
    fn test_unclosed_bracket_anchors_at_opener() {
        let (_, diagnostics) = parse("var x = [1, 2");
        let d = diagnostics.iter().find(|d| d.is_error()).unwrap();
        assert_eq!(d.message(), "unclosed bracket, expected `]`");
        assert_eq!(d.span, Span::new(8, 9));
    }
}
