//! Recursive Descent Parser for YSH
//!
//! This module parses YSH source into an AST. The parser pulls tokens from
//! the lexer on demand, choosing the lexical mode (command or expression)
//! per pull, and keeps a single token of lookahead.
//!
//! Grammar (simplified):
//!   program      ::= (statement terminator)*
//!   statement    ::= element ('|' element)*
//!   element      ::= declaration | definition | control_flow | return
//!                  | command_call
//!   declaration  ::= 'var' NAME '=' expr
//!                  | ('setvar' | 'setglobal') NAME accessor* ('=' | '+=') expr
//!                  | 'const' NAME '=' expr
//!                  | NAME '=' expr
//!   terminator   ::= ';' | ';;' | '&' | NEWLINE
//!
//! Sub-grammars live in `compound_parser.rs` (blocks, control flow),
//! `definition_parser.rs` (func/proc), `command_parser.rs` (command calls),
//! `expression_parser.rs`, `word_parser.rs` and `expansion_parser.rs`.
//!
//! Errors never abort the parse: statement loops record the diagnostic,
//! insert an error node and skip to the next terminator.

use tracing::debug;

use crate::ast::types::{
    AccessorNode, AssignmentKeyword, AssignmentOperator, ConstantDeclarationNode, ErrorNode,
    IdentifierNode, ProgramNode, Span, StatementNode, VariableAssignmentNode,
    VariableDeclarationNode, AST,
};
use crate::parser::errors::{Diagnostic, LexError, SyntaxError};
use crate::parser::lexer::{LexMode, Lexer, Token, TokenType};
use crate::parser::types::{is_reserved_word, is_terminator_token, is_valid_name, ParserOptions};

/// Which definition body the parser is inside, for `return` handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DefinitionKind {
    Func,
    Proc,
}

/// Cached lookahead token plus the lexical errors hit while producing it
struct Lookahead {
    mode: LexMode,
    skip_newlines: bool,
    token: Token,
    errors: Vec<LexError>,
}

/// Saved parser position for speculative parsing
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    last_end: usize,
    diagnostics: usize,
}

fn lex_lookahead(lexer: &mut Lexer<'_>, start: usize, mode: LexMode, skip_newlines: bool) -> Lookahead {
    lexer.reset(start);
    let mut errors = Vec::new();
    let token = loop {
        match lexer.next_token(mode) {
            Ok(token) if skip_newlines && token.token_type == TokenType::Newline => continue,
            Ok(token) => break token,
            Err(e) => errors.push(e),
        }
    };
    Lookahead {
        mode,
        skip_newlines,
        token,
        errors,
    }
}

/// Main parser struct
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    options: ParserOptions,
    lookahead: Option<Lookahead>,
    /// End offset of the last consumed token
    last_end: usize,
    diagnostics: Vec<Diagnostic>,
    dropped_diagnostics: usize,
    /// Open expression brackets; newlines are insignificant while non-zero
    pub(crate) nesting: usize,
    depth: usize,
    /// Closers expected by the enclosing statement lists
    closers: Vec<TokenType>,
    pub(crate) definition: Option<DefinitionKind>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, options: ParserOptions) -> Self {
        Parser {
            lexer: Lexer::new(source),
            options,
            lookahead: None,
            last_end: 0,
            diagnostics: Vec::new(),
            dropped_diagnostics: 0,
            nesting: 0,
            depth: 0,
            closers: Vec::new(),
            definition: None,
        }
    }

    pub fn source(&self) -> &'a str {
        self.lexer.source()
    }

    /// Parse the whole source as a program
    pub fn parse_program(mut self) -> (ProgramNode, Vec<Diagnostic>) {
        let source_len = self.source().len();
        debug!(target: "parse", input_len = source_len, "parse start");

        let statements = self.parse_statement_list(None);
        // Flush lexical errors buffered with the final lookahead
        self.advance(LexMode::Command);
        let program = AST::program(statements, Span::new(0, source_len));

        if self.dropped_diagnostics > 0 {
            debug!(
                target: "parse",
                dropped = self.dropped_diagnostics,
                "diagnostic limit reached"
            );
        }
        debug!(
            target: "parse",
            statements = program.statements.len(),
            diagnostics = self.diagnostics.len(),
            "parse end"
        );
        (program, self.diagnostics)
    }

    // ===========================================================================
    // HELPER METHODS
    // ===========================================================================

    fn lookahead(&mut self, mode: LexMode) -> &Lookahead {
        let skip_newlines = mode == LexMode::Expression && self.nesting > 0;
        let stale = match &self.lookahead {
            Some(la) => la.mode != mode || la.skip_newlines != skip_newlines,
            None => false,
        };
        if stale {
            self.lookahead = None;
        }
        let lexer = &mut self.lexer;
        let start = self.last_end;
        self.lookahead
            .get_or_insert_with(|| lex_lookahead(lexer, start, mode, skip_newlines))
    }

    pub(crate) fn peek(&mut self, mode: LexMode) -> Token {
        self.lookahead(mode).token.clone()
    }

    pub(crate) fn peek_type(&mut self, mode: LexMode) -> TokenType {
        self.lookahead(mode).token.token_type
    }

    /// True when the next token is a command-mode word spelled exactly `text`
    pub(crate) fn peek_word(&mut self, text: &str) -> bool {
        let token = &self.lookahead(LexMode::Command).token;
        token.token_type == TokenType::Word && token.value == text
    }

    pub(crate) fn advance(&mut self, mode: LexMode) -> Token {
        self.lookahead(mode);
        match self.lookahead.take() {
            Some(la) => {
                for error in la.errors {
                    self.report(error);
                }
                self.last_end = la.token.end;
                self.lexer.reset(la.token.end);
                la.token
            }
            None => Token::new(TokenType::Eof, "", self.last_end, self.last_end, false),
        }
    }

    pub(crate) fn last_end(&self) -> usize {
        self.last_end
    }

    pub(crate) fn expect(
        &mut self,
        mode: LexMode,
        token_type: TokenType,
        expected: &str,
    ) -> Result<Token, SyntaxError> {
        let token = self.peek(mode);
        if token.token_type == token_type {
            Ok(self.advance(mode))
        } else {
            Err(SyntaxError::UnexpectedToken {
                found: token.describe(),
                expected: expected.to_string(),
                span: token.span(),
            })
        }
    }

    /// Consume a closing delimiter; end of input reports the opener as unclosed
    pub(crate) fn expect_closing(
        &mut self,
        mode: LexMode,
        closer: TokenType,
        open: Span,
    ) -> Result<Token, SyntaxError> {
        let token = self.peek(mode);
        if token.token_type == closer {
            return Ok(self.advance(mode));
        }
        if token.token_type == TokenType::Eof {
            return Err(match closer {
                TokenType::RBrace => SyntaxError::UnclosedBlock { span: open },
                TokenType::RBracket => SyntaxError::UnclosedBracket { span: open },
                _ => SyntaxError::UnclosedParen { span: open },
            });
        }
        Err(SyntaxError::UnexpectedToken {
            found: token.describe(),
            expected: format!("`{}`", closer.as_str()),
            span: token.span(),
        })
    }

    pub(crate) fn unexpected(&mut self, mode: LexMode, expected: &str) -> SyntaxError {
        let token = self.peek(mode);
        SyntaxError::UnexpectedToken {
            found: token.describe(),
            expected: expected.to_string(),
            span: token.span(),
        }
    }

    /// Append a diagnostic, respecting the configured limit
    pub(crate) fn report(&mut self, diagnostic: impl Into<Diagnostic>) {
        if self.diagnostics.len() >= self.options.max_diagnostics {
            self.dropped_diagnostics += 1;
            return;
        }
        self.diagnostics.push(diagnostic.into());
    }

    /// Hand the raw cursor to a sub-lexer routine, then resume after it
    pub(crate) fn raw<T>(&mut self, f: impl FnOnce(&mut Lexer<'a>) -> T) -> T {
        self.lookahead = None;
        self.lexer.reset(self.last_end);
        let out = f(&mut self.lexer);
        self.last_end = self.lexer.position();
        out
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            last_end: self.last_end,
            diagnostics: self.diagnostics.len(),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        self.last_end = checkpoint.last_end;
        self.lookahead = None;
        self.lexer.reset(checkpoint.last_end);
        self.diagnostics.truncate(checkpoint.diagnostics);
    }

    /// Run `f` one nesting level deeper, failing past the configured depth
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.depth >= self.options.max_depth {
            let span = Span::point(self.last_end);
            debug!(target: "parse", limit = self.options.max_depth, "nesting limit reached");
            return Err(SyntaxError::NestingTooDeep {
                limit: self.options.max_depth,
                span,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Run `f` one level deeper inside an expression bracket, where newlines are skipped
    pub(crate) fn bracketed<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        self.nested(|p| {
            p.nesting += 1;
            let result = f(p);
            p.nesting -= 1;
            result
        })
    }

    /// Run `f` with statement-level newline handling restored
    pub(crate) fn unbracketed<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.nesting, 0);
        let result = f(self);
        self.nesting = saved;
        result
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.peek_type(LexMode::Command) == TokenType::Newline {
            self.advance(LexMode::Command);
        }
    }

    pub(crate) fn skip_separators(&mut self) {
        while matches!(
            self.peek_type(LexMode::Command),
            TokenType::Newline | TokenType::Semicolon
        ) {
            self.advance(LexMode::Command);
        }
    }

    // ===========================================================================
    // STATEMENT LISTS & RECOVERY
    // ===========================================================================

    /// Parse statements until end of input or, when given, an unconsumed
    /// closing token. Stray closers at top level are reported and skipped.
    pub(crate) fn parse_statement_list(&mut self, closer: Option<TokenType>) -> Vec<StatementNode> {
        let mut statements = Vec::new();
        if let Some(closer) = closer {
            self.closers.push(closer);
        }
        loop {
            self.skip_separators();
            let token = self.peek(LexMode::Command);
            if token.token_type == TokenType::Eof {
                break;
            }
            if Some(token.token_type) == closer {
                break;
            }
            if matches!(token.token_type, TokenType::RBrace | TokenType::RParen) {
                self.advance(LexMode::Command);
                let error = SyntaxError::UnexpectedToken {
                    found: token.describe(),
                    expected: "statement".to_string(),
                    span: token.span(),
                };
                statements.push(StatementNode::Error(AST::error(error.to_string(), token.span())));
                self.report(error);
                continue;
            }

            let start = token.start;
            match self.parse_terminated_statement() {
                Ok(statement) => statements.push(statement),
                Err(error) => {
                    let message = error.to_string();
                    self.report(error);
                    let end = self.recover();
                    debug!(target: "parse", start, end, "recovered from syntax error");
                    statements.push(StatementNode::Error(ErrorNode {
                        message,
                        span: Span::new(start, end.max(start)),
                    }));
                }
            }
        }
        if closer.is_some() {
            self.closers.pop();
        }
        statements
    }

    /// Skip to the next terminator at bracket depth 0 and consume it. Stops
    /// before an unmatched `}` or `)` that an enclosing list is waiting for.
    /// Returns the end of the skipped span.
    fn recover(&mut self) -> usize {
        let mut depth: usize = 0;
        loop {
            let token = self.peek(LexMode::Command);
            match token.token_type {
                TokenType::Eof => return self.last_end,
                t if is_terminator_token(t) && depth == 0 => {
                    let end = self.last_end;
                    self.advance(LexMode::Command);
                    return end;
                }
                TokenType::RBrace | TokenType::RParen if depth == 0 => {
                    if self.closers.contains(&token.token_type) {
                        return self.last_end;
                    }
                    self.advance(LexMode::Command);
                }
                TokenType::LBrace
                | TokenType::LParen
                | TokenType::DollarBrace
                | TokenType::DollarParen
                | TokenType::AtParen
                | TokenType::CaretParen => {
                    depth += 1;
                    self.advance(LexMode::Command);
                }
                TokenType::RBrace | TokenType::RParen => {
                    depth -= 1;
                    self.advance(LexMode::Command);
                }
                TokenType::StringStart(variant, triple) => {
                    self.advance(LexMode::Command);
                    self.parse_string_body(variant, triple, token.span());
                }
                _ => {
                    self.advance(LexMode::Command);
                }
            }
        }
    }

    /// A statement followed by its terminator. `}`, `)` and end of input end
    /// a statement without being consumed.
    fn parse_terminated_statement(&mut self) -> Result<StatementNode, SyntaxError> {
        let statement = self.parse_statement()?;
        let token = self.peek(LexMode::Command);
        match token.token_type {
            t if is_terminator_token(t) => {
                self.advance(LexMode::Command);
                Ok(statement)
            }
            TokenType::RBrace | TokenType::RParen | TokenType::Eof => Ok(statement),
            _ => Err(SyntaxError::MissingTerminator {
                found: token.describe(),
                span: token.span(),
            }),
        }
    }

    // ===========================================================================
    // STATEMENTS
    // ===========================================================================

    /// A statement, including any `|` chain
    pub fn parse_statement(&mut self) -> Result<StatementNode, SyntaxError> {
        self.nested(|p| {
            let mut statement = p.parse_pipeline_element()?;
            while p.peek_type(LexMode::Command) == TokenType::Pipe && is_pipeable(&statement) {
                p.advance(LexMode::Command);
                p.skip_newlines();
                let right = p.parse_pipeline_element()?;
                statement = AST::piped(statement, right);
            }
            Ok(statement)
        })
    }

    fn parse_pipeline_element(&mut self) -> Result<StatementNode, SyntaxError> {
        let token = self.peek(LexMode::Command);
        if token.token_type != TokenType::Word {
            return Ok(StatementNode::CommandCall(self.parse_command_call(true)?));
        }

        match token.value.as_str() {
            "var" => self.parse_variable_declaration(),
            "setvar" => self.parse_variable_assignment(AssignmentKeyword::SetVar),
            "setglobal" => self.parse_variable_assignment(AssignmentKeyword::SetGlobal),
            "const" => self.parse_constant_declaration(),
            "func" => self.parse_function_definition(),
            "proc" => self.parse_proc_definition(),
            "for" => self.parse_for(),
            "while" => self.parse_while(),
            "if" => self.parse_if(),
            "case" => self.parse_case(),
            "return" if self.definition.is_some() => self.parse_return(),
            word @ ("in" | "elif" | "else") => Err(SyntaxError::ReservedWordAsIdentifier {
                word: word.to_string(),
                span: token.span(),
            }),
            word if is_valid_name(word) && self.is_shorthand_constant() => {
                self.parse_shorthand_constant()
            }
            _ => Ok(StatementNode::CommandCall(self.parse_command_call(true)?)),
        }
    }

    /// `name = expr` at statement start: a name, then a standalone `=`
    fn is_shorthand_constant(&mut self) -> bool {
        let checkpoint = self.checkpoint();
        self.advance(LexMode::Command);
        let next = self.peek(LexMode::Command);
        let found = next.token_type == TokenType::Word && next.value == "=" && !next.immediate;
        self.restore(checkpoint);
        found
    }

    /// Name bound by a declaration, parameter or loop; reserved words rejected
    pub(crate) fn parse_binding_name(&mut self) -> Result<IdentifierNode, SyntaxError> {
        let token = self.peek(LexMode::Expression);
        let span = token.span();
        match token.token_type {
            TokenType::Identifier if is_reserved_word(&token.value) => {
                Err(SyntaxError::ReservedWordAsIdentifier {
                    word: token.value,
                    span,
                })
            }
            TokenType::Identifier => {
                self.advance(LexMode::Expression);
                Ok(AST::identifier(token.value, span))
            }
            _ => Err(SyntaxError::UnexpectedToken {
                found: token.describe(),
                expected: "identifier".to_string(),
                span,
            }),
        }
    }

    /// var name = expr
    fn parse_variable_declaration(&mut self) -> Result<StatementNode, SyntaxError> {
        let keyword = self.advance(LexMode::Command);
        let name = self.parse_binding_name()?;
        self.expect(LexMode::Expression, TokenType::Assign, "`=`")?;
        let value = self.parse_expression()?;
        let span = Span::new(keyword.start, value.span().end);
        Ok(StatementNode::VariableDeclaration(VariableDeclarationNode {
            name,
            value,
            span,
        }))
    }

    /// setvar / setglobal name accessor* (= | +=) expr
    fn parse_variable_assignment(
        &mut self,
        keyword: AssignmentKeyword,
    ) -> Result<StatementNode, SyntaxError> {
        let keyword_token = self.advance(LexMode::Command);
        let name = self.parse_binding_name()?;

        let mut accessors = Vec::new();
        loop {
            match self.peek_type(LexMode::Expression) {
                TokenType::Dot => {
                    let dot = self.advance(LexMode::Expression);
                    let member = self.parse_member_name()?;
                    let span = Span::new(dot.start, member.span.end);
                    accessors.push(AccessorNode::Member { member, span });
                }
                TokenType::LBracket => {
                    let open = self.advance(LexMode::Expression);
                    let index = self.bracketed(|p| {
                        let index = p.parse_expression()?;
                        p.expect_closing(LexMode::Expression, TokenType::RBracket, open.span())?;
                        Ok(index)
                    })?;
                    let span = Span::new(open.start, self.last_end);
                    accessors.push(AccessorNode::Index { index, span });
                }
                _ => break,
            }
        }

        let operator = match self.peek_type(LexMode::Expression) {
            TokenType::Assign => AssignmentOperator::Assign,
            TokenType::PlusAssign => AssignmentOperator::AppendAssign,
            _ => return Err(self.unexpected(LexMode::Expression, "`=` or `+=`")),
        };
        self.advance(LexMode::Expression);

        let value = self.parse_expression()?;
        let span = Span::new(keyword_token.start, value.span().end);
        Ok(StatementNode::VariableAssignment(VariableAssignmentNode {
            keyword,
            name,
            accessors,
            operator,
            value,
            span,
        }))
    }

    /// const name = expr
    fn parse_constant_declaration(&mut self) -> Result<StatementNode, SyntaxError> {
        let keyword = self.advance(LexMode::Command);
        let name = self.parse_binding_name()?;
        self.expect(LexMode::Expression, TokenType::Assign, "`=`")?;
        let value = self.parse_expression()?;
        let span = Span::new(keyword.start, value.span().end);
        Ok(StatementNode::ConstantDeclaration(ConstantDeclarationNode {
            name,
            value,
            shorthand: false,
            span,
        }))
    }

    /// name = expr
    fn parse_shorthand_constant(&mut self) -> Result<StatementNode, SyntaxError> {
        let name_token = self.advance(LexMode::Command);
        self.advance(LexMode::Command);
        let value = self.parse_expression()?;
        let span = Span::new(name_token.start, value.span().end);
        Ok(StatementNode::ConstantDeclaration(ConstantDeclarationNode {
            name: AST::identifier(name_token.value.clone(), name_token.span()),
            value,
            shorthand: true,
            span,
        }))
    }
}

/// Declarations and definitions end at their own terminator; `|` after them
/// is a missing terminator rather than a pipe.
fn is_pipeable(statement: &StatementNode) -> bool {
    matches!(
        statement,
        StatementNode::CommandCall(_)
            | StatementNode::For(_)
            | StatementNode::While(_)
            | StatementNode::If(_)
            | StatementNode::Case(_)
            | StatementNode::Piped(_)
    )
}

/// Parse a YSH source string with default options
pub fn parse(source: &str) -> (ProgramNode, Vec<Diagnostic>) {
    parse_with_options(source, &ParserOptions::default())
}

/// Parse a YSH source string. Always returns a tree; problems are reported
/// in the diagnostic list.
pub fn parse_with_options(source: &str, options: &ParserOptions) -> (ProgramNode, Vec<Diagnostic>) {
    if source.len() > options.max_input_size {
        debug!(
            target: "parse",
            size = source.len(),
            limit = options.max_input_size,
            "input too large"
        );
        let error = SyntaxError::InputTooLarge {
            size: source.len(),
            limit: options.max_input_size,
            span: Span::new(0, 0),
        };
        return (AST::program(Vec::new(), Span::new(0, source.len())), vec![error.into()]);
    }
    Parser::new(source, options.clone()).parse_program()
}
