//! Abstract Syntax Tree (AST) Types for YSH
//!
//! This module defines the complete, closed set of syntax tree nodes produced
//! by the parser. Every node owns its children exclusively and carries the
//! byte span of the source text it was built from.

use serde::Serialize;
use std::fmt;

// =============================================================================
// BASE TYPES
// =============================================================================

/// Half-open byte range `[start, end)` into the parsed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    /// Zero-width span at `offset`.
    pub fn point(offset: usize) -> Self {
        Self { start: offset, end: offset }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Slice of `source` covered by this span, if it lies on char boundaries.
    pub fn text<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

/// Convert a byte offset into a 1-based `(line, column)` pair.
///
/// Columns count characters, not bytes. Offsets past the end clamp to the
/// end of the source.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// A plain name: variable, function, parameter, member or proc name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifierNode {
    pub name: String,
    pub span: Span,
}

/// Placeholder left in the tree where a statement or expression could not be
/// parsed. The matching diagnostic carries the details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorNode {
    pub message: String,
    pub span: Span,
}

// =============================================================================
// PROGRAM & STATEMENTS
// =============================================================================

/// Root node: a complete source file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramNode {
    pub statements: Vec<StatementNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StatementNode {
    VariableDeclaration(VariableDeclarationNode),
    VariableAssignment(VariableAssignmentNode),
    ConstantDeclaration(ConstantDeclarationNode),
    FunctionDefinition(FunctionDefinitionNode),
    ProcDefinition(ProcDefinitionNode),
    CommandCall(CommandCallNode),
    For(ForNode),
    While(WhileNode),
    If(IfNode),
    Case(CaseNode),
    Piped(PipedStatementNode),
    Return(ReturnNode),
    Error(ErrorNode),
}

impl StatementNode {
    pub fn span(&self) -> Span {
        match self {
            Self::VariableDeclaration(n) => n.span,
            Self::VariableAssignment(n) => n.span,
            Self::ConstantDeclaration(n) => n.span,
            Self::FunctionDefinition(n) => n.span,
            Self::ProcDefinition(n) => n.span,
            Self::CommandCall(n) => n.span,
            Self::For(n) => n.span,
            Self::While(n) => n.span,
            Self::If(n) => n.span,
            Self::Case(n) => n.span,
            Self::Piped(n) => n.span,
            Self::Return(n) => n.span,
            Self::Error(n) => n.span,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Brace-delimited statement list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockNode {
    pub statements: Vec<StatementNode>,
    pub span: Span,
}

// =============================================================================
// DECLARATIONS
// =============================================================================

/// `var name = expr`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDeclarationNode {
    pub name: IdentifierNode,
    pub value: ExpressionNode,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignmentKeyword {
    SetVar,
    SetGlobal,
}

impl AssignmentKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetVar => "setvar",
            Self::SetGlobal => "setglobal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignmentOperator {
    Assign,       // =
    AppendAssign, // +=
}

impl fmt::Display for AssignmentOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assign => write!(f, "="),
            Self::AppendAssign => write!(f, "+="),
        }
    }
}

/// Place accessor on an assignment target: `.member` or `[index]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AccessorNode {
    Member { member: IdentifierNode, span: Span },
    Index { index: ExpressionNode, span: Span },
}

impl AccessorNode {
    pub fn span(&self) -> Span {
        match self {
            Self::Member { span, .. } | Self::Index { span, .. } => *span,
        }
    }
}

/// `setvar name[.member|[index]]* (=|+=) expr`, likewise `setglobal`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableAssignmentNode {
    pub keyword: AssignmentKeyword,
    pub name: IdentifierNode,
    pub accessors: Vec<AccessorNode>,
    pub operator: AssignmentOperator,
    pub value: ExpressionNode,
    pub span: Span,
}

/// `const name = expr`, or the keyword-less `name = expr` when `shorthand`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantDeclarationNode {
    pub name: IdentifierNode,
    pub value: ExpressionNode,
    pub shorthand: bool,
    pub span: Span,
}

// =============================================================================
// FUNCTIONS & PROCS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDefinitionNode {
    pub name: IdentifierNode,
    pub parameters: ParameterListNode,
    pub body: BlockNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcDefinitionNode {
    pub name: IdentifierNode,
    /// `None` for the parameterless form `proc name { ... }`
    pub parameters: Option<ParameterListNode>,
    pub body: BlockNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterNode {
    pub name: IdentifierNode,
    pub default: Option<ExpressionNode>,
    pub span: Span,
}

/// One `;`-separated tier of a parameter list. The rest parameter, when
/// present, is always the last entry of its tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterGroupNode {
    pub parameters: Vec<ParameterNode>,
    pub rest: Option<ParameterNode>,
    pub span: Span,
}

/// Tiers, in fixed order: positional; typed (procs only); named; block
/// (procs only). A `func` only ever fills `positional` and `named`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterListNode {
    pub positional: ParameterGroupNode,
    pub typed: Option<ParameterGroupNode>,
    pub named: Option<ParameterGroupNode>,
    pub block: Option<ParameterNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReturnValue {
    /// `return (expr)` inside a func
    Expression(ExpressionNode),
    /// `return 0` inside a proc
    Word(WordNode),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnNode {
    pub value: Option<ReturnValue>,
    pub span: Span,
}

// =============================================================================
// COMMAND CALLS
// =============================================================================

/// Shell-style invocation: `[!] [NAME=value]* name args... [(call args)] [{ block } redirs]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandCallNode {
    pub negated: bool,
    pub env_bindings: Vec<EnvBindingNode>,
    pub name: WordNode,
    /// Literals, words and redirections in source order
    pub arguments: Vec<ArgumentNode>,
    pub call_arguments: Option<ArgumentListNode>,
    pub block: Option<BlockNode>,
    pub block_redirections: Vec<RedirectionNode>,
    pub span: Span,
}

/// `NAME=value` prefix binding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvBindingNode {
    pub name: IdentifierNode,
    pub value: WordNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ArgumentNode {
    Literal(LiteralNode),
    Expansion(ExpansionNode),
    Word(WordNode),
    Redirection(RedirectionNode),
}

impl ArgumentNode {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(n) => n.span(),
            Self::Expansion(n) => n.span,
            Self::Word(n) => n.span,
            Self::Redirection(n) => n.span,
        }
    }
}

/// Parenthesized call arguments: `(a, b; name=value)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentListNode {
    pub positional: Vec<ExpressionNode>,
    pub named: Vec<NamedArgumentNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedArgumentNode {
    pub name: IdentifierNode,
    pub value: ExpressionNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedirectionNode {
    pub fd: Option<u32>,
    pub operator: RedirectionOperator,
    pub target: WordNode,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RedirectionOperator {
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
}

impl RedirectionOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
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
        }
    }
}

impl fmt::Display for RedirectionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `left | right`, left-associative
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipedStatementNode {
    pub left: Box<StatementNode>,
    pub right: Box<StatementNode>,
    pub span: Span,
}

// =============================================================================
// CONTROL FLOW
// =============================================================================

/// `for a, b in <iterable> { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForNode {
    pub names: Vec<IdentifierNode>,
    pub iterable: ForIterableNode,
    pub body: BlockNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ForIterableNode {
    /// `(start ..< end)`
    Range(RangeNode),
    /// `(expr)`
    Expression(ExpressionNode),
    /// `a b *.py`
    Words(Vec<WordNode>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeNode {
    pub start: ExpressionNode,
    pub end: ExpressionNode,
    pub span: Span,
}

/// Condition of `while`/`if`: `(expr)` or a command whose status is tested
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConditionNode {
    Expression(ExpressionNode),
    Command(Box<CommandCallNode>),
}

impl ConditionNode {
    pub fn span(&self) -> Span {
        match self {
            Self::Expression(e) => e.span(),
            Self::Command(c) => c.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhileNode {
    pub condition: ConditionNode,
    pub body: BlockNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfNode {
    /// The `if` branch followed by every `elif`, in source order
    pub branches: Vec<IfBranchNode>,
    pub else_body: Option<BlockNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfBranchNode {
    pub condition: ConditionNode,
    pub body: BlockNode,
    pub span: Span,
}

/// `case (subject) { cond { ... } ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseNode {
    pub subject: ExpressionNode,
    pub arms: Vec<CaseArmNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseArmNode {
    pub condition: CaseConditionNode,
    pub body: BlockNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CaseConditionNode {
    Glob(GlobNode),
    Expression(ExpressionNode),
    Eggex(EggexLiteralNode),
    /// `(else)`
    Else(Span),
}

impl CaseConditionNode {
    pub fn span(&self) -> Span {
        match self {
            Self::Glob(g) => g.span,
            Self::Expression(e) => e.span(),
            Self::Eggex(e) => e.span,
            Self::Else(span) => *span,
        }
    }
}

/// Pipe-separated bare-word patterns: `*.py | *.sh`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobNode {
    pub patterns: Vec<WordNode>,
    pub span: Span,
}

// =============================================================================
// WORDS, STRINGS & EXPANSIONS
// =============================================================================

/// A shell word: abutting pieces joined with no whitespace between them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordNode {
    pub parts: Vec<WordPart>,
    pub span: Span,
}

impl WordNode {
    /// The word's text when it is made of bare text only.
    pub fn as_bare_text(&self) -> Option<String> {
        let mut text = String::new();
        for part in &self.parts {
            match part {
                WordPart::Bare(b) => text.push_str(&b.value),
                _ => return None,
            }
        }
        Some(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum WordPart {
    Bare(BareTextPart),
    /// Backslash-escaped character: `\x`
    Escaped(EscapedPart),
    String(StringLiteralNode),
    Expansion(ExpansionNode),
}

impl WordPart {
    pub fn span(&self) -> Span {
        match self {
            Self::Bare(p) => p.span,
            Self::Escaped(p) => p.span,
            Self::String(s) => s.span,
            Self::Expansion(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BareTextPart {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscapedPart {
    /// The escaped character, without the backslash
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StringVariant {
    DoubleQuoted, // "..."
    SingleQuoted, // '...'
    Raw,          // r'...'
    J8,           // u'...'
    Byte,         // b'...'
}

impl StringVariant {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::DoubleQuoted | Self::SingleQuoted => "",
            Self::Raw => "r",
            Self::J8 => "u",
            Self::Byte => "b",
        }
    }

    pub fn quote(&self) -> char {
        match self {
            Self::DoubleQuoted => '"',
            _ => '\'',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DoubleQuoted => "double-quoted",
            Self::SingleQuoted => "single-quoted",
            Self::Raw => "raw",
            Self::J8 => "j8",
            Self::Byte => "byte",
        }
    }
}

impl fmt::Display for StringVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringLiteralNode {
    pub variant: StringVariant,
    /// `"""..."""` style delimiters
    pub triple: bool,
    pub fragments: Vec<StringFragment>,
    pub span: Span,
}

impl StringLiteralNode {
    /// Concatenated text fragments, or `None` if the literal contains
    /// escapes or expansions.
    pub fn plain_text(&self) -> Option<String> {
        let mut text = String::new();
        for fragment in &self.fragments {
            match fragment {
                StringFragment::Text(t) => text.push_str(&t.value),
                _ => return None,
            }
        }
        Some(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StringFragment {
    Text(TextFragment),
    Escape(EscapeFragment),
    Expansion(ExpansionNode),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextFragment {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscapeFragment {
    /// Escape as written, including the backslash: `\n`, `\u{41}`
    pub raw: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sigil {
    Dollar, // $
    At,     // @
    Caret,  // ^
}

impl Sigil {
    pub fn as_char(&self) -> char {
        match self {
            Self::Dollar => '$',
            Self::At => '@',
            Self::Caret => '^',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpansionNode {
    pub kind: ExpansionKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExpansionKind {
    /// `$name`, `$1`, `$?`, `$#`, `$*`, `$@`
    Simple { name: String },
    /// `${name}` or `${name:-default}`
    Braced {
        name: String,
        default: Option<WordNode>,
    },
    /// `$[expr]`, `@[expr]`, `^[expr]`
    Indexed {
        sigil: Sigil,
        expression: ExpressionNode,
    },
    /// `$(cmd)`, `@(cmd)`, `^(cmd)`
    CommandSubstitution {
        sigil: Sigil,
        body: Vec<StatementNode>,
    },
    /// `@name`
    Splice { name: String },
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExpressionNode {
    Literal(LiteralNode),
    Variable(VariableReferenceNode),
    Expansion(Box<ExpansionNode>),
    Binary(Box<BinaryExpressionNode>),
    Unary(Box<UnaryExpressionNode>),
    FunctionCall(Box<FunctionCallNode>),
    MethodCall(Box<MethodCallNode>),
    Member(Box<MemberAccessNode>),
    Index(Box<IndexAccessNode>),
}

impl ExpressionNode {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(n) => n.span(),
            Self::Variable(n) => n.span,
            Self::Expansion(n) => n.span,
            Self::Binary(n) => n.span,
            Self::Unary(n) => n.span,
            Self::FunctionCall(n) => n.span,
            Self::MethodCall(n) => n.span,
            Self::Member(n) => n.span,
            Self::Index(n) => n.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableReferenceNode {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryExpressionNode {
    pub operator: BinaryOperator,
    pub left: ExpressionNode,
    pub right: ExpressionNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnaryExpressionNode {
    pub operator: UnaryOperator,
    pub operand: ExpressionNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCallNode {
    pub name: IdentifierNode,
    pub arguments: ArgumentListNode,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MethodDispatch {
    Dot,   // .name(args)
    Arrow, // ->name(args)
}

impl MethodDispatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dot => ".",
            Self::Arrow => "->",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodCallNode {
    pub receiver: ExpressionNode,
    pub dispatch: MethodDispatch,
    pub method: IdentifierNode,
    pub arguments: ArgumentListNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberAccessNode {
    pub object: ExpressionNode,
    pub member: IdentifierNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexAccessNode {
    pub object: ExpressionNode,
    pub index: ExpressionNode,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
    // Logical
    Or,  // or
    And, // and

    // Bitwise
    BitOr,  // |
    BitXor, // ^
    BitAnd, // &

    // Equality
    Equal,          // ==
    NotEqual,       // !=
    NotIdentical,   // !==
    Identical,      // ===
    ApproxEqual,    // ~==

    // Comparison
    Less,           // <
    Greater,        // >
    LessEqual,      // <=
    GreaterEqual,   // >=
    Match,          // ~
    NotMatch,       // !~
    GlobMatch,      // ~~
    NotGlobMatch,   // !~~

    // Shift
    ShiftLeft,  // <<
    ShiftRight, // >>

    // Additive
    Add,         // +
    Subtract,    // -
    Concatenate, // ++

    // Multiplicative
    Multiply, // *
    Divide,   // /
    Modulo,   // %

    Power, // **
    Chain, // =>
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::BitAnd => "&",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::NotIdentical => "!==",
            Self::Identical => "===",
            Self::ApproxEqual => "~==",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Match => "~",
            Self::NotMatch => "!~",
            Self::GlobMatch => "~~",
            Self::NotGlobMatch => "!~~",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Concatenate => "++",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Power => "**",
            Self::Chain => "=>",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOperator {
    Not,       // not
    Reference, // &
    Plus,      // +
    Negate,    // -
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::Reference => "&",
            Self::Plus => "+",
            Self::Negate => "-",
        }
    }
}

// =============================================================================
// LITERALS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralNode {
    Number(NumberLiteralNode),
    Boolean(BooleanLiteralNode),
    Null(NullLiteralNode),
    String(StringLiteralNode),
    List(ListLiteralNode),
    Dict(DictLiteralNode),
    Eggex(EggexLiteralNode),
    Char(CharLiteralNode),
    LiteralList(LiteralListNode),
}

impl LiteralNode {
    pub fn span(&self) -> Span {
        match self {
            Self::Number(n) => n.span,
            Self::Boolean(n) => n.span,
            Self::Null(n) => n.span,
            Self::String(n) => n.span,
            Self::List(n) => n.span,
            Self::Dict(n) => n.span,
            Self::Eggex(n) => n.span,
            Self::Char(n) => n.span,
            Self::LiteralList(n) => n.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Radix {
    Decimal,
    Hex,
    Octal,
    Binary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberLiteralNode {
    /// Digits as written, including any `0x` prefix and `_` separators
    pub raw: String,
    pub radix: Radix,
    pub is_float: bool,
    pub span: Span,
}

impl NumberLiteralNode {
    /// Integer value, if the literal is an integer that fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        if self.is_float {
            return None;
        }
        let digits: String = self.raw.chars().filter(|c| *c != '_').collect();
        match self.radix {
            Radix::Decimal => digits.parse().ok(),
            Radix::Hex => i64::from_str_radix(&digits[2..], 16).ok(),
            Radix::Octal => i64::from_str_radix(&digits[2..], 8).ok(),
            Radix::Binary => i64::from_str_radix(&digits[2..], 2).ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BooleanLiteralNode {
    pub value: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NullLiteralNode {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListLiteralNode {
    pub elements: Vec<ExpressionNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictLiteralNode {
    pub entries: Vec<DictEntryNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictEntryNode {
    pub key: DictKeyNode,
    pub value: ExpressionNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DictKeyNode {
    /// `name: value`
    Name(IdentifierNode),
    /// `'name': value`
    String(StringLiteralNode),
    /// `[expr]: value`
    Expression(ExpressionNode),
}

/// `/ pattern /`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EggexLiteralNode {
    /// Text between the slashes, trimmed
    pub pattern: String,
    pub span: Span,
}

/// Backslash character literal: `\n`, `\t`, `\u{41}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharLiteralNode {
    pub raw: String,
    pub span: Span,
}

/// `:| word word |`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiteralListNode {
    pub words: Vec<WordNode>,
    pub span: Span,
}

// =============================================================================
// FACTORY FUNCTIONS
// =============================================================================

/// Helper constructors used by the parser.
pub struct AST;

impl AST {
    pub fn program(statements: Vec<StatementNode>, span: Span) -> ProgramNode {
        ProgramNode { statements, span }
    }

    pub fn block(statements: Vec<StatementNode>, span: Span) -> BlockNode {
        BlockNode { statements, span }
    }

    pub fn identifier(name: impl Into<String>, span: Span) -> IdentifierNode {
        IdentifierNode {
            name: name.into(),
            span,
        }
    }

    pub fn error(message: impl Into<String>, span: Span) -> ErrorNode {
        ErrorNode {
            message: message.into(),
            span,
        }
    }

    pub fn word(parts: Vec<WordPart>) -> WordNode {
        let span = match (parts.first(), parts.last()) {
            (Some(first), Some(last)) => first.span().to(last.span()),
            _ => Span::default(),
        };
        WordNode { parts, span }
    }

    pub fn bare(value: impl Into<String>, span: Span) -> WordPart {
        WordPart::Bare(BareTextPart {
            value: value.into(),
            span,
        })
    }

    pub fn escaped(value: impl Into<String>, span: Span) -> WordPart {
        WordPart::Escaped(EscapedPart {
            value: value.into(),
            span,
        })
    }

    pub fn expansion(kind: ExpansionKind, span: Span) -> ExpansionNode {
        ExpansionNode { kind, span }
    }

    pub fn variable(name: impl Into<String>, span: Span) -> ExpressionNode {
        ExpressionNode::Variable(VariableReferenceNode {
            name: name.into(),
            span,
        })
    }

    pub fn binary(
        operator: BinaryOperator,
        left: ExpressionNode,
        right: ExpressionNode,
    ) -> ExpressionNode {
        let span = left.span().to(right.span());
        ExpressionNode::Binary(Box::new(BinaryExpressionNode {
            operator,
            left,
            right,
            span,
        }))
    }

    pub fn unary(operator: UnaryOperator, operand: ExpressionNode, start: usize) -> ExpressionNode {
        let span = Span::new(start, operand.span().end);
        ExpressionNode::Unary(Box::new(UnaryExpressionNode {
            operator,
            operand,
            span,
        }))
    }

    pub fn member(object: ExpressionNode, member: IdentifierNode) -> ExpressionNode {
        let span = object.span().to(member.span);
        ExpressionNode::Member(Box::new(MemberAccessNode {
            object,
            member,
            span,
        }))
    }

    pub fn index(object: ExpressionNode, index: ExpressionNode, end: usize) -> ExpressionNode {
        let span = Span::new(object.span().start, end);
        ExpressionNode::Index(Box::new(IndexAccessNode {
            object,
            index,
            span,
        }))
    }

    pub fn method_call(
        receiver: ExpressionNode,
        dispatch: MethodDispatch,
        method: IdentifierNode,
        arguments: ArgumentListNode,
    ) -> ExpressionNode {
        let span = receiver.span().to(arguments.span);
        ExpressionNode::MethodCall(Box::new(MethodCallNode {
            receiver,
            dispatch,
            method,
            arguments,
            span,
        }))
    }

    pub fn function_call(name: IdentifierNode, arguments: ArgumentListNode) -> ExpressionNode {
        let span = name.span.to(arguments.span);
        ExpressionNode::FunctionCall(Box::new(FunctionCallNode {
            name,
            arguments,
            span,
        }))
    }

    pub fn piped(left: StatementNode, right: StatementNode) -> StatementNode {
        let span = left.span().to(right.span());
        StatementNode::Piped(PipedStatementNode {
            left: Box::new(left),
            right: Box::new(right),
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_normalizes_order() {
        let span = Span::new(7, 3);
        assert_eq!(span, Span { start: 3, end: 7 });
        assert_eq!(span.len(), 4);
    }

    #[test]
    fn test_span_to_covers_both() {
        assert_eq!(Span::new(2, 4).to(Span::new(8, 9)), Span::new(2, 9));
    }

    #[test]
    fn test_line_column() {
        let source = "var x = 1\nvar y = 2";
        assert_eq!(line_column(source, 0), (1, 1));
        assert_eq!(line_column(source, 4), (1, 5));
        assert_eq!(line_column(source, 10), (2, 1));
        assert_eq!(line_column(source, 1000), (2, 10));
    }

    #[test]
    fn test_number_value() {
        let hex = NumberLiteralNode {
            raw: "0xff_ff".to_string(),
            radix: Radix::Hex,
            is_float: false,
            span: Span::default(),
        };
        assert_eq!(hex.as_i64(), Some(0xffff));

        let dec = NumberLiteralNode {
            raw: "1_000".to_string(),
            radix: Radix::Decimal,
            is_float: false,
            span: Span::default(),
        };
        assert_eq!(dec.as_i64(), Some(1000));
    }

    #[test]
    fn test_word_bare_text() {
        let word = AST::word(vec![
            AST::bare("foo", Span::new(0, 3)),
            AST::bare(".txt", Span::new(3, 7)),
        ]);
        assert_eq!(word.as_bare_text().as_deref(), Some("foo.txt"));
        assert_eq!(word.span, Span::new(0, 7));
    }
}
