//! Word Parsing
//!
//! Assembles shell words from abutting command-mode pieces and string
//! literals from the pieces handed back by the sub-lexer.

use crate::ast::types::{
    EscapeFragment, Span, StringFragment, StringLiteralNode, StringVariant, TextFragment,
    WordNode, WordPart, AST,
};
use crate::parser::errors::SyntaxError;
use crate::parser::lexer::{LexMode, TokenType};
use crate::parser::parser::Parser;
use crate::parser::string_lexer::StringPiece;
use crate::parser::types::is_word_piece_token;

const CMD: LexMode = LexMode::Command;

// =============================================================================
// PURE STRING UTILITIES
// =============================================================================

/// Split raw word text into bare runs and `\c` escapes.
///
/// `offset` is the byte offset of `text` in the source.
pub(crate) fn push_word_text(parts: &mut Vec<WordPart>, text: &str, offset: usize) {
    let mut bare_start = 0;
    let mut chars = text.char_indices();
    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            continue;
        }
        let Some((j, escaped)) = chars.next() else {
            break;
        };
        push_bare(parts, &text[bare_start..i], offset + bare_start);
        let end = j + escaped.len_utf8();
        parts.push(AST::escaped(
            escaped.to_string(),
            Span::new(offset + i, offset + end),
        ));
        bare_start = end;
    }
    push_bare(parts, &text[bare_start..], offset + bare_start);
}

/// Append bare text, merging with a directly preceding bare part
fn push_bare(parts: &mut Vec<WordPart>, value: &str, start: usize) {
    if value.is_empty() {
        return;
    }
    let end = start + value.len();
    if let Some(WordPart::Bare(last)) = parts.last_mut() {
        if last.span.end == start {
            last.value.push_str(value);
            last.span = Span::new(last.span.start, end);
            return;
        }
    }
    parts.push(AST::bare(value, Span::new(start, end)));
}

impl<'a> Parser<'a> {
    /// Parse one shell word: a run of pieces with no whitespace between them
    pub(crate) fn parse_word(&mut self) -> Result<WordNode, SyntaxError> {
        let mut parts = Vec::new();
        self.extend_word(&mut parts, false)?;
        if parts.is_empty() {
            return Err(self.unexpected(CMD, "word"));
        }
        Ok(AST::word(parts))
    }

    /// Append abutting word pieces to `parts`. With `continuing` set, even
    /// the first piece must directly follow the previous token.
    pub(crate) fn extend_word(
        &mut self,
        parts: &mut Vec<WordPart>,
        mut continuing: bool,
    ) -> Result<(), SyntaxError> {
        loop {
            let token = self.peek(CMD);
            if !is_word_piece_token(token.token_type) {
                break;
            }
            if continuing && !token.immediate {
                break;
            }
            continuing = true;
            self.advance(CMD);
            match token.token_type {
                TokenType::Word | TokenType::LBracket | TokenType::RBracket => {
                    push_word_text(parts, &token.value, token.start);
                }
                TokenType::StringStart(variant, triple) => {
                    let literal = self.parse_string_body(variant, triple, token.span());
                    parts.push(WordPart::String(literal));
                }
                _ => {
                    let expansion = self.parse_expansion(token)?;
                    parts.push(WordPart::Expansion(expansion));
                }
            }
        }
        Ok(())
    }

    /// Parse the body of a string literal whose opening token (spanning
    /// `open`) has been consumed. Errors inside the body are reported and the
    /// literal is still returned.
    pub(crate) fn parse_string_body(
        &mut self,
        variant: StringVariant,
        triple: bool,
        open: Span,
    ) -> StringLiteralNode {
        let mut fragments = Vec::new();
        loop {
            match self.raw(|lexer| lexer.next_string_piece(variant, triple, open)) {
                Ok(StringPiece::Text { value, span }) => {
                    fragments.push(StringFragment::Text(TextFragment { value, span }));
                }
                Ok(StringPiece::Escape { raw, span }) => {
                    fragments.push(StringFragment::Escape(EscapeFragment { raw, span }));
                }
                Ok(StringPiece::BadEscape { raw, span, error }) => {
                    self.report(error);
                    fragments.push(StringFragment::Text(TextFragment { value: raw, span }));
                }
                Ok(StringPiece::Expansion(token)) => match self.parse_expansion(token) {
                    Ok(expansion) => fragments.push(StringFragment::Expansion(expansion)),
                    Err(error) => self.report(error),
                },
                Ok(StringPiece::Close(_)) => break,
                Err(error) => {
                    self.report(error);
                    break;
                }
            }
        }
        StringLiteralNode {
            variant,
            triple,
            fragments,
            span: Span::new(open.start, self.last_end()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::*;
    use crate::parser::errors::{DiagnosticKind, LexError};
    use crate::parser::parse;
    use assert_matches::assert_matches;

    /// First argument word of `echo <source>`
    fn first_word(source: &str) -> WordNode {
        let input = format!("echo {}", source);
        let (program, diagnostics) = parse(&input);
        assert!(
            diagnostics.iter().all(|d| !d.is_error()),
            "unexpected diagnostics for {:?}: {:?}",
            source,
            diagnostics
        );
        match program.statements.into_iter().next() {
            Some(StatementNode::CommandCall(call)) => match call.arguments.into_iter().next() {
                Some(ArgumentNode::Word(word)) => word,
                other => panic!("expected word argument, got {:?}", other),
            },
            other => panic!("expected command call, got {:?}", other),
        }
    }

    fn string_literal(source: &str) -> StringLiteralNode {
        let input = format!("var s = {}", source);
        let (program, _) = parse(&input);
        match program.statements.into_iter().next() {
            Some(StatementNode::VariableDeclaration(VariableDeclarationNode {
                value: ExpressionNode::Literal(LiteralNode::String(s)),
                ..
            })) => s,
            other => panic!("expected string declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_push_word_text_splits_escapes() {
        let mut parts = Vec::new();
        push_word_text(&mut parts, r"a\ b\*c", 10);
        assert_eq!(parts.len(), 5);
        assert_matches!(&parts[0], WordPart::Bare(p) if p.value == "a" && p.span == Span::new(10, 11));
        assert_matches!(&parts[1], WordPart::Escaped(p) if p.value == " " && p.span == Span::new(11, 13));
        assert_matches!(&parts[3], WordPart::Escaped(p) if p.value == "*");
        assert_matches!(&parts[4], WordPart::Bare(p) if p.value == "c" && p.span == Span::new(16, 17));
    }

    #[test]
    fn test_adjacent_bare_pieces_merge() {
        let word = first_word("a[1]b");
        assert_eq!(word.parts.len(), 1);
        assert_eq!(word.as_bare_text().as_deref(), Some("a[1]b"));
        assert_eq!(word.span, Span::new(5, 10));
    }

    #[test]
    fn test_mixed_word_parts() {
        let word = first_word(r#"pre"$x"post$y"#);
        assert_eq!(word.parts.len(), 4);
        assert_matches!(&word.parts[0], WordPart::Bare(p) if p.value == "pre");
        assert_matches!(&word.parts[1], WordPart::String(s) if s.variant == StringVariant::DoubleQuoted);
        assert_matches!(&word.parts[2], WordPart::Bare(p) if p.value == "post");
        assert_matches!(&word.parts[3], WordPart::Expansion(e)
            if e.kind == ExpansionKind::Simple { name: "y".to_string() });
    }

    #[test]
    fn test_whitespace_separates_words() {
        let (program, _) = parse("echo a 'b' $c");
        let StatementNode::CommandCall(call) = &program.statements[0] else {
            panic!("expected command call");
        };
        assert_eq!(call.arguments.len(), 3);
    }

    #[test]
    fn test_raw_string_keeps_backslash() {
        let s = string_literal(r"r'a\nb'");
        assert_eq!(s.variant, StringVariant::Raw);
        assert_eq!(s.plain_text().as_deref(), Some(r"a\nb"));
    }

    #[test]
    fn test_double_quoted_has_escape_fragment() {
        let s = string_literal(r#""a\nb""#);
        assert_eq!(s.fragments.len(), 3);
        assert_matches!(&s.fragments[1], StringFragment::Escape(e) if e.raw == r"\n");
    }

    #[test]
    fn test_single_quoted_has_no_escape_fragment() {
        let s = string_literal(r"'a\nb'");
        assert!(s
            .fragments
            .iter()
            .all(|f| matches!(f, StringFragment::Text(_))));
        assert_eq!(s.plain_text().as_deref(), Some(r"a\nb"));
    }

    #[test]
    fn test_triple_quoted_string() {
        let s = string_literal("'''it's\nfine'''");
        assert!(s.triple);
        assert_eq!(s.plain_text().as_deref(), Some("it's\nfine"));
    }

    #[test]
    fn test_string_with_expansions() {
        let s = string_literal(r#""hi $name, ${user:-anon} $(whoami)""#);
        let kinds: Vec<_> = s
            .fragments
            .iter()
            .filter_map(|f| match f {
                StringFragment::Expansion(e) => Some(&e.kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds.len(), 3);
        assert_matches!(kinds[0], ExpansionKind::Simple { name } if name == "name");
        assert_matches!(kinds[1], ExpansionKind::Braced { name, default: Some(_) } if name == "user");
        assert_matches!(kinds[2], ExpansionKind::CommandSubstitution { sigil: Sigil::Dollar, body } if body.len() == 1);
    }

    #[test]
    fn test_at_is_literal_inside_strings() {
        let s = string_literal(r#""mail @user""#);
        assert_eq!(s.plain_text().as_deref(), Some("mail @user"));
    }

    #[test]
    fn test_unterminated_string() {
        let (_, diagnostics) = parse("echo 'abc");
        assert_eq!(diagnostics.len(), 1);
        assert_matches!(
            &diagnostics[0].kind,
            DiagnosticKind::Lex(LexError::UnterminatedString {
                variant: StringVariant::SingleQuoted,
                triple: false,
                span,
            }) if *span == Span::new(5, 6)
        );
    }

    #[test]
    fn test_mismatched_triple_delimiter_is_unterminated() {
        let (_, diagnostics) = parse(r#"echo """abc""#);
        assert_matches!(
            &diagnostics[0].kind,
            DiagnosticKind::Lex(LexError::UnterminatedString { triple: true, .. })
        );
    }

    #[test]
    fn test_invalid_j8_escape_is_kept_as_text() {
        let (program, diagnostics) = parse(r"var s = u'a\qb'");
        assert_eq!(diagnostics.len(), 1);
        assert_matches!(&diagnostics[0].kind, DiagnosticKind::Lex(LexError::InvalidEscape { .. }));
        let StatementNode::VariableDeclaration(decl) = &program.statements[0] else {
            panic!("expected declaration");
        };
        let ExpressionNode::Literal(LiteralNode::String(s)) = &decl.value else {
            panic!("expected string");
        };
        assert_eq!(s.plain_text().as_deref(), Some(r"a\qb"));
    }

    #[test]
    fn test_byte_string_escapes() {
        let s = string_literal(r"b'\y00\n'");
        assert_eq!(s.variant, StringVariant::Byte);
        assert_eq!(s.fragments.len(), 2);

        let (_, diagnostics) = parse(r"var s = b'\yZZ'");
        assert_matches!(&diagnostics[0].kind, DiagnosticKind::Lex(LexError::InvalidByteEscape { .. }));
    }
}
