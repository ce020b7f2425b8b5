//! Canonical source printer
//!
//! Converts a syntax tree back into YSH source. The output is canonical
//! rather than trivia-preserving: comments and original spacing are lost,
//! blocks are re-indented and compound operands are parenthesized. Parsing
//! the output again yields a tree that prints identically.
//!
//! Error nodes print as `#` comments, so a tree with errors does not
//! round-trip.

use crate::ast::types::*;

const INDENT: &str = "  ";

/// Serialize a whole program, one statement per line.
pub fn to_source(program: &ProgramNode) -> String {
    let mut printer = Printer::default();
    for statement in &program.statements {
        printer.statement(statement);
        printer.out.push('\n');
    }
    printer.out
}

/// Serialize a single expression.
pub fn expression_to_source(expression: &ExpressionNode) -> String {
    let mut printer = Printer::default();
    printer.expression(expression);
    printer.out
}

/// Serialize a single word.
pub fn word_to_source(word: &WordNode) -> String {
    let mut printer = Printer::default();
    printer.word(word);
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
    }

    // =========================================================================
    // STATEMENTS
    // =========================================================================

    fn statement(&mut self, statement: &StatementNode) {
        match statement {
            StatementNode::VariableDeclaration(node) => {
                self.push("var ");
                self.push(&node.name.name);
                self.push(" = ");
                self.expression(&node.value);
            }
            StatementNode::VariableAssignment(node) => {
                self.push(node.keyword.as_str());
                self.push(" ");
                self.push(&node.name.name);
                for accessor in &node.accessors {
                    match accessor {
                        AccessorNode::Member { member, .. } => {
                            self.push(".");
                            self.push(&member.name);
                        }
                        AccessorNode::Index { index, .. } => {
                            self.push("[");
                            self.expression(index);
                            self.push("]");
                        }
                    }
                }
                self.push(&format!(" {} ", node.operator));
                self.expression(&node.value);
            }
            StatementNode::ConstantDeclaration(node) => {
                if !node.shorthand {
                    self.push("const ");
                }
                self.push(&node.name.name);
                self.push(" = ");
                self.expression(&node.value);
            }
            StatementNode::FunctionDefinition(node) => {
                self.push("func ");
                self.push(&node.name.name);
                self.function_parameters(&node.parameters);
                self.push(" ");
                self.block(&node.body);
            }
            StatementNode::ProcDefinition(node) => {
                self.push("proc ");
                self.push(&node.name.name);
                if let Some(parameters) = &node.parameters {
                    self.push(" ");
                    self.proc_parameters(parameters);
                }
                self.push(" ");
                self.block(&node.body);
            }
            StatementNode::CommandCall(node) => self.command_call(node),
            StatementNode::For(node) => {
                self.push("for ");
                let names: Vec<&str> = node.names.iter().map(|n| n.name.as_str()).collect();
                self.push(&names.join(", "));
                self.push(" in ");
                match &node.iterable {
                    ForIterableNode::Range(range) => {
                        self.push("(");
                        self.operand(&range.start);
                        self.push(" ..< ");
                        self.operand(&range.end);
                        self.push(")");
                    }
                    ForIterableNode::Expression(expression) => {
                        self.push("(");
                        self.expression(expression);
                        self.push(")");
                    }
                    ForIterableNode::Words(words) => {
                        for (i, word) in words.iter().enumerate() {
                            if i > 0 {
                                self.push(" ");
                            }
                            self.word(word);
                        }
                    }
                }
                self.push(" ");
                self.block(&node.body);
            }
            StatementNode::While(node) => {
                self.push("while ");
                self.condition(&node.condition);
                self.push(" ");
                self.block(&node.body);
            }
            StatementNode::If(node) => {
                for (i, branch) in node.branches.iter().enumerate() {
                    self.push(if i == 0 { "if " } else { " elif " });
                    self.condition(&branch.condition);
                    self.push(" ");
                    self.block(&branch.body);
                }
                if let Some(body) = &node.else_body {
                    self.push(" else ");
                    self.block(body);
                }
            }
            StatementNode::Case(node) => {
                self.push("case (");
                self.expression(&node.subject);
                self.push(") {");
                self.indent += 1;
                for arm in &node.arms {
                    self.newline();
                    self.case_condition(&arm.condition);
                    self.push(" ");
                    self.block(&arm.body);
                }
                self.indent -= 1;
                self.newline();
                self.push("}");
            }
            StatementNode::Piped(node) => {
                self.statement(&node.left);
                self.push(" | ");
                self.statement(&node.right);
            }
            StatementNode::Return(node) => {
                self.push("return");
                match &node.value {
                    Some(ReturnValue::Expression(expression)) => {
                        self.push(" (");
                        self.expression(expression);
                        self.push(")");
                    }
                    Some(ReturnValue::Word(word)) => {
                        self.push(" ");
                        self.word(word);
                    }
                    None => {}
                }
            }
            StatementNode::Error(node) => {
                self.push("# error: ");
                self.push(&node.message.replace('\n', " "));
            }
        }
    }

    fn block(&mut self, block: &BlockNode) {
        self.push("{");
        self.indent += 1;
        for statement in &block.statements {
            self.newline();
            self.statement(statement);
        }
        self.indent -= 1;
        self.newline();
        self.push("}");
    }

    fn condition(&mut self, condition: &ConditionNode) {
        match condition {
            ConditionNode::Expression(expression) => {
                self.push("(");
                self.expression(expression);
                self.push(")");
            }
            ConditionNode::Command(call) => self.command_call(call),
        }
    }

    fn case_condition(&mut self, condition: &CaseConditionNode) {
        match condition {
            CaseConditionNode::Glob(glob) => {
                for (i, pattern) in glob.patterns.iter().enumerate() {
                    if i > 0 {
                        self.push(" | ");
                    }
                    self.word(pattern);
                }
            }
            CaseConditionNode::Expression(expression) => {
                self.push("(");
                self.expression(expression);
                self.push(")");
            }
            CaseConditionNode::Eggex(eggex) => self.eggex(eggex),
            CaseConditionNode::Else(_) => self.push("(else)"),
        }
    }

    // =========================================================================
    // PARAMETERS
    // =========================================================================

    /// `(positional; named)` for a func
    fn function_parameters(&mut self, list: &ParameterListNode) {
        self.push("(");
        self.parameter_group(&list.positional);
        if let Some(named) = &list.named {
            self.push("; ");
            self.parameter_group(named);
        }
        self.push(")");
    }

    /// `(positional; typed; named; block)` for a proc, up to the last tier present
    fn proc_parameters(&mut self, list: &ParameterListNode) {
        let tiers = if list.block.is_some() {
            4
        } else if list.named.is_some() {
            3
        } else if list.typed.is_some() {
            2
        } else {
            1
        };

        self.push("(");
        self.parameter_group(&list.positional);
        for (tier, group) in [(2, &list.typed), (3, &list.named)] {
            if tier > tiers {
                break;
            }
            self.push("; ");
            if let Some(group) = group {
                self.parameter_group(group);
            }
        }
        if tiers == 4 {
            self.push("; ");
            if let Some(block) = &list.block {
                self.parameter(block);
            }
        }
        self.push(")");
    }

    fn parameter_group(&mut self, group: &ParameterGroupNode) {
        let mut first = true;
        for parameter in &group.parameters {
            if !first {
                self.push(", ");
            }
            first = false;
            self.parameter(parameter);
        }
        if let Some(rest) = &group.rest {
            if !first {
                self.push(", ");
            }
            self.push("...");
            self.push(&rest.name.name);
        }
    }

    fn parameter(&mut self, parameter: &ParameterNode) {
        self.push(&parameter.name.name);
        if let Some(default) = &parameter.default {
            self.push(" = ");
            self.expression(default);
        }
    }

    // =========================================================================
    // COMMAND CALLS
    // =========================================================================

    fn command_call(&mut self, call: &CommandCallNode) {
        if call.negated {
            self.push("! ");
        }
        for binding in &call.env_bindings {
            self.push(&binding.name.name);
            self.push("=");
            self.word(&binding.value);
            self.push(" ");
        }
        self.word(&call.name);
        for argument in &call.arguments {
            self.push(" ");
            match argument {
                ArgumentNode::Literal(literal) => self.literal(literal),
                ArgumentNode::Expansion(expansion) => self.expansion(expansion),
                ArgumentNode::Word(word) => self.word(word),
                ArgumentNode::Redirection(redirection) => self.redirection(redirection),
            }
        }
        if let Some(arguments) = &call.call_arguments {
            self.push(" ");
            self.argument_list(arguments);
        }
        if let Some(block) = &call.block {
            self.push(" ");
            self.block(block);
            for redirection in &call.block_redirections {
                self.push(" ");
                self.redirection(redirection);
            }
        }
    }

    fn redirection(&mut self, redirection: &RedirectionNode) {
        if let Some(fd) = redirection.fd {
            self.push(&fd.to_string());
        }
        self.push(redirection.operator.as_str());
        self.word(&redirection.target);
    }

    fn argument_list(&mut self, list: &ArgumentListNode) {
        self.push("(");
        for (i, argument) in list.positional.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expression(argument);
        }
        if !list.named.is_empty() {
            self.push("; ");
            for (i, argument) in list.named.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.push(&argument.name.name);
                self.push(" = ");
                self.expression(&argument.value);
            }
        }
        self.push(")");
    }

    // =========================================================================
    // WORDS, STRINGS & EXPANSIONS
    // =========================================================================

    fn word(&mut self, word: &WordNode) {
        for part in &word.parts {
            match part {
                WordPart::Bare(bare) => self.push(&bare.value),
                WordPart::Escaped(escaped) => {
                    self.push("\\");
                    self.push(&escaped.value);
                }
                WordPart::String(literal) => self.string(literal),
                WordPart::Expansion(expansion) => self.expansion(expansion),
            }
        }
    }

    fn string(&mut self, literal: &StringLiteralNode) {
        let quote = literal.variant.quote().to_string();
        let delimiter = if literal.triple { quote.repeat(3) } else { quote };
        self.push(literal.variant.prefix());
        self.push(&delimiter);
        for fragment in &literal.fragments {
            match fragment {
                StringFragment::Text(text) => self.push(&text.value),
                StringFragment::Escape(escape) => self.push(&escape.raw),
                StringFragment::Expansion(expansion) => self.expansion(expansion),
            }
        }
        self.push(&delimiter);
    }

    fn expansion(&mut self, expansion: &ExpansionNode) {
        match &expansion.kind {
            ExpansionKind::Simple { name } => {
                self.push("$");
                self.push(name);
            }
            ExpansionKind::Braced { name, default } => {
                self.push("${");
                self.push(name);
                if let Some(default) = default {
                    self.push(":-");
                    self.word(default);
                }
                self.push("}");
            }
            ExpansionKind::Indexed { sigil, expression } => {
                self.out.push(sigil.as_char());
                self.push("[");
                self.expression(expression);
                self.push("]");
            }
            ExpansionKind::CommandSubstitution { sigil, body } => {
                self.out.push(sigil.as_char());
                self.push("(");
                for (i, statement) in body.iter().enumerate() {
                    if i > 0 {
                        self.push("; ");
                    }
                    self.statement(statement);
                }
                self.push(")");
            }
            ExpansionKind::Splice { name } => {
                self.push("@");
                self.push(name);
            }
        }
    }

    fn eggex(&mut self, eggex: &EggexLiteralNode) {
        self.push("/ ");
        self.push(&eggex.pattern);
        self.push(" /");
    }

    // =========================================================================
    // EXPRESSIONS
    // =========================================================================

    fn expression(&mut self, expression: &ExpressionNode) {
        match expression {
            ExpressionNode::Literal(literal) => self.literal(literal),
            ExpressionNode::Variable(variable) => self.push(&variable.name),
            ExpressionNode::Expansion(expansion) => self.expansion(expansion),
            ExpressionNode::Binary(node) => {
                self.operand(&node.left);
                self.push(&format!(" {} ", node.operator));
                self.operand(&node.right);
            }
            ExpressionNode::Unary(node) => {
                self.push(node.operator.as_str());
                if node.operator == UnaryOperator::Not {
                    self.push(" ");
                }
                self.operand(&node.operand);
            }
            ExpressionNode::FunctionCall(node) => {
                self.push(&node.name.name);
                self.argument_list(&node.arguments);
            }
            ExpressionNode::MethodCall(node) => {
                self.postfix_object(&node.receiver);
                self.push(node.dispatch.as_str());
                self.push(&node.method.name);
                self.argument_list(&node.arguments);
            }
            ExpressionNode::Member(node) => {
                self.postfix_object(&node.object);
                self.push(".");
                self.push(&node.member.name);
            }
            ExpressionNode::Index(node) => {
                self.postfix_object(&node.object);
                self.push("[");
                self.expression(&node.index);
                self.push("]");
            }
        }
    }

    /// Operand of an operator; compound operands are always parenthesized
    fn operand(&mut self, expression: &ExpressionNode) {
        let wrap = matches!(
            expression,
            ExpressionNode::Binary(_) | ExpressionNode::Unary(_)
        );
        self.wrapped(expression, wrap);
    }

    fn postfix_object(&mut self, expression: &ExpressionNode) {
        let wrap = matches!(
            expression,
            ExpressionNode::Binary(_)
                | ExpressionNode::Unary(_)
                | ExpressionNode::Literal(LiteralNode::Number(_))
                | ExpressionNode::Literal(LiteralNode::Eggex(_))
        );
        self.wrapped(expression, wrap);
    }

    fn wrapped(&mut self, expression: &ExpressionNode, wrap: bool) {
        if wrap {
            self.push("(");
        }
        self.expression(expression);
        if wrap {
            self.push(")");
        }
    }

    fn literal(&mut self, literal: &LiteralNode) {
        match literal {
            LiteralNode::Number(number) => self.push(&number.raw),
            LiteralNode::Boolean(boolean) => self.push(if boolean.value { "true" } else { "false" }),
            LiteralNode::Null(_) => self.push("null"),
            LiteralNode::String(string) => self.string(string),
            LiteralNode::List(list) => {
                self.push("[");
                for (i, element) in list.elements.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expression(element);
                }
                self.push("]");
            }
            LiteralNode::Dict(dict) => {
                self.push("{");
                for (i, entry) in dict.entries.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    match &entry.key {
                        DictKeyNode::Name(name) => self.push(&name.name),
                        DictKeyNode::String(string) => self.string(string),
                        DictKeyNode::Expression(key) => {
                            self.push("[");
                            self.expression(key);
                            self.push("]");
                        }
                    }
                    self.push(": ");
                    self.expression(&entry.value);
                }
                self.push("}");
            }
            LiteralNode::Eggex(eggex) => self.eggex(eggex),
            LiteralNode::Char(char_literal) => self.push(&char_literal.raw),
            LiteralNode::LiteralList(list) => {
                self.push(":|");
                for word in &list.words {
                    self.push(" ");
                    self.word(word);
                }
                self.push(" |");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn reprint(source: &str) -> String {
        let (program, diagnostics) = parse(source);
        assert!(
            diagnostics.iter().all(|d| !d.is_error()),
            "unexpected diagnostics for {:?}: {:?}",
            source,
            diagnostics
        );
        to_source(&program)
    }

    /// Printing is stable: the printed form reparses to the same printed form
    fn assert_stable(source: &str) -> String {
        let once = reprint(source);
        let twice = reprint(&once);
        assert_eq!(once, twice, "printer output not stable for {:?}", source);
        once
    }

    #[test]
    fn test_declarations() {
        assert_eq!(assert_stable("var x=1"), "var x = 1\n");
        assert_eq!(assert_stable("setvar a.b[0] += 2"), "setvar a.b[0] += 2\n");
        assert_eq!(assert_stable("const c = null"), "const c = null\n");
        assert_eq!(assert_stable("limit = 10"), "limit = 10\n");
    }

    #[test]
    fn test_expressions_are_parenthesized() {
        assert_eq!(assert_stable("var x = 1 + 2 * 3"), "var x = 1 + (2 * 3)\n");
        assert_eq!(assert_stable("var x = (1 - 2) - 3"), "var x = (1 - 2) - 3\n");
        assert_eq!(assert_stable("var x = not a and -b"), "var x = (not a) and (-b)\n");
        assert_eq!(assert_stable("var x = a.b[c].d(1; k=2)"), "var x = a.b[c].d(1; k = 2)\n");
    }

    #[test]
    fn test_collections_and_strings() {
        assert_stable(r#"var x = [1, 'two', "three $n", r'\raw', {a: 1, 'b': 2, [k]: 3}]"#);
        assert_stable("var x = :| a b c |");
        assert_stable("var x = / d+ /");
        assert_stable("var s = '''multi\nline'''");
        assert_stable(r"var s = b'\y00'");
    }

    #[test]
    fn test_command_calls() {
        assert_eq!(
            assert_stable("FOO=1  echo   hi 2>&1 >out.txt"),
            "FOO=1 echo hi 2>&1 >out.txt\n"
        );
        assert_stable(r#"echo pre"$x"post ${y:-z} $(ls | wc -l) @items a\ b"#);
        assert_stable("ls -l | grep foo | wc -l");
        assert_stable("! grep -q x file");
    }

    #[test]
    fn test_control_flow() {
        let printed = assert_stable("if (x) { echo a } elif test -f y { echo b } else { echo c }");
        assert_eq!(
            printed,
            "if (x) {\n  echo a\n} elif test -f y {\n  echo b\n} else {\n  echo c\n}\n"
        );
        assert_stable("while (i < 3) { setvar i += 1 }");
        assert_stable("for i in (0 ..< 10) { echo $i }");
        assert_stable("for k, v in (d) { echo $k }");
        assert_stable("for f in *.py *.sh { echo $f }");
        assert_stable("case (x) {\n  *.py | *.sh { echo script }\n  (1) { echo one }\n  / d+ / { echo num }\n  (else) { echo other }\n}");
    }

    #[test]
    fn test_definitions() {
        assert_eq!(
            assert_stable("func add(a, b=1; c) { return (a + b) }"),
            "func add(a, b = 1; c) {\n  return (a + b)\n}\n"
        );
        assert_stable("func f(...rest) { return }");
        assert_stable("proc deploy (target; typed; verbose=false; block) { echo $target }");
        assert_stable("proc p (;;; b) { return 1 }");
        assert_stable("proc p { echo }");
    }

    #[test]
    fn test_error_statement_becomes_comment() {
        let (program, _) = parse("var = 1\necho ok");
        let printed = to_source(&program);
        assert!(printed.starts_with("# error: "));
        assert!(printed.ends_with("echo ok\n"));
    }

    #[test]
    fn test_expression_and_word_helpers() {
        let (program, _) = parse("var x = 2 ** 3 => f()");
        let StatementNode::VariableDeclaration(decl) = &program.statements[0] else {
            panic!("expected declaration");
        };
        assert_eq!(expression_to_source(&decl.value), "2 ** (3 => f())");

        let (program, _) = parse("echo a'b'$c");
        let StatementNode::CommandCall(call) = &program.statements[0] else {
            panic!("expected command call");
        };
        let ArgumentNode::Word(word) = &call.arguments[0] else {
            panic!("expected word");
        };
        assert_eq!(word_to_source(word), "a'b'$c");
    }
}
