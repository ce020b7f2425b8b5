use proptest::prelude::*;
use ysh_syntax::{parse, parse_with_options, to_source, ParserOptions, StatementNode};

const MAX_INPUT_BYTES: usize = 256;

fn assert_statement_in_bounds(statement: &StatementNode, len: usize) -> Result<(), TestCaseError> {
    let span = statement.span();
    prop_assert!(span.start <= span.end && span.end <= len, "{:?} outside 0..{}", span, len);
    if let StatementNode::Piped(piped) = statement {
        assert_statement_in_bounds(&piped.left, len)?;
        assert_statement_in_bounds(&piped.right, len)?;
    }
    Ok(())
}

fn name() -> impl Strategy<Value = String> {
    "v_[a-z0-9]{0,4}"
}

fn expression() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        name(),
        "[1-9][0-9]{0,3}",
        Just("true".to_string()),
        Just("null".to_string()),
        "'[a-z ]{0,6}'",
        "\"[a-z ]{0,4}\\$v_x\"",
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        let operator = prop_oneof![
            Just("+"), Just("-"), Just("*"), Just("/"), Just("**"), Just("=>"),
            Just("=="), Just("<="), Just("~~"), Just("and"), Just("or"), Just("|"),
            Just("^"), Just("&"), Just("<<"), Just("++"),
        ];
        prop_oneof![
            (inner.clone(), operator, inner.clone()).prop_map(|(l, op, r)| format!("{} {} {}", l, op, r)),
            inner.clone().prop_map(|e| format!("({})", e)),
            inner.clone().prop_map(|e| format!("not ({})", e)),
            prop::collection::vec(inner.clone(), 0..3).prop_map(|v| format!("[{}]", v.join(", "))),
            (name(), inner.clone()).prop_map(|(k, v)| format!("{{{}: {}}}", k, v)),
            (name(), inner.clone()).prop_map(|(f, a)| format!("{}({})", f, a)),
            (name(), name()).prop_map(|(o, m)| format!("{}.{}", o, m)),
            (name(), inner).prop_map(|(o, i)| format!("{}[{}]", o, i)),
        ]
    })
}

fn statement() -> impl Strategy<Value = String> {
    let simple = prop_oneof![
        (name(), expression()).prop_map(|(n, e)| format!("var {} = {}", n, e)),
        (name(), expression()).prop_map(|(n, e)| format!("setvar {} += {}", n, e)),
        (name(), expression()).prop_map(|(n, e)| format!("const {} = {}", n, e)),
        prop::collection::vec("[a-z][a-z0-9.-]{0,5}", 1..4).prop_map(|w| format!("echo {}", w.join(" "))),
        ("[a-z]{1,5}", "[a-z]{1,5}").prop_map(|(a, b)| format!("cat {} | grep {}", a, b)),
    ];
    simple.prop_recursive(3, 12, 3, |inner| {
        prop_oneof![
            (expression(), inner.clone()).prop_map(|(c, s)| format!("if ({}) {{ {} }}", c, s)),
            (expression(), inner.clone()).prop_map(|(c, s)| format!("while ({}) {{ {} }}", c, s)),
            (name(), expression(), inner.clone())
                .prop_map(|(n, e, s)| format!("for {} in ({}) {{ {} }}", n, e, s)),
            (name(), name(), expression())
                .prop_map(|(f, p, e)| format!("func {}({}) {{ return ({}) }}", f, p, e)),
            (name(), inner).prop_map(|(p, s)| format!("proc {} {{ {} }}", p, s)),
        ]
    })
}

proptest! {
    #[test]
    fn parse_handles_lossy_utf8_inputs_without_panicking(
        bytes in proptest::collection::vec(any::<u8>(), 0..=MAX_INPUT_BYTES)
    ) {
        let input = String::from_utf8_lossy(&bytes).into_owned();
        let (program, diagnostics) = parse(&input);
        for statement in &program.statements {
            assert_statement_in_bounds(statement, input.len())?;
        }
        for diagnostic in &diagnostics {
            prop_assert!(diagnostic.span.end <= input.len());
        }
    }

    #[test]
    fn parse_handles_shell_shaped_noise_without_panicking(
        input in "[a-z $@^(){}\\[\\]'\"|;&<>=:./\\\\\n-]{0,120}"
    ) {
        let (program, diagnostics) = parse(&input);
        for statement in &program.statements {
            assert_statement_in_bounds(statement, input.len())?;
        }
        for diagnostic in &diagnostics {
            prop_assert!(diagnostic.span.start <= diagnostic.span.end);
            prop_assert!(diagnostic.span.end <= input.len());
        }
    }

    #[test]
    fn deep_nesting_is_reported_not_overflowed(depth in 1usize..400) {
        let input = format!("var x = {}1{}", "(".repeat(depth), ")".repeat(depth));
        let (program, diagnostics) = parse(&input);
        prop_assert_eq!(program.statements.len(), 1);
        // Each paren costs two levels: the bracket and the inner expression
        if depth < 25 {
            prop_assert!(diagnostics.is_empty());
        }
        if depth > 40 {
            prop_assert!(diagnostics.iter().any(|d| d.is_error()));
        }
    }

    #[test]
    fn custom_depth_limit_is_honored(depth in 1usize..200) {
        let input = format!("var x = {}1{}", "[".repeat(depth), "]".repeat(depth));
        let options = ParserOptions { max_depth: 16, ..Default::default() };
        let (_, diagnostics) = parse_with_options(&input, &options);
        if depth < 6 {
            prop_assert!(diagnostics.is_empty());
        }
        if depth > 10 {
            prop_assert!(diagnostics.iter().any(|d| d.is_error()));
        }
    }

    #[test]
    fn printed_programs_reparse_and_reprint_identically(
        statements in proptest::collection::vec(statement(), 1..5)
    ) {
        let source = statements.join("\n");
        let (program, diagnostics) = parse(&source);
        prop_assert!(
            diagnostics.iter().all(|d| !d.is_error()),
            "generated source failed to parse: {:?}\n{:?}",
            source,
            diagnostics
        );
        let once = to_source(&program);
        let (reparsed, diagnostics) = parse(&once);
        prop_assert!(
            diagnostics.iter().all(|d| !d.is_error()),
            "printed source failed to parse: {:?}\n{:?}",
            once,
            diagnostics
        );
        prop_assert_eq!(reparsed.statements.len(), program.statements.len());
        prop_assert_eq!(to_source(&reparsed), once);
    }
}
