use listscript::{
    Definition, Node, NodeKind,
    diagnostics::{DiagnosticKind, SourceSpan},
    lexer::{DEFAULT_MAX_TOKEN_LEN, Lexer, Token, TokenKind},
    parser::{DEFAULT_MAX_NESTING, parse_line, parse_line_with},
};

fn lexemes(source: &str) -> Vec<String> {
    Lexer::new(source)
        .tokenize()
        .expect("line should lex")
        .into_iter()
        .map(|token| token.lexeme)
        .collect()
}

fn parse(source: &str) -> Node {
    parse_line(source)
        .expect("line should parse")
        .expect("line should hold an expression")
}

fn parse_error(source: &str) -> String {
    match parse_line(source) {
        Ok(node) => panic!("expected parse error, found {node:?}"),
        Err(diag) => {
            assert_eq!(diag.kind, DiagnosticKind::Parser);
            diag.message
        }
    }
}

#[test]
fn splits_parentheses_and_atoms() {
    assert_eq!(
        lexemes("def f args(x) list(+ x 1)"),
        ["def", "f", "args", "(", "x", ")", "list", "(", "+", "x", "1", ")"]
    );
}

#[test]
fn quoted_strings_are_single_tagged_tokens() {
    let tokens = Lexer::new("write(\"hello world\")").tokenize().unwrap();
    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[2].kind, TokenKind::Quoted);
    assert_eq!(tokens[2].lexeme, "hello world");
    assert!(!tokens[2].is("hello world"));
}

#[test]
fn comments_run_to_end_of_line() {
    assert_eq!(lexemes("1 ; ignored ( )"), ["1"]);
    assert_eq!(lexemes("; only a comment"), Vec::<String>::new());
    assert_eq!(lexemes("a;b"), ["a;b"]);
}

#[test]
fn token_spans_are_byte_offsets() {
    let tokens = Lexer::new("ab (").tokenize().unwrap();
    assert_eq!(
        tokens[0],
        Token {
            kind: TokenKind::Atom,
            lexeme: "ab".into(),
            span: SourceSpan::new(0, 2),
        }
    );
    assert_eq!(tokens[1].span, SourceSpan::new(3, 4));
}

#[test]
fn long_tokens_are_truncated() {
    let long = "a".repeat(40);
    assert_eq!(lexemes(&long), ["a".repeat(31)]);

    let tokens = Lexer::with_max_token_len("abcdefgh x", 5).tokenize().unwrap();
    assert_eq!(tokens[0].lexeme, "abcde");
    assert_eq!(tokens[1].lexeme, "x");

    let tokens = Lexer::with_max_token_len("\"abcdefgh\" x", 3)
        .tokenize()
        .unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Quoted);
    assert_eq!(tokens[0].lexeme, "abc");
    assert_eq!(tokens[1].lexeme, "x");
}

#[test]
fn unterminated_string_is_a_lexer_error() {
    let err = parse_line("write(\"abc").unwrap_err();
    assert_eq!(err.kind, DiagnosticKind::Lexer);
}

#[test]
fn peek_char_skips_space_and_comments_without_consuming() {
    let mut lexer = Lexer::new("   (x");
    assert_eq!(lexer.peek_char(), Some('('));
    assert_eq!(lexer.peek_char(), Some('('));
    assert_eq!(lexer.next_token().unwrap().unwrap().kind, TokenKind::LParen);

    let lexer = Lexer::new("  ; comment (");
    assert_eq!(lexer.peek_char(), None);
}

#[test]
fn classifies_atoms() {
    assert_eq!(parse("42"), Node::number(42));
    assert_eq!(parse("0"), Node::number(0));
    assert_eq!(parse("-5"), Node::number(-5));
    assert_eq!(parse("\"hi\""), Node::string("hi"));
    assert_eq!(parse("\"\""), Node::string(""));
    assert_eq!(parse("\"42\""), Node::number(42));
    assert_eq!(parse("abc"), Node::symbol("abc"));
    assert_eq!(parse("12abc"), Node::symbol("12abc"));
    assert_eq!(parse("eq?"), Node::symbol("eq?"));
}

#[test]
fn atom_followed_by_paren_is_a_call() {
    let node = parse("f(1 2)");
    assert_eq!(
        node,
        Node::call(vec![Node::symbol("f"), Node::number(1), Node::number(2)])
    );
    assert_eq!(node.to_string(), "func_call(f 1 2)");
    assert_eq!(parse("f (1)"), Node::call(vec![Node::symbol("f"), Node::number(1)]));
    assert_eq!(parse("foo ; (bar)"), Node::symbol("foo"));
}

#[test]
fn list_data_and_bare_parens() {
    assert_eq!(parse("list()"), Node::list(Vec::new()));
    assert_eq!(parse("data()"), Node::data(Vec::new()));
    assert_eq!(
        parse("(1 x)"),
        Node::list(vec![Node::number(1), Node::symbol("x")])
    );
    assert_eq!(
        parse("list(1 \"a\" data(x))").to_string(),
        "list(1 \"a\" data(x))"
    );
}

#[test]
fn variable_def_has_two_children() {
    let node = parse("def x list(1 2)");
    let NodeKind::Def(Definition::Variable { name, value }) = node.kind() else {
        panic!("expected variable def, found {node:?}");
    };
    assert_eq!(name, "x");
    assert_eq!(value.to_string(), "list(1 2)");
    assert_eq!(node.children().len(), 2);
}

#[test]
fn function_def_has_three_children() {
    let node = parse("def add args(a b) +(a b)");
    let children = node.children();
    assert_eq!(children.len(), 3);
    assert_eq!(children[0], Node::symbol("add"));
    assert_eq!(children[1], Node::args(vec![Node::symbol("a"), Node::symbol("b")]));
    assert_eq!(children[2].to_string(), "func_call(+ a b)");

    let NodeKind::Def(definition) = node.kind() else {
        panic!("expected def");
    };
    assert_eq!(definition.name(), "add");

    let empty = parse("def zero args() 0");
    assert_eq!(empty.children()[1], Node::args(Vec::new()));
}

#[test]
fn if_has_three_children() {
    let node = parse("if list(> 10 100) list(1) list(0)");
    assert_eq!(node.children().len(), 3);
    assert_eq!(node.to_string(), "if(list(> 10 100) list(1) list(0))");
}

#[test]
fn nested_forms() {
    let node = parse(
        "def factorial args(x) list(if list(eq? x 1) 1 list(* x list(factorial list(- x 1))))",
    );
    let NodeKind::Def(Definition::Function { body, .. }) = node.kind() else {
        panic!("expected function def");
    };
    let body = body.as_list().expect("body is a list");
    assert_eq!(body.len(), 1);
    assert!(matches!(body[0].kind(), NodeKind::If { .. }));
}

#[test]
fn blank_lines_hold_no_expression() {
    assert!(parse_line("").unwrap().is_none());
    assert!(parse_line("   ").unwrap().is_none());
    assert!(parse_line(";; comment").unwrap().is_none());
}

#[test]
fn malformed_input_is_reported() {
    assert_eq!(parse_error("if true 1"), "missing false branch in `if`");
    assert_eq!(parse_error("if"), "missing condition in `if`");
    assert_eq!(parse_error("list(1 2"), "expected `)` to close the list");
    assert_eq!(parse_error("list 1"), "expected `(` after `list`");
    assert_eq!(parse_error("data"), "expected `(` after `data`");
    assert_eq!(parse_error("def"), "expected a name after `def`");
    assert_eq!(parse_error("def (x) 1"), "expected a name after `def`");
    assert_eq!(parse_error("def f args x"), "expected `(` after `args`");
    assert_eq!(parse_error("def f args((x)) 1"), "expected a parameter name");
    assert_eq!(parse_error("def f args(x)"), "expected a body for function `f`");
    assert_eq!(parse_error(")"), "unexpected `)`");
    assert_eq!(parse_error("1 2"), "unexpected `2` after expression");
}

#[test]
fn parse_errors_carry_positions() {
    let err = parse_line("list(1 ) )").unwrap_err();
    assert_eq!(err.span, Some(SourceSpan::new(9, 10)));
    assert_eq!(err.to_string(), "Parse error: unexpected `)` after expression (column 10)");
}

#[test]
fn token_limit_is_configurable() {
    let node = parse_line_with("abcdefgh", 4, DEFAULT_MAX_NESTING)
        .unwrap()
        .unwrap();
    assert_eq!(node, Node::symbol("abcd"));
}

fn nested_lists(depth: usize) -> String {
    format!("{}1{}", "list(".repeat(depth), ")".repeat(depth))
}

#[test]
fn deep_nesting_is_a_parse_error() {
    assert_eq!(parse_error(&nested_lists(3000)), "expression nested too deeply");
    assert_eq!(
        parse_error(&format!("{}1{}", "(".repeat(3000), ")".repeat(3000))),
        "expression nested too deeply"
    );
    assert_eq!(
        parse_error(&format!("{}1{}", "f(".repeat(3000), ")".repeat(3000))),
        "expression nested too deeply"
    );
    assert_eq!(
        parse_error(&format!("{}1{}", "if true ".repeat(3000), " 2".repeat(3000))),
        "expression nested too deeply"
    );
    assert_eq!(
        parse_error(&format!("{}1", "def x ".repeat(3000))),
        "expression nested too deeply"
    );
}

#[test]
fn nesting_up_to_the_limit_parses() {
    let mut node = parse(&nested_lists(DEFAULT_MAX_NESTING));
    let mut depth = 0;
    while let Some([child]) = node.as_list() {
        node = child.clone();
        depth += 1;
    }
    assert_eq!(depth, DEFAULT_MAX_NESTING);
    assert_eq!(node, Node::number(1));

    assert_eq!(
        parse_error(&nested_lists(DEFAULT_MAX_NESTING + 1)),
        "expression nested too deeply"
    );
}

#[test]
fn nesting_limit_is_configurable() {
    assert!(parse_line_with(&nested_lists(3), DEFAULT_MAX_TOKEN_LEN, 3).is_ok());

    let err = parse_line_with(&nested_lists(4), DEFAULT_MAX_TOKEN_LEN, 3).unwrap_err();
    assert_eq!(err.kind, DiagnosticKind::Parser);
    assert_eq!(err.message, "expression nested too deeply");
    assert_eq!(err.span, Some(SourceSpan::new(19, 20)));
    assert!(err.notes.iter().any(|note| note == "nesting is limited to 3 levels"));
}
