use listscript::{Node, Repl, repl::Step};

#[test]
fn bye_exits_when_it_leads_the_line() {
    for line in ["bye", "  bye  ", "bye ; done", "bye;", "bye 1 2"] {
        assert_eq!(Repl::new().handle_line(line), Step::Exit, "line `{line}`");
    }
}

#[test]
fn bye_elsewhere_does_not_exit() {
    for line in ["\"bye\"", "byes", "list(bye)", "; bye", ""] {
        assert_eq!(Repl::new().handle_line(line), Step::Continue, "line `{line}`");
    }
}

#[test]
fn commands_and_expressions() {
    let mut repl = Repl::new();
    assert_eq!(repl.handle_line("def x 4"), Step::Continue);
    assert_eq!(repl.interpreter().lookup("x"), Some(Node::number(4)));
    assert_eq!(repl.handle_line("list(1 2"), Step::Continue);
    assert_eq!(repl.handle_line(":env"), Step::Continue);
    assert_eq!(repl.handle_line(":quit"), Step::Exit);
    assert_eq!(Repl::new().handle_line(":exit"), Step::Exit);
}
