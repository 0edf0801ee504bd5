use std::{io::Write, sync::LazyLock};

use indexmap::IndexMap;

use crate::{
    environment::Environment,
    node::{Node, NodeKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Arithmetic,
    Comparison,
    List,
    Output,
}

type Callback = fn(&[Node], &mut dyn Write) -> Node;

pub struct Primitive {
    pub name: &'static str,
    pub arity: usize,
    pub category: Category,
    callback: Callback,
}

impl Primitive {
    pub fn call(&self, args: &[Node], out: &mut dyn Write) -> Node {
        if args.len() != self.arity {
            return Node::error(self.arity_message());
        }
        (self.callback)(args, out)
    }

    fn arity_message(&self) -> String {
        match self.category {
            Category::Arithmetic => {
                "Arity mismatch: Expected 2 arguments for arithmetic operator".to_string()
            }
            Category::Comparison => {
                "Arity mismatch: Expected 2 arguments for comparison operator".to_string()
            }
            Category::List | Category::Output => {
                let plural = if self.arity == 1 { "" } else { "s" };
                format!(
                    "Arity mismatch: '{}' expects {} argument{plural}",
                    self.name, self.arity
                )
            }
        }
    }
}

static PRIMITIVES: LazyLock<IndexMap<&'static str, Primitive>> = LazyLock::new(|| {
    let mut table = IndexMap::new();
    let mut register = |name: &'static str, arity: usize, category: Category, callback: Callback| {
        table.insert(
            name,
            Primitive {
                name,
                arity,
                category,
                callback,
            },
        );
    };
    register("+", 2, Category::Arithmetic, add);
    register("-", 2, Category::Arithmetic, sub);
    register("*", 2, Category::Arithmetic, mul);
    register("/", 2, Category::Arithmetic, div);
    register("<", 2, Category::Comparison, less);
    register(">", 2, Category::Comparison, greater);
    register("eq?", 2, Category::Comparison, equal);
    register("write", 1, Category::Output, write);
    register("first", 1, Category::List, first);
    register("rest", 1, Category::List, rest);
    register("cons", 2, Category::List, cons);
    table
});

pub fn lookup(name: &str) -> Option<&'static Primitive> {
    PRIMITIVES.get(name)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    PRIMITIVES.keys().copied()
}

/// Applies the primitive called `name` to already evaluated arguments.
pub fn apply(name: &str, args: &[Node], out: &mut dyn Write) -> Node {
    match lookup(name) {
        Some(primitive) => primitive.call(args, out),
        None => Node::error(format!("Unknown primitive operator '{name}'")),
    }
}

/// Binds every primitive plus `true` and `false` on top of `env`.
pub fn install(env: &Environment) -> Environment {
    let mut env = names().fold(env.clone(), |env, name| {
        env.define(name, Node::primitive(name))
    });
    env = env.define("true", Node::boolean(true));
    env.define("false", Node::boolean(false))
}

fn numbers(args: &[Node]) -> Result<(i64, i64), Node> {
    match (args[0].kind(), args[1].kind()) {
        (NodeKind::Number(a), NodeKind::Number(b)) => Ok((*a, *b)),
        (NodeKind::Number(_), _) => Err(not_a_number(&args[1])),
        _ => Err(not_a_number(&args[0])),
    }
}

fn not_a_number(arg: &Node) -> Node {
    Node::error(format!(
        "Type error: Arguments must be numbers, found {}",
        arg.type_name()
    ))
}

fn arithmetic(args: &[Node], op: fn(i64, i64) -> Option<i64>) -> Node {
    match numbers(args) {
        Ok((a, b)) => op(a, b)
            .map(Node::number)
            .unwrap_or_else(|| Node::error("Integer overflow")),
        Err(err) => err,
    }
}

fn comparison(args: &[Node], op: fn(i64, i64) -> bool) -> Node {
    match numbers(args) {
        Ok((a, b)) => Node::boolean(op(a, b)),
        Err(err) => err,
    }
}

fn add(args: &[Node], _: &mut dyn Write) -> Node {
    arithmetic(args, i64::checked_add)
}

fn sub(args: &[Node], _: &mut dyn Write) -> Node {
    arithmetic(args, i64::checked_sub)
}

fn mul(args: &[Node], _: &mut dyn Write) -> Node {
    arithmetic(args, i64::checked_mul)
}

fn div(args: &[Node], _: &mut dyn Write) -> Node {
    if let Ok((_, 0)) = numbers(args) {
        return Node::error("Division by zero");
    }
    arithmetic(args, i64::checked_div)
}

fn less(args: &[Node], _: &mut dyn Write) -> Node {
    comparison(args, |a, b| a < b)
}

fn greater(args: &[Node], _: &mut dyn Write) -> Node {
    comparison(args, |a, b| a > b)
}

fn equal(args: &[Node], _: &mut dyn Write) -> Node {
    comparison(args, |a, b| a == b)
}

fn non_empty_list<'a>(value: &'a Node, name: &str) -> Result<&'a [Node], Node> {
    match value.as_list() {
        Some([]) => Err(Node::error(format!("'{name}' called on empty list"))),
        Some(children) => Ok(children),
        None => Err(Node::error(format!(
            "Type error: '{name}' expects a list, found {}",
            value.type_name()
        ))),
    }
}

fn first(args: &[Node], _: &mut dyn Write) -> Node {
    match non_empty_list(&args[0], "first") {
        Ok(children) => children[0].clone(),
        Err(err) => err,
    }
}

fn rest(args: &[Node], _: &mut dyn Write) -> Node {
    match non_empty_list(&args[0], "rest") {
        Ok(children) => Node::list(children[1..].to_vec()),
        Err(err) => err,
    }
}

fn cons(args: &[Node], _: &mut dyn Write) -> Node {
    let Some(tail) = args[1].as_list() else {
        return Node::error(format!(
            "Type error: 'cons' second argument must be a list, found {}",
            args[1].type_name()
        ));
    };
    let mut children = Vec::with_capacity(tail.len() + 1);
    children.push(args[0].clone());
    children.extend(tail.iter().cloned());
    Node::list(children)
}

fn write(args: &[Node], out: &mut dyn Write) -> Node {
    match writeln!(out, "{}", args[0]).and_then(|_| out.flush()) {
        Ok(()) => Node::boolean(true),
        Err(err) => Node::error(format!("write failed: {err}")),
    }
}
