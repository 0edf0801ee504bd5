//! The single node type shared by syntax and runtime values.
//!
//! A `Node` is an immutable, reference-counted handle. Cloning a node aliases
//! it; list transformations such as `rest` and `cons` build new containers
//! around the same child handles instead of copying them.

use std::{fmt, rc::Rc};

#[derive(Clone, PartialEq)]
pub struct Node(Rc<NodeKind>);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Number(i64),
    Boolean(bool),
    String(String),
    Symbol(String),
    PrimitiveOp(String),
    Error(String),
    List(Vec<Node>),
    Data(Vec<Node>),
    Args(Vec<Node>),
    Def(Definition),
    If {
        condition: Node,
        then_branch: Node,
        else_branch: Node,
    },
    FunctionCall(Vec<Node>),
}

/// Payload of a `def` node. A `Function` definition is also the runtime
/// representation of the function it defines.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Variable { name: String, value: Node },
    Function { name: String, params: Node, body: Node },
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Variable { name, .. } | Definition::Function { name, .. } => name,
        }
    }
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self(Rc::new(kind))
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0
    }

    pub fn number(value: i64) -> Self {
        Self::new(NodeKind::Number(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(NodeKind::Boolean(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(NodeKind::String(value.into()))
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Symbol(name.into()))
    }

    pub fn primitive(name: impl Into<String>) -> Self {
        Self::new(NodeKind::PrimitiveOp(name.into()))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NodeKind::Error(message.into()))
    }

    pub fn list(children: Vec<Node>) -> Self {
        Self::new(NodeKind::List(children))
    }

    pub fn data(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Data(children))
    }

    pub fn args(params: Vec<Node>) -> Self {
        Self::new(NodeKind::Args(params))
    }

    pub fn variable_def(name: impl Into<String>, value: Node) -> Self {
        Self::new(NodeKind::Def(Definition::Variable {
            name: name.into(),
            value,
        }))
    }

    pub fn function_def(name: impl Into<String>, params: Node, body: Node) -> Self {
        Self::new(NodeKind::Def(Definition::Function {
            name: name.into(),
            params,
            body,
        }))
    }

    pub fn if_node(condition: Node, then_branch: Node, else_branch: Node) -> Self {
        Self::new(NodeKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    pub fn call(children: Vec<Node>) -> Self {
        Self::new(NodeKind::FunctionCall(children))
    }

    /// True when both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind(), NodeKind::Error(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self.kind() {
            NodeKind::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self.kind() {
            NodeKind::List(children) => Some(children),
            _ => None,
        }
    }

    /// The node's children in positional order, as aliased handles. A `Def`
    /// yields its name as a symbol followed by the value, or by the parameter
    /// list and body; an `If` always yields three children.
    pub fn children(&self) -> Vec<Node> {
        match self.kind() {
            NodeKind::List(children)
            | NodeKind::Data(children)
            | NodeKind::Args(children)
            | NodeKind::FunctionCall(children) => children.clone(),
            NodeKind::Def(Definition::Variable { name, value }) => {
                vec![Node::symbol(name.as_str()), value.clone()]
            }
            NodeKind::Def(Definition::Function { name, params, body }) => {
                vec![Node::symbol(name.as_str()), params.clone(), body.clone()]
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => vec![condition.clone(), then_branch.clone(), else_branch.clone()],
            _ => Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind() {
            NodeKind::Number(_) => "Number",
            NodeKind::Boolean(_) => "Boolean",
            NodeKind::String(_) => "String",
            NodeKind::Symbol(_) => "Symbol",
            NodeKind::PrimitiveOp(_) => "PrimitiveOp",
            NodeKind::Error(_) => "Error",
            NodeKind::List(_) => "List",
            NodeKind::Data(_) => "Data",
            NodeKind::Args(_) => "Args",
            NodeKind::Def(_) => "Def",
            NodeKind::If { .. } => "If",
            NodeKind::FunctionCall(_) => "FunctionCall",
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind().fmt(f)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            NodeKind::Number(n) => write!(f, "{n}"),
            NodeKind::Boolean(b) => write!(f, "{b}"),
            NodeKind::String(s) => write!(f, "\"{s}\""),
            NodeKind::Symbol(name) | NodeKind::PrimitiveOp(name) => write!(f, "{name}"),
            NodeKind::Error(message) => write!(f, "Error: {message}"),
            NodeKind::List(children) => write_sequence(f, "list", children),
            NodeKind::Data(children) => write_sequence(f, "data", children),
            NodeKind::Args(children) => write_sequence(f, "args", children),
            NodeKind::FunctionCall(children) => write_sequence(f, "func_call", children),
            NodeKind::Def(Definition::Function { name, .. }) => write!(f, "<function {name}>"),
            NodeKind::Def(Definition::Variable { name, value }) => {
                write!(f, "def({name} {value})")
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "if({condition} {then_branch} {else_branch})"),
        }
    }
}

fn write_sequence(f: &mut fmt::Formatter<'_>, tag: &str, children: &[Node]) -> fmt::Result {
    write!(f, "{tag}(")?;
    for (idx, child) in children.iter().enumerate() {
        if idx > 0 {
            write!(f, " ")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, ")")
}

/// Renders an optional evaluation result, printing `nil` for no value.
pub fn display_result(result: Option<&Node>) -> String {
    match result {
        Some(node) => node.to_string(),
        None => "nil".to_string(),
    }
}
