use std::io::{self, Write};

use crate::{
    diagnostics::{ListScriptError, Result},
    environment::Environment,
    lexer::DEFAULT_MAX_TOKEN_LEN,
    node::{Definition, Node, NodeKind},
    parser::{self, DEFAULT_MAX_NESTING},
    primitives,
};

pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Deepest chain of nested user-function calls before evaluation fails.
    pub max_call_depth: usize,
    /// Longest token the lexer keeps; longer tokens are truncated.
    pub max_token_len: usize,
    /// Deepest nesting of lists, calls and special forms the parser accepts.
    pub max_nesting: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

/// Tree-walking evaluator. Failures come back as `Node::Error` values and
/// every caller returns the first one it sees unchanged.
pub struct Evaluator {
    out: Box<dyn Write>,
    max_call_depth: usize,
    depth: usize,
}

impl Evaluator {
    pub fn new(out: Box<dyn Write>, max_call_depth: usize) -> Self {
        Self {
            out,
            max_call_depth,
            depth: 0,
        }
    }

    pub fn eval(&mut self, node: &Node, env: &mut Environment) -> Node {
        match node.kind() {
            NodeKind::Number(_)
            | NodeKind::Boolean(_)
            | NodeKind::String(_)
            | NodeKind::Error(_)
            | NodeKind::PrimitiveOp(_)
            | NodeKind::Data(_) => node.clone(),
            NodeKind::Symbol(name) => env
                .lookup(name)
                .unwrap_or_else(|| Node::error(format!("Undefined symbol '{name}'"))),
            NodeKind::List(children) => self.eval_list(children, env),
            NodeKind::FunctionCall(children) => self.eval_call(children, env),
            NodeKind::Def(definition) => self.eval_def(node, definition, env),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.eval_if(condition, then_branch, else_branch, env),
            NodeKind::Args(_) => Node::error("Cannot evaluate expression of this type"),
        }
    }

    fn eval_list(&mut self, children: &[Node], env: &mut Environment) -> Node {
        match children.first().map(Node::kind) {
            Some(NodeKind::Symbol(_) | NodeKind::PrimitiveOp(_)) => {
                return self.eval_call(children, env);
            }
            // A parenthesized `if` or `def` stands for the form itself.
            Some(NodeKind::If { .. } | NodeKind::Def(_)) if children.len() == 1 => {
                return self.eval(&children[0], env);
            }
            _ => {}
        }
        let mut values = Vec::with_capacity(children.len());
        for child in children {
            let value = self.eval(child, env);
            if value.is_error() {
                return value;
            }
            values.push(value);
        }
        Node::list(values)
    }

    fn eval_call(&mut self, children: &[Node], env: &mut Environment) -> Node {
        let Some((operator, arg_exprs)) = children.split_first() else {
            return Node::list(Vec::new());
        };
        let operator = self.eval(operator, env);
        if operator.is_error() {
            return operator;
        }
        let mut args = Vec::with_capacity(arg_exprs.len());
        for expr in arg_exprs {
            let value = self.eval(expr, env);
            if value.is_error() {
                return value;
            }
            args.push(value);
        }
        match operator.kind() {
            NodeKind::PrimitiveOp(name) => primitives::apply(name, &args, &mut *self.out),
            NodeKind::Def(Definition::Function { name, params, body }) => {
                self.apply_function(&operator, name, params, body, args, env)
            }
            _ => Node::error("Cannot apply a non-function or undefined operator"),
        }
    }

    /// Calls a user-defined function. The new frame extends the caller's
    /// environment, so scoping is dynamic: the body sees the caller's bindings.
    fn apply_function(
        &mut self,
        function: &Node,
        name: &str,
        params: &Node,
        body: &Node,
        args: Vec<Node>,
        env: &Environment,
    ) -> Node {
        let NodeKind::Args(params) = params.kind() else {
            return Node::error(format!("Malformed parameter list in function '{name}'"));
        };
        if params.len() != args.len() {
            return Node::error(format!(
                "Arity mismatch in user-defined function '{name}': expected {} argument{}, got {}",
                params.len(),
                if params.len() == 1 { "" } else { "s" },
                args.len()
            ));
        }
        if self.depth >= self.max_call_depth {
            tracing::warn!(function = name, limit = self.max_call_depth, "call depth limit hit");
            return Node::error(format!(
                "Recursion depth limit exceeded ({})",
                self.max_call_depth
            ));
        }

        let mut frame = env.define(name, function.clone());
        for (param, arg) in params.iter().zip(args) {
            let NodeKind::Symbol(param) = param.kind() else {
                return Node::error(format!("Malformed parameter list in function '{name}'"));
            };
            frame = frame.define(param.as_str(), arg);
        }

        tracing::trace!(function = name, depth = self.depth + 1, "apply");
        self.depth += 1;
        let result = self.eval(body, &mut frame);
        self.depth -= 1;
        result
    }

    fn eval_def(&mut self, node: &Node, definition: &Definition, env: &mut Environment) -> Node {
        match definition {
            Definition::Function { name, .. } => {
                tracing::debug!(name = name.as_str(), "defined function");
                *env = env.define(name.as_str(), node.clone());
                Node::boolean(true)
            }
            Definition::Variable { name, value } => {
                let value = self.eval(value, env);
                tracing::debug!(name = name.as_str(), %value, "defined variable");
                *env = env.define(name.as_str(), value.clone());
                value
            }
        }
    }

    fn eval_if(
        &mut self,
        condition: &Node,
        then_branch: &Node,
        else_branch: &Node,
        env: &mut Environment,
    ) -> Node {
        let condition = self.eval(condition, env);
        match condition.kind() {
            NodeKind::Error(_) => condition,
            NodeKind::Boolean(true) => self.eval(then_branch, env),
            NodeKind::Boolean(false) => self.eval(else_branch, env),
            _ => Node::error(format!(
                "'if' condition must be a boolean, found {}",
                condition.type_name()
            )),
        }
    }
}

/// Owns the top-level environment and feeds it one line at a time.
pub struct Interpreter {
    env: Environment,
    evaluator: Evaluator,
    config: InterpreterConfig,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        Self::with_output(config, io::stdout())
    }

    /// Interpreter whose `write` primitive prints to `out`.
    pub fn with_output(config: InterpreterConfig, out: impl Write + 'static) -> Self {
        Self {
            env: primitives::install(&Environment::empty()),
            evaluator: Evaluator::new(Box::new(out), config.max_call_depth),
            config,
        }
    }

    /// Parses and evaluates one line. Blank lines yield `Ok(None)`; parse
    /// failures leave the environment untouched.
    pub fn eval_line(&mut self, line: &str) -> Result<Option<Node>> {
        let InterpreterConfig {
            max_token_len,
            max_nesting,
            ..
        } = self.config;
        let Some(expr) = parser::parse_line_with(line, max_token_len, max_nesting)? else {
            return Ok(None);
        };
        tracing::trace!(%expr, "eval");
        Ok(Some(self.evaluator.eval(&expr, &mut self.env)))
    }

    /// Evaluates `source` line by line and returns the last result.
    pub fn eval_source(&mut self, source: &str) -> Result<Option<Node>> {
        let mut last = None;
        for (idx, line) in source.lines().enumerate() {
            match self.eval_line(line) {
                Ok(Some(value)) => last = Some(value),
                Ok(None) => {}
                Err(ListScriptError::Diagnostic(diag)) => {
                    return Err(diag.with_note(format!("on line {}", idx + 1)).into());
                }
                Err(other) => return Err(other),
            }
        }
        Ok(last)
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn lookup(&self, name: &str) -> Option<Node> {
        self.env.lookup(name)
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Bindings added since start-up, newest first.
    pub fn user_bindings(&self) -> impl Iterator<Item = (&str, &Node)> {
        let builtin = primitives::names().count() + 2;
        let user = self.env.len().saturating_sub(builtin);
        self.env.iter().take(user)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
