//! Interpreter for ListScript, a small keyword-delimited Lisp.
//!
//! One line of source is lexed, parsed into a [`Node`] and evaluated against
//! a persistent [`Environment`]. Syntax and values share the `Node` type.

pub mod diagnostics;
pub mod environment;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod primitives;
pub mod repl;
pub mod runtime;

pub use diagnostics::{Diagnostic, DiagnosticKind, ListScriptError, SourceSpan};
pub use environment::Environment;
pub use node::{Definition, Node, NodeKind};
pub use repl::Repl;
pub use runtime::{Evaluator, Interpreter, InterpreterConfig};
