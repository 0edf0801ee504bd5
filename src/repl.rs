use rustyline::{DefaultEditor, error::ReadlineError};

use crate::{
    diagnostics::{ListScriptError, Result},
    lexer::Lexer,
    node::display_result,
    runtime::{Interpreter, InterpreterConfig},
};

pub const BANNER: &str = "ListScript ready.";
pub const PROMPT: &str = "-> ";

pub struct Repl {
    interpreter: Interpreter,
}

/// What the shell should do after handling one line.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Continue,
    Exit,
}

impl Repl {
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        Self {
            interpreter: Interpreter::with_config(config),
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn run(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()?;
        println!("{BANNER}");
        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        editor.add_history_entry(line.as_str()).ok();
                    }
                    if self.handle_line(&line) == Step::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(ListScriptError::from(err)),
            }
        }
        Ok(())
    }

    /// Runs one line of input, printing its result or error.
    pub fn handle_line(&mut self, line: &str) -> Step {
        let trimmed = line.trim();
        if is_bye(trimmed) {
            println!("Bye!");
            return Step::Exit;
        }
        match trimmed {
            "" => return Step::Continue,
            ":quit" | ":exit" => return Step::Exit,
            ":env" => {
                for (name, value) in self.interpreter.user_bindings() {
                    println!("{name} = {value}");
                }
                return Step::Continue;
            }
            _ => {}
        }
        match self.interpreter.eval_line(trimmed) {
            Ok(Some(value)) => println!("{}", display_result(Some(&value))),
            Ok(None) => {}
            Err(ListScriptError::Diagnostic(diag)) => println!("{diag}"),
            Err(other) => eprintln!("error: {other}"),
        }
        Step::Continue
    }
}

/// True when the line's first token is the bare word `bye`.
fn is_bye(line: &str) -> bool {
    matches!(Lexer::new(line).next_token(), Ok(Some(token)) if token.is("bye"))
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}
