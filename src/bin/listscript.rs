use std::{fs, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use listscript::{
    Interpreter, InterpreterConfig, ListScriptError, Repl, diagnostics::Diagnostic,
    lexer::DEFAULT_MAX_TOKEN_LEN, parser::DEFAULT_MAX_NESTING, runtime::DEFAULT_MAX_CALL_DEPTH,
};

#[derive(Parser)]
#[command(author, version, about = "ListScript language interpreter")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Deepest chain of nested user-function calls
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_depth: usize,

    /// Longest token kept by the lexer
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_TOKEN_LEN)]
    max_token_len: usize,

    /// Deepest nesting of lists, calls and special forms on one line
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_NESTING)]
    max_nesting: usize,

    /// Log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run a ListScript file, one expression per line
    Run { script: PathBuf },
    /// Start an interactive session
    Repl,
    /// Evaluate a single line and print the result
    Eval { source: String },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = InterpreterConfig {
        max_call_depth: args.max_depth,
        max_token_len: args.max_token_len,
        max_nesting: args.max_nesting,
    };
    let outcome = match args.command.unwrap_or(Command::Repl) {
        Command::Run { script } => run_script(script, config),
        Command::Repl => Repl::with_config(config).run().map(|_| true),
        Command::Eval { source } => eval_snippet(&source, config),
    };
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns `Ok(false)` when any line evaluated to an error value.
fn run_script(path: PathBuf, config: InterpreterConfig) -> Result<bool, ListScriptError> {
    let source = fs::read_to_string(&path).map_err(|err| {
        Diagnostic::new(
            listscript::DiagnosticKind::Runtime,
            format!("cannot read `{}`: {err}", path.display()),
        )
    })?;
    let mut interpreter = Interpreter::with_config(config);
    let mut clean = true;
    for (idx, line) in source.lines().enumerate() {
        let result = interpreter.eval_line(line).map_err(|err| match err {
            ListScriptError::Diagnostic(diag) => ListScriptError::from(
                diag.with_note(format!("in {} on line {}", path.display(), idx + 1)),
            ),
            other => other,
        })?;
        if let Some(value) = result.filter(|value| value.is_error()) {
            eprintln!("{}:{}: {value}", path.display(), idx + 1);
            clean = false;
        }
    }
    Ok(clean)
}

fn eval_snippet(source: &str, config: InterpreterConfig) -> Result<bool, ListScriptError> {
    let mut interpreter = Interpreter::with_config(config);
    let result = interpreter.eval_source(source)?;
    println!("{}", listscript::node::display_result(result.as_ref()));
    Ok(!result.is_some_and(|value| value.is_error()))
}
