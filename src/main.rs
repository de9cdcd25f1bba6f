use clap::{ArgAction, Parser};
use log::{debug, info};
use minischeme::io::{LineReader, ReplInput};
use minischeme::{scan_evaluate, Error, ErrorKind, Interpreter, Result, Value};
use rustyline::error::ReadlineError;
use std::path::PathBuf;

/// Default depth limit of the command line. It fits the default stack size
/// of the evaluation thread.
const MAX_DEPTH: usize = 10_000;
const STACK_MIB: usize = 256;

/// Interpreter for a small subset of Scheme. Without files or expressions
/// an interactive session is started.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Source files, evaluated in order in one toplevel environment.
    files: Vec<PathBuf>,

    /// Evaluate an expression after the files.
    #[arg(short, long, value_name = "EXPR")]
    eval: Vec<String>,

    /// Enter the interactive session even when files or expressions are given.
    #[arg(short, long)]
    interactive: bool,

    /// Maximum nesting of non-tail procedure applications.
    #[arg(long, value_name = "N", default_value_t = MAX_DEPTH)]
    max_depth: usize,

    /// Stack size of the evaluation thread, in MiB.
    #[arg(long, value_name = "N", default_value_t = STACK_MIB)]
    stack_mib: usize,

    /// Log more; may be repeated.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);

    let evaluator = std::thread::Builder::new()
        .name("evaluator".to_string())
        .stack_size(args.stack_mib * 1024 * 1024)
        .spawn(move || run(args));

    let success = match evaluator {
        Ok(handle) => handle.join().unwrap_or(false),
        Err(e) => {
            eprintln!("cannot start evaluation thread: {}", e);
            false
        }
    };

    if !success {
        std::process::exit(1);
    }
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Returns false if anything failed.
fn run(args: Args) -> bool {
    let mut interp = Interpreter::new().with_max_depth(args.max_depth);
    let mut success = true;

    for path in &args.files {
        info!("loading {}", path.display());
        let result = std::fs::read_to_string(path)
            .map_err(Error::from)
            .and_then(|text| scan_evaluate(&text, &mut interp));
        success &= report(result);
    }

    for expr in &args.eval {
        success &= report(scan_evaluate(expr, &mut interp));
    }

    if args.interactive || (args.files.is_empty() && args.eval.is_empty()) {
        if let Err(e) = repl(&mut interp) {
            eprintln!("{}", e);
            success = false;
        }
    }

    success
}

fn repl(interp: &mut Interpreter) -> Result<()> {
    let mut input = ReplInput::new(interp.global_env().clone())?;

    loop {
        let source = match input.read_expression() {
            Ok(source) => source,
            Err(e) => match e.kind() {
                ErrorKind::ReadlineError(ReadlineError::Interrupted) => {
                    debug!("input discarded");
                    continue;
                }
                ErrorKind::ReadlineError(ReadlineError::Eof) => return Ok(()),
                _ => return Err(e),
            },
        };

        report(scan_evaluate(&source, interp));
    }
}

/// Print a value, or the error. The unspecified value is not printed.
fn report(result: Result<Value>) -> bool {
    match result {
        Ok(value) => {
            if !value.is_unspecified() {
                println!("{}", value);
            }
            true
        }
        Err(e) => {
            eprintln!("{}", e);
            false
        }
    }
}
