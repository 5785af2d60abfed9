use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use cairn::{
    default_history_path, read_expression, run, CairnError, Interpreter, InterpreterBuilder,
    LineEditorSource, StreamSource, DEFAULT_MAX_EVAL_DEPTH,
};

#[derive(Parser)]
#[command(name = "cairn", version, about = "cairn: a small expression-oriented Lisp")]
struct Cli {
    /// File to execute (`-` reads standard input)
    file: Option<PathBuf>,

    /// Evaluate an expression
    #[arg(short, long)]
    eval: Option<String>,

    /// Prompt shown before each new expression
    #[arg(long, default_value = "> ")]
    prompt: String,

    /// Maximum nesting depth of evaluation
    #[arg(long, default_value_t = DEFAULT_MAX_EVAL_DEPTH)]
    max_depth: usize,

    /// Do not load or save line-editor history
    #[arg(long)]
    no_history: bool,

    /// Log more on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

/// Stack reserved on the session thread per level of evaluation nesting.
const STACK_PER_EVAL_LEVEL: usize = 32 * 1024;
const MIN_SESSION_STACK: usize = 8 * 1024 * 1024;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let stack_size = cli
        .max_depth
        .saturating_mul(STACK_PER_EVAL_LEVEL)
        .max(MIN_SESSION_STACK);
    let outcome = thread::Builder::new()
        .name("cairn-session".to_string())
        .stack_size(stack_size)
        .spawn(move || session(&cli))
        .map_err(|e| CairnError::Io(format!("failed to start session thread: {e}")))
        .and_then(|handle| {
            handle
                .join()
                .map_err(|_| CairnError::Io("session thread panicked".to_string()))?
        });

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn session(cli: &Cli) -> Result<(), CairnError> {
    let mut interpreter = InterpreterBuilder::new()
        .max_eval_depth(cli.max_depth)
        .build()?;

    if let Some(expr) = &cli.eval {
        let val = interpreter.eval_str(expr)?;
        println!("{}", interpreter.display(val));
        Ok(())
    } else if let Some(file) = &cli.file {
        run_file(&mut interpreter, file)
    } else {
        repl(&mut interpreter, cli)
    }
}

fn run_file(interpreter: &mut Interpreter, file: &Path) -> Result<(), CairnError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if file.as_os_str() == "-" {
        let stdin = io::stdin();
        let mut source = StreamSource::new(stdin.lock());
        return run(interpreter, &mut source, &mut out);
    }
    let reader = File::open(file).map_err(|e| CairnError::Io(format!("{}: {e}", file.display())))?;
    let mut source = StreamSource::new(BufReader::new(reader));
    run(interpreter, &mut source, &mut out)
}

enum Flow {
    Continue,
    Quit,
}

fn repl_command(interpreter: &Interpreter, command: &str) -> Result<Flow, CairnError> {
    match command {
        "quit" | "q" => return Ok(Flow::Quit),
        "help" | "h" => print_help(),
        "env" => print_env(interpreter)?,
        other => eprintln!("Unknown command ,{other} (try ,help)"),
    }
    Ok(Flow::Continue)
}

fn repl(interpreter: &mut Interpreter, cli: &Cli) -> Result<(), CairnError> {
    let mut source = LineEditorSource::new(cli.prompt.as_str())?;
    if !cli.no_history {
        source = source.with_history(default_history_path());
    }

    println!("cairn v{}", env!("CARGO_PKG_VERSION"));
    println!("Type ,help for help, ,quit to exit\n");

    loop {
        source.start_expression();
        let tokens = match read_expression(&mut source) {
            Ok(tokens) if tokens.is_empty() => break,
            Ok(tokens) => tokens,
            Err(CairnError::Interrupted) => {
                println!("^C");
                source.discard_line();
                continue;
            }
            // Input ended in the middle of an expression.
            Err(CairnError::UnexpectedEof { .. }) => break,
            Err(e) if e.is_recoverable() => {
                eprintln!("Error: {e}");
                source.discard_line();
                continue;
            }
            Err(e) => return Err(e),
        };

        if let [only] = tokens.as_slice() {
            if let Some(command) = only.as_str().strip_prefix(',') {
                match repl_command(interpreter, command)? {
                    Flow::Quit => break,
                    Flow::Continue => continue,
                }
            }
        }

        match interpreter.eval_tokens(&tokens) {
            Ok(val) => println!("{}\n", interpreter.display(val)),
            Err(e) if e.is_recoverable() => eprintln!("Error: {e}"),
            Err(e) => return Err(e),
        }
        io::stdout().flush()?;
    }

    source.save_history()?;
    println!("Goodbye!");
    Ok(())
}

fn print_help() {
    println!("cairn REPL Commands:");
    println!("  ,quit / ,q    Exit the REPL");
    println!("  ,help / ,h    Show this help");
    println!("  ,env          Show defined variables");
    println!();
    println!("Forms:     quote, define, lambda");
    println!("Functions: eval, car, cdr, cadr, cons, list, reverse, + - * /");
}

fn print_env(interpreter: &Interpreter) -> Result<(), CairnError> {
    let bindings = interpreter.user_bindings()?;
    if bindings.is_empty() {
        println!("(no user-defined bindings)");
    } else {
        for (name, value) in bindings {
            println!("  {name} = {value}");
        }
    }
    Ok(())
}
