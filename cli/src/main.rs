use std::io::{BufRead, BufReader, IsTerminal, Write};
use std::process::ExitCode;

use clap::Parser;
use tessera_core::Error;
use tessera_core::api::{CompilationOptions, Engine, EngineOptions, ExecutionOptions};
use tessera_core::scope::MapScope;

/// Tessera - an embeddable expression language for numeric formulas
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(about = "Evaluate tessera expressions", long_about = None)]
struct Args {
    /// Bind a variable before evaluating, as NAME=EXPRESSION (repeatable)
    #[arg(long = "var", value_name = "NAME=EXPRESSION")]
    vars: Vec<String>,

    /// Print the inferred type instead of the value
    #[arg(long = "type")]
    show_type: bool,

    /// Print the evaluation trace
    #[arg(long)]
    trace: bool,

    /// Print the parsed AST (for debugging)
    #[arg(long)]
    debug_ast: bool,

    /// Leave constant subexpressions unmarked, so every node is recomputed
    #[arg(long)]
    no_fold: bool,

    /// Maximum nesting depth for parsing and evaluation
    #[arg(long, default_value_t = ExecutionOptions::default().max_depth)]
    max_depth: usize,

    /// Expression to evaluate (if not provided, reads lines from stdin)
    expression: Option<String>,
}

/// Print an error, pointing at the offending column for parse errors.
fn render_error(source: &str, err: &Error) {
    if let Error::Parse { position, .. } = err {
        let line_start = source[..(*position).min(source.len())]
            .rfind('\n')
            .map_or(0, |i| i + 1);
        let line_end = source[line_start..]
            .find('\n')
            .map_or(source.len(), |i| line_start + i);
        let column = source[line_start..(*position).min(source.len())].chars().count();
        eprintln!("  {}", &source[line_start..line_end]);
        eprintln!("  {}^", " ".repeat(column));
    }
    eprintln!("Error: {err}");
}

fn bind_variables(engine: &Engine, vars: &[String]) -> Result<MapScope, String> {
    let mut scope = MapScope::new();
    for var in vars {
        let Some((name, source)) = var.split_once('=') else {
            return Err(format!("expected NAME=EXPRESSION, got {var:?}"));
        };
        let name = name.trim();
        let value = engine
            .parse(source)
            .and_then(|ast| engine.evaluate(&ast, &scope))
            .map_err(|err| format!("cannot bind {name}: {err}"))?;
        tracing::debug!(name, %value, "Bound variable");
        scope.insert(name, value);
    }
    Ok(scope)
}

/// Run one expression, returning whether it succeeded.
fn interpret_input(engine: &Engine, scope: &MapScope, input: &str, args: &Args) -> bool {
    let ast = match engine.parse(input) {
        Ok(ast) => ast,
        Err(err) => {
            render_error(input, &err);
            return false;
        }
    };

    if args.debug_ast {
        println!("=== Parsed AST ===");
        print!("{}", ast.dump());
        println!();
    }

    if args.show_type {
        return match engine.infer(&ast, scope) {
            Ok(ty) => {
                println!("{ty}");
                true
            }
            Err(err) => {
                render_error(input, &err);
                false
            }
        };
    }

    if args.trace {
        print!("{}", engine.trace(&ast, scope));
    }

    match engine.evaluate(&ast, scope) {
        Ok(value) => {
            if !args.trace {
                println!("{value}");
            }
            true
        }
        Err(err) => {
            if !args.trace {
                render_error(input, &err);
            }
            false
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use RUST_LOG environment variable to control log level
    // Default to WARN if not set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let engine = Engine::new(EngineOptions {
        compilation: CompilationOptions {
            fold_constants: !args.no_fold,
        },
        execution: ExecutionOptions {
            max_depth: args.max_depth,
        },
    });

    let scope = match bind_variables(&engine, &args.vars) {
        Ok(scope) => scope,
        Err(message) => {
            eprintln!("Error: {message}");
            return ExitCode::FAILURE;
        }
    };

    // Check if we have a direct expression argument
    if let Some(expr) = &args.expression {
        return if interpret_input(&engine, &scope, expr, &args) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    // Otherwise read one expression per line
    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    if interactive {
        println!("Tessera - type expressions to evaluate (Ctrl+D to exit)");
    }

    let reader = BufReader::new(stdin.lock());
    let mut lines = reader.lines();
    loop {
        if interactive {
            print!("> ");
            let _ = std::io::stdout().flush();
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading line from stdin: {}", e);
                return ExitCode::FAILURE;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        interpret_input(&engine, &scope, &line, &args);
    }

    ExitCode::SUCCESS
}
