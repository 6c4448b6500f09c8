use clap::{Parser, Subcommand, ValueEnum};
use phpx_codegen::{BareLiteralFormatter, Compiler, LiteralFormatter, PragmaFormatter};
use phpx_parser::{TracingLogger, DEFAULT_MAX_DEPTH};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "phpx")]
#[command(about = "PHPX compiler: PHP with JSX-like markup to plain PHP")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Shape of generated elements
    #[arg(long, value_enum, default_value_t = FormatterKind::Literal, global = true)]
    formatter: FormatterKind,

    /// Element function used by the pragma formatter
    #[arg(long, default_value = "html", global = true)]
    pragma: String,

    /// Fragment function used by the pragma formatter
    #[arg(long, default_value = "fragment", global = true)]
    fragment: String,

    /// Deepest allowed nesting of markup and brackets
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH, global = true)]
    max_depth: usize,

    /// Trace every parse and generation step to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatterKind {
    /// ['$', 'tag', attributes, children]
    Literal,
    /// ['tag', attributes, children]
    Bare,
    /// html('tag', attributes, children)
    Pragma,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a .phpx file to a .php file next to it
    Build {
        /// Input .phpx file
        path: String,

        /// Print the compiled PHP instead of writing it
        #[arg(long)]
        stdout: bool,
    },

    /// Check a file for errors without writing output
    Check {
        /// Input file
        path: String,
    },

    /// Print the token stream of a file
    Tokens {
        /// Input file
        path: String,

        /// Print tokens as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the syntax tree of a file as JSON
    Ast {
        /// Input file
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let compiler = compiler(&cli);

    match &cli.command {
        Command::Build { path, stdout } => cmd_build(&compiler, path, *stdout),
        Command::Check { path } => cmd_check(&compiler, path),
        Command::Tokens { path, json } => cmd_tokens(path, *json),
        Command::Ast { path } => cmd_ast(&compiler, path),
    }
}

fn compiler(cli: &Cli) -> Compiler {
    let compiler = Compiler::new().with_max_depth(cli.max_depth);
    let compiler = match cli.formatter {
        FormatterKind::Literal => compiler.with_formatter(LiteralFormatter),
        FormatterKind::Bare => compiler.with_formatter(BareLiteralFormatter),
        FormatterKind::Pragma => {
            compiler.with_formatter(PragmaFormatter::new(&cli.pragma, &cli.fragment))
        }
    };

    if cli.verbose || env::var("RUST_LOG").is_ok() {
        init_tracing();
        return compiler.with_logger(Arc::new(TracingLogger));
    }
    compiler
}

/// `RUST_LOG` wins over the default of debug output for the pipeline.
fn init_tracing() {
    let filter = match env::var("RUST_LOG") {
        Ok(rust_log) => EnvFilter::new(rust_log),
        Err(_) => EnvFilter::new("warn,phpx=debug"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn read_source(path: &str) -> String {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

/// `page.phpx` compiles to `page.php`.
fn output_path(path: &str) -> Option<PathBuf> {
    path.strip_suffix(".phpx")
        .map(|stem| PathBuf::from(format!("{stem}.php")))
}

fn cmd_build(compiler: &Compiler, path: &str, stdout: bool) {
    let Some(php_path) = output_path(path) else {
        eprintln!("Error: expected a .phpx file, got {path}");
        std::process::exit(1);
    };
    let source = read_source(path);

    let php = match compiler.compile(&source) {
        Ok(php) => php,
        Err(e) => {
            eprintln!("Error: {path}: {e}");
            std::process::exit(1);
        }
    };

    if stdout {
        print!("{php}");
        return;
    }

    if let Err(e) = std::fs::write(&php_path, &php) {
        eprintln!("Error writing {}: {e}", php_path.display());
        std::process::exit(1);
    }

    eprintln!("Built: {}", php_path.display());
}

fn cmd_check(compiler: &Compiler, path: &str) {
    let source = read_source(path);

    if let Err(e) = compiler.compile(&source) {
        eprintln!("Error: {path}: {e}");
        std::process::exit(1);
    }

    eprintln!("OK: {path}");
}

fn cmd_tokens(path: &str, json: bool) {
    let source = read_source(path);

    let tokens = match phpx_lexer::tokenize(&source) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("Error: {path}: {e}");
            std::process::exit(1);
        }
    };

    if json {
        print_json(&tokens);
    } else {
        for token in &tokens {
            println!("{token}");
        }
    }
}

fn cmd_ast(compiler: &Compiler, path: &str) {
    let source = read_source(path);

    match compiler.parse(&source) {
        Ok(nodes) => print_json(&nodes),
        Err(e) => {
            eprintln!("Error: {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing output: {e}");
            std::process::exit(1);
        }
    }
}
