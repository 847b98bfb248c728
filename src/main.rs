//! AgentLab toolchain - CLI

use agentlab::frontend::{lexer, parser};
use agentlab::util::config::{self, UserConfig};
use agentlab::util::{check, logger};
use agentlab::{decompile_with_options, Compiler, ItemKind, PrintOptions, ResolverSet, NAME, VERSION};
use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use owo_colors::{OwoColorize, Stream};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Compiler and decompiler for AgentLab behaviour scripts
#[derive(Parser, Debug)]
#[command(name = "agentlab")]
#[command(author = "AgentLab Team")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ClapArgs, Debug)]
struct SymbolArgs {
    /// Symbols file mapping names to graph, state graph and object IDs
    #[arg(short, long, value_name = "FILE")]
    symbols: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a source file to binary
    Compile {
        /// Source file to compile
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file (defaults to FILE with a .bin extension)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        #[command(flatten)]
        symbols: SymbolArgs,
    },

    /// Decompile a binary file to source
    Decompile {
        /// Binary file to decompile
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Item kind: library, behaviour or sequence
        #[arg(short, long)]
        kind: ItemKind,

        /// Name of the decompiled item (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        #[command(flatten)]
        symbols: SymbolArgs,
    },

    /// Check source files and directories for errors
    Check {
        /// Files or directories to check
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        symbols: SymbolArgs,
    },

    /// Format source file
    Fmt {
        /// Source file to format
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only report whether the file is already formatted
        #[arg(short, long)]
        check: bool,
    },

    /// Dump tokens or the syntax tree as JSON
    Dump {
        /// Source file to dump
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Dump the token stream
        #[arg(long, conflicts_with = "ast", required_unless_present = "ast")]
        tokens: bool,

        /// Dump the syntax tree
        #[arg(long)]
        ast: bool,
    },

    /// Print version information
    Version,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{} {:#}", "error:".if_supports_color(Stream::Stderr, |t| t.style(owo_colors::Style::new().red().bold())), err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config = config::load_config(&cwd).context("Failed to load configuration")?;

    let level = if args.verbose {
        logger::LogLevel::Debug
    } else {
        config.log.level.parse().map_err(anyhow::Error::msg)?
    };
    logger::init_with_level(level);

    if args.verbose {
        debug!("{} version: {}", NAME, VERSION);
        debug!("Host: {}", std::env::consts::OS);
    }

    match args.command {
        Commands::Compile { file, output, symbols } => {
            let symbols = load_symbols(&symbols, &config)?;
            let source = read_source(&file)?;
            let script = Compiler::with_resolvers(symbols.compile_resolvers())
                .compile(&source)
                .with_context(|| format!("Failed to compile: {}", file.display()))?;
            let output = output.unwrap_or_else(|| file.with_extension("bin"));
            fs::write(&output, &script.bytes).with_context(|| format!("Failed to write {}", output.display()))?;
            info!("{} `{}` -> {} ({} bytes)", script.kind, script.name, output.display(), script.bytes.len());
        }
        Commands::Decompile {
            file,
            kind,
            name,
            output,
            symbols,
        } => {
            let symbols = load_symbols(&symbols, &config)?;
            let bytes = fs::read(&file).with_context(|| format!("Failed to read file {}", file.display()))?;
            let name = match name {
                Some(name) => name,
                None => file
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
                    .with_context(|| format!("Cannot derive an item name from {}", file.display()))?,
            };
            let options = PrintOptions::from(&config.fmt);
            let text = decompile_with_options(kind, &bytes, &name, &symbols.decompile_resolvers(), &options)
                .with_context(|| format!("Failed to decompile: {}", file.display()))?;
            match output {
                Some(output) => {
                    fs::write(&output, text).with_context(|| format!("Failed to write {}", output.display()))?
                }
                None => print!("{}", text),
            }
        }
        Commands::Check { paths, symbols } => {
            let symbols = load_symbols(&symbols, &config)?;
            let files = check::collect_sources(&paths)?;
            if files.is_empty() {
                eprintln!("No .{} source files found in the specified paths", check::SOURCE_EXTENSION);
                return Ok(());
            }

            let outcomes = check::check_files(&files, &symbols);
            let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
            for outcome in &outcomes {
                if let Err(err) = &outcome.result {
                    eprintln!("{} {:#}", "error:".if_supports_color(Stream::Stderr, |t| t.style(owo_colors::Style::new().red().bold())), err);
                }
            }
            if failed > 0 {
                bail!("{} of {} file{} failed", failed, files.len(), plural(files.len()));
            }
            println!(
                "{} All checks passed ({} file{})",
                "✓".if_supports_color(Stream::Stdout, |t| t.green()),
                files.len(),
                plural(files.len())
            );
        }
        Commands::Fmt { file, check } => {
            let source = read_source(&file)?;
            let options = PrintOptions::from(&config.fmt);
            let formatted = agentlab::format_source(&source, &options)
                .with_context(|| format!("Failed to format: {}", file.display()))?;
            if check {
                if formatted != source {
                    bail!("{} is not formatted", file.display());
                }
                println!("{} {} is formatted", "✓".if_supports_color(Stream::Stdout, |t| t.green()), file.display());
            } else if formatted != source {
                fs::write(&file, formatted).with_context(|| format!("Failed to write {}", file.display()))?;
                info!("formatted {}", file.display());
            }
        }
        Commands::Dump { file, tokens, .. } => {
            let source = read_source(&file)?;
            let tokens_list = lexer::tokenize(&source).with_context(|| format!("Failed to lex: {}", file.display()))?;
            let json = if tokens {
                serde_json::to_string_pretty(&tokens_list)?
            } else {
                let root =
                    parser::parse(&tokens_list).with_context(|| format!("Failed to parse: {}", file.display()))?;
                serde_json::to_string_pretty(&root)?
            };
            println!("{}", json);
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
    }

    Ok(())
}

fn read_source(file: &Path) -> Result<String> {
    fs::read_to_string(file).with_context(|| format!("Failed to read file {}", file.display()))
}

/// `--symbols` wins over the configured symbols file; neither installs no resolvers
fn load_symbols(
    args: &SymbolArgs,
    config: &UserConfig,
) -> Result<ResolverSet> {
    match args.symbols.as_ref().or(config.symbols.path.as_ref()) {
        Some(path) => {
            config::load_symbols(path).with_context(|| format!("Failed to load symbols from {}", path.display()))
        }
        None => Ok(ResolverSet::default()),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
