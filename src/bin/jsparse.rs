//! CLI tool for parsing JavaScript into ESTree JSON
//!
//! Usage: jsparse [options] <file | ->
//!
//! Prints the syntax tree (or with `--tokens` the token list) to stdout.
//! Set `RUST_LOG=jsparse=debug` to see parser progress.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser as ClapParser;
use log::debug;

use jsparse::Options;

#[derive(ClapParser, Debug)]
#[command(version, about = "Parse JavaScript into an ESTree syntax tree", long_about = None)]
struct Cli {
    /// Source file, or `-` for stdin
    input: PathBuf,

    /// Parse with the module goal
    #[arg(long)]
    module: bool,

    /// Enable staged syntax (class fields, BigInt, top-level await, ...)
    #[arg(long)]
    next: bool,

    /// Keep raw source text on literals and identifiers
    #[arg(long)]
    raw: bool,

    /// Emit start/end offsets
    #[arg(long)]
    ranges: bool,

    /// Emit line/column locations
    #[arg(long)]
    loc: bool,

    /// Print the token list instead of the tree
    #[arg(long)]
    tokens: bool,

    /// Treat the source as strict code
    #[arg(long)]
    implied_strict: bool,

    /// Allow `return` at the top level
    #[arg(long)]
    global_return: bool,

    /// Enable decorators and `do` expressions
    #[arg(long)]
    experimental: bool,

    /// JSON file with parser options; flags are applied on top
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn load_options(cli: &Cli) -> Result<Options, String> {
    let mut options = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
            Options::from_json(&text)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?
        }
        None => Options::default(),
    };
    options.module |= cli.module;
    options.next |= cli.next;
    options.raw |= cli.raw;
    options.ranges |= cli.ranges;
    options.loc |= cli.loc;
    options.tokenize |= cli.tokens;
    options.implied_strict |= cli.implied_strict;
    options.global_return |= cli.global_return;
    options.experimental |= cli.experimental;
    Ok(options)
}

fn read_source(input: &PathBuf) -> Result<String, String> {
    if input.as_os_str() == "-" {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .map_err(|e| format!("Failed to read stdin: {}", e))?;
        return Ok(source);
    }
    fs::read_to_string(input).map_err(|e| format!("Failed to read {}: {}", input.display(), e))
}

fn run(cli: Cli) -> Result<(), String> {
    let options = load_options(&cli)?;
    let source = read_source(&cli.input)?;
    debug!("read {} bytes from {}", source.len(), cli.input.display());

    let program = jsparse::parse(&source, &options)
        .map_err(|e| format!("{}: {}", cli.input.display(), e))?;

    let json = if cli.tokens {
        let tokens = program.tokens.unwrap_or_default();
        to_json(&tokens, cli.pretty)
    } else {
        to_json(&program, cli.pretty)
    }
    .map_err(|e| format!("Failed to serialize output: {}", e))?;

    println!("{}", json);
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
