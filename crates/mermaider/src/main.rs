//! mermaider CLI - renders fenced Mermaid diagrams from a Markdown tree into a
//! mirrored tree of SVG files.
//!
//! ```text
//! mermaider [OPTIONS] [INPUT_DIR] [OUTPUT_DIR]
//! ```
//!
//! Exits with status 1 when a diagram fails or the run cannot start.

mod command;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use command::BuildArgs;
use output::Output;

/// Render Mermaid diagrams embedded in Markdown files to SVG.
#[derive(Parser)]
#[command(name = "mermaider", version, about)]
struct Cli {
    #[command(flatten)]
    args: BuildArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // Logs go to stderr so stdout carries only the report; RUST_LOG selects
    // the level (errors only by default)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match cli.args.execute(&output) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            output.error(&err.to_string());
            std::process::exit(1);
        }
    }
}
