pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "orbit",
    about = "Orbit Agritech document CLI",
    long_about = "Build quotations and proforma receipts from form files, and inspect configuration and readiness.",
    after_help = "Examples:\n  orbit catalog\n  orbit quote --input quote.toml --preview\n  orbit receipt --input receipt.json --output-dir out\n  orbit doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List catalog items with unit prices and minimum quantities")]
    Catalog {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Build a quotation from a form file and write the PDF (or HTML fallback)")]
    Quote {
        #[arg(long, help = "Quotation form in TOML or JSON")]
        input: PathBuf,
        #[arg(long, help = "Destination file; defaults to the configured output directory")]
        output: Option<PathBuf>,
        #[arg(long, help = "Print the bill summary as JSON instead of writing a document")]
        preview: bool,
    },
    #[command(about = "Fill the proforma receipt template from a form file")]
    Receipt {
        #[arg(long, help = "Receipt form in TOML or JSON")]
        input: PathBuf,
        #[arg(long, help = "Destination directory; defaults to the configured output directory")]
        output_dir: Option<PathBuf>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, document assets, and PDF converter availability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Catalog { json } => {
            commands::CommandResult { exit_code: 0, output: commands::catalog::run(json) }
        }
        Command::Quote { input, output, preview } => {
            commands::quote::run(&input, output.as_deref(), preview)
        }
        Command::Receipt { input, output_dir } => {
            commands::receipt::run(&input, output_dir.as_deref())
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
