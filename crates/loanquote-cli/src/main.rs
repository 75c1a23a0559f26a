mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::quote::QuoteArgs;

/// Loan quoting against a lender market listing
#[derive(Parser)]
#[command(
    name = "loanquote",
    version,
    about = "Rate quotes from a market of lenders",
    long_about = "Computes a blended borrowing rate by allocating a requested loan \
                  amount across a market of lenders with capped funds, then derives \
                  the monthly and total repayment over the term."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "text", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a loan amount against a market listing
    Quote(QuoteArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Quote(args) => commands::quote::run_quote(args),
        Commands::Version => {
            println!("loanquote {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
