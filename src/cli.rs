use crate::commands::{self, CommandReport};
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "jdi-scrape",
    version,
    about = "Scrape per-county jail-roster CSVs from the Jail Data Initiative portal"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download and unpack rosters for every configured (county, date) target
    Scrape(commands::scrape::ScrapeOptions),
    /// Report the state of the local output tree without touching the browser
    Status,
}

fn print_report(report: &CommandReport) {
    for detail in &report.details {
        println!("{detail}");
    }
    for issue in &report.issues {
        eprintln!("issue: {issue}");
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Commands::Scrape(opts) => commands::scrape::run(&opts)?,
        Commands::Status => commands::status::run()?,
    };

    print_report(&report);
    if !report.ok {
        std::process::exit(1);
    }
    Ok(())
}
