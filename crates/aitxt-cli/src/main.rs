//! aitxt - ai.txt policy tool
//!
//! Parse, validate, convert and query ai.txt / ai.json documents, locally or
//! from a live site.

use std::path::PathBuf;

use aitxt::PolicyField;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{InputFormat, OutputFormat, Outcome};

/// aitxt - ai.txt policy tool
#[derive(Parser, Debug)]
#[command(name = "aitxt")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a policy file and print the parse result as JSON
    Parse {
        file: PathBuf,

        #[arg(long, value_enum, default_value = "auto")]
        format: InputFormat,
    },

    /// Check a policy file for semantic problems
    Validate {
        file: PathBuf,

        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,
    },

    /// Convert a policy file to text or JSON
    Generate {
        file: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        to: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stamp Generated-At with the current time
        #[arg(long)]
        timestamp: bool,
    },

    /// Print the effective policy for an agent
    Resolve {
        file: PathBuf,

        #[arg(long)]
        agent: String,
    },

    /// Decide whether an agent may use the site (exit status 1 when denied)
    Check {
        file: PathBuf,

        #[arg(long)]
        agent: String,

        /// training, scraping, indexing or caching
        #[arg(long)]
        field: PolicyField,

        /// Request path, for conditional training
        #[arg(long)]
        path: Option<String>,
    },

    /// Discover and fetch a live site's policy
    Fetch {
        site_url: String,

        /// Also resolve the policy for this agent
        #[arg(long)]
        agent: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine readable
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let outcome = match &cli.command {
        Commands::Parse { file, format } => commands::parse(file, *format)?,
        Commands::Validate { file, strict } => commands::validate_file(file, *strict)?,
        Commands::Generate {
            file,
            to,
            output,
            timestamp,
        } => commands::generate(file, *to, output.as_ref(), *timestamp)?,
        Commands::Resolve { file, agent } => commands::resolve(file, agent)?,
        Commands::Check {
            file,
            agent,
            field,
            path,
        } => commands::check(file, agent, *field, path.as_deref())?,
        Commands::Fetch { site_url, agent } => commands::fetch(site_url, agent.as_deref())?,
    };

    finish(outcome)
}

fn finish(outcome: Outcome) -> Result<()> {
    if !outcome.stdout.is_empty() {
        println!("{}", outcome.stdout);
    }
    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}
