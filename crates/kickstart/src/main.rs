//! kickstart CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kickstart_config::InterpreterOptions;

mod commands;

#[derive(Parser)]
#[command(name = "kickstart")]
#[command(version)]
#[command(about = "Interpret tagged YAML configuration", long_about = None)]
struct Cli {
    #[command(flatten)]
    roots: RootArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Root directory overrides. Unset roots come from `KICKSTART_*_PATH` or discovery.
#[derive(Args, Debug, Default)]
struct RootArgs {
    /// Script root (base for `!script_path`)
    #[arg(long, global = true)]
    script_path: Option<PathBuf>,

    /// Directory configuration files are read from
    #[arg(long, global = true)]
    config_path: Option<PathBuf>,

    /// Cache root (base for `!cache_path`)
    #[arg(long, global = true)]
    cache_path: Option<PathBuf>,

    /// Local data root (base for `!local_path`)
    #[arg(long, global = true)]
    local_path: Option<PathBuf>,
}

impl From<RootArgs> for InterpreterOptions {
    fn from(roots: RootArgs) -> Self {
        InterpreterOptions {
            script_path: roots.script_path,
            config_path: roots.config_path,
            cache_path: roots.cache_path,
            local_path: roots.local_path,
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Interpret a configuration file and print the result as JSON
    Parse {
        /// File to parse, relative to the config root unless absolute
        input: PathBuf,

        /// Byte offset to start reading at
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Print every document instead of only the first
        #[arg(long)]
        all: bool,

        /// Resolve `!read` references before printing
        #[arg(long)]
        resolve: bool,

        /// Refuse process side effects (directives, loaders, handlers)
        #[arg(long)]
        dry_run: bool,
    },

    /// Find the nearest ancestor of a directory holding a sentinel entry
    FindPath {
        /// Directory to start from
        start: PathBuf,

        /// Entry to look for, e.g. `.cache` or `.config/Kickstart`
        sentinel: String,
    },

    /// Convert a period such as "1 day 2 hours" to seconds
    Period {
        /// Period text
        text: String,
    },

    /// List the built-in tags
    Tags,
}

fn main() -> Result<()> {
    // stdout carries command output, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kickstart=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let options = InterpreterOptions::from(cli.roots);

    match cli.command {
        Commands::Parse {
            input,
            offset,
            all,
            resolve,
            dry_run,
        } => commands::parse::execute(commands::parse::ParseArgs {
            input,
            offset,
            all,
            resolve,
            dry_run,
            options,
        }),
        Commands::FindPath { start, sentinel } => commands::find_path::execute(&start, &sentinel),
        Commands::Period { text } => commands::period::execute(&text),
        Commands::Tags => commands::tags::execute(),
    }
}
