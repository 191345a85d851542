//! Permisos command-line tool
//!
//! - `permisos generate`: resolve @Permisos types and write `Permisos_*` sources
//! - `permisos transform`: re-parent compiled classes onto their generated types
//! - `permisos inspect`: show what the transformer sees in a class file

mod commands;
mod output;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use commands::transform::TransformArgs;
use permisos_compiler::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "permisos")]
#[command(about = "Runtime permission boilerplate for Android components", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./permisos.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Permisos_* sources for every @Permisos type
    Generate {
        /// Type declarations: .toml, .json, .class, .jar or directories of them
        #[arg(long = "types", required = true, num_args = 1..)]
        types: Vec<PathBuf>,
        /// Output source root
        #[arg(long)]
        out: PathBuf,
    },

    /// Splice generated types into compiled classes
    Transform {
        /// Class directory or jar to rewrite
        #[arg(long)]
        input: PathBuf,
        /// Output directory or jar
        #[arg(long)]
        output: PathBuf,
        /// Additional class directories or jars to resolve generated types against
        #[arg(long, num_args = 1..)]
        classpath: Vec<PathBuf>,
        /// Also copy classes that were not rewritten
        #[arg(long)]
        copy_non_transformed: bool,
    },

    /// Describe a class file
    Inspect {
        /// Path to a .class file
        class: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load {}", path.display())),
        None => {
            let cwd = std::env::current_dir()?;
            Config::discover(&cwd).context("failed to load permisos.toml")
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Generate { types, out } => commands::generate::execute(&config, types, out),
        Commands::Transform {
            input,
            output,
            classpath,
            copy_non_transformed,
        } => commands::transform::execute(
            &config,
            TransformArgs {
                input,
                output,
                classpath,
                copy_non_transformed,
            },
        ),
        Commands::Inspect { class } => commands::inspect::execute(&config, &class),
    }
}
