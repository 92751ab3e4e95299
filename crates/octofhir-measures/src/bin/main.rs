//! Measures command-line interface

use clap::{Parser, Subcommand, ValueEnum};
use octofhir_measures::cli::{check, export, library, list, output};
use octofhir_measures::registry::{Scope, default_registry};
use std::path::PathBuf;

/// Measure registry tool
#[derive(Parser)]
#[command(name = "measures")]
#[command(author, version, about = "FHIR measure registry tools", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    /// Directories with <TOKEN>.cql stratifier overrides
    #[arg(short = 'L', long = "cql-path", global = true)]
    cql_paths: Vec<PathBuf>,

    /// Library assembly config (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered measures
    List {
        /// Include drafts
        #[arg(short, long)]
        drafts: bool,
    },

    /// Export measures as JSON
    Export {
        /// Include drafts
        #[arg(short, long)]
        drafts: bool,

        /// Replace placeholder tokens with their CQL
        #[arg(short, long)]
        resolve: bool,

        /// Pretty-print output
        #[arg(short, long)]
        pretty: bool,

        /// Export only these measures
        #[arg(short, long = "key")]
        keys: Vec<String>,
    },

    /// Print the assembled CQL library
    Library,

    /// Check keys, placeholders and CQL references
    Check {
        /// Strict mode (warnings as errors)
        #[arg(short, long)]
        strict: bool,

        /// Where identifiers may be defined
        #[arg(long, value_enum, default_value_t = ScopeArg::Library)]
        scope: ScopeArg,

        /// Also check drafts
        #[arg(short, long)]
        drafts: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    /// The measure's own CQL body
    Measure,
    /// All exported bodies, as the consumer concatenates them
    Library,
}

impl From<ScopeArg> for Scope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Measure => Scope::Measure,
            ScopeArg::Library => Scope::Library,
        }
    }
}

fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(&cli.color);

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let registry = default_registry();

    let result = match cli.command {
        Commands::List { drafts } => list::list(list::ListConfig {
            drafts,
            output_file: cli.output,
        }),

        Commands::Export {
            drafts,
            resolve,
            pretty,
            keys,
        } => {
            let config = export::ExportConfig {
                drafts,
                resolve,
                pretty,
                keys,
                cql_paths: cli.cql_paths,
                output_file: cli.output,
            };
            export::export(registry, config)
        }

        Commands::Library => {
            let config = library::LibraryConfig {
                cql_paths: cli.cql_paths,
                config_file: cli.config,
                output_file: cli.output,
            };
            library::library(registry, config)
        }

        Commands::Check {
            strict,
            scope,
            drafts,
        } => {
            let config = check::CheckConfig {
                strict,
                scope: scope.into(),
                drafts,
                cql_paths: cli.cql_paths,
                config_file: cli.config,
            };
            check::check(registry, config)
        }
    };

    if let Err(e) = result {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}
