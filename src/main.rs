use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dddwiki::cli::Output;
use dddwiki::cli::commands::{self, generate::GenerateOptions};
use dddwiki::config::ConfigLoader;

#[derive(Parser)]
#[command(name = "dddwiki")]
#[command(
    version,
    about = "Layered documentation generator for domain-driven repositories"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Explicit config file, merged above global and project config
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover bounded contexts and aggregates
    Scan {
        #[arg(long, short, help = "Repository root")]
        repo: Option<PathBuf>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Build the documentation tree and generate layer documents
    Generate {
        #[arg(long, short, help = "Repository root")]
        repo: Option<PathBuf>,
        #[arg(long, short, help = "Output root (relative to the repository)")]
        output: Option<PathBuf>,
        #[arg(long, help = "Directory with <Layer>.md reference templates")]
        templates: Option<PathBuf>,
        #[arg(long, short = 'j', help = "Concurrent aggregates")]
        concurrency: Option<usize>,
        #[arg(long, help = "Deadline per layer call in seconds")]
        layer_timeout: Option<u64>,
        #[arg(long, help = "Send only the first N aggregates to the backend")]
        max_aggregates: Option<usize>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
        #[arg(long, help = "Only create directories, manifests and empty files")]
        skeleton_only: bool,
        #[arg(long, help = "Write fallback content without calling the backend")]
        offline: bool,
        #[arg(long = "dry-run", help = "Show the plan only, don't run")]
        dry_run: bool,
        #[arg(long, help = "Write the run report as JSON")]
        report: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text (TOML), json, yaml"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Write a default configuration file
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mdddwiki encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let out = Output::quiet(cli.quiet);

    match cli.command {
        Commands::Scan { repo, format } => {
            let mut config = ConfigLoader::load(cli.config.as_deref())?;
            if let Some(repo) = repo {
                config.paths.repo = repo;
            }
            commands::scan::run(config, &format, &out)?;
        }
        Commands::Generate {
            repo,
            output,
            templates,
            concurrency,
            layer_timeout,
            max_aggregates,
            model,
            skeleton_only,
            offline,
            dry_run,
            report,
        } => {
            let config = ConfigLoader::load(cli.config.as_deref())?;
            commands::generate::run(
                config,
                GenerateOptions {
                    repo,
                    output,
                    templates,
                    concurrency,
                    layer_timeout_secs: layer_timeout,
                    max_aggregates,
                    model,
                    skeleton_only,
                    offline,
                    dry_run,
                    report,
                },
                &out,
            )?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                let config = ConfigLoader::load(cli.config.as_deref())?;
                commands::config::show(&config, &format)?;
            }
            ConfigAction::Path => {
                commands::config::path(&out)?;
            }
            ConfigAction::Init { global, force } => {
                commands::config::init(global, force, &out)?;
            }
        },
    }

    Ok(())
}
