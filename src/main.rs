use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod build;
mod commands;
mod config;
mod theme;
mod util;

#[derive(Parser)]
#[command(version, about = "Render a markdown document into a single themed page")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    command: PagewrightCommand,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser)]
struct BuildArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct ServeArgs {
    /// The address to bind to
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// The port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Open the page in the default browser
    #[arg(short, long, default_value = "false")]
    open: bool,

    /// The path to the configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config_file: Option<PathBuf>,

    /// Whether to watch for changes and rebuild automatically
    #[arg(short, long, default_value = "true")]
    watch: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RenderFormat {
    /// HTML fragment of the document
    Html,
    /// The UI tree as JSON
    Json,
}

#[derive(Parser)]
struct RenderArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = RenderFormat::Html)]
    format: RenderFormat,
}

#[derive(Parser)]
struct CleanArgs {
    /// Only print what would be deleted
    #[arg(long, default_value = "false")]
    dry_run: bool,

    /// The path to the configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum PagewrightCommand {
    /// Initialize a new pagewright project
    Init(InitArgs),

    /// Build the page into the output directory
    Build(BuildArgs),

    /// Serve the page on a local port
    Serve(ServeArgs),

    /// Render the document and print it to stdout
    Render(RenderArgs),

    /// Delete the output directory
    Clean(CleanArgs),
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        PagewrightCommand::Init(args) => {
            commands::init::run(&args).await?;
        }
        PagewrightCommand::Build(args) => {
            commands::build::run(&args).await?;
        }
        PagewrightCommand::Serve(args) => {
            commands::serve::run(&args).await?;
        }
        PagewrightCommand::Render(args) => {
            commands::render::run(&args).await?;
        }
        PagewrightCommand::Clean(args) => {
            commands::clean::run(&args).await?;
        }
    }

    Ok(())
}
