use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "manta-review")]
#[command(
    version,
    about = "Send documents to an e-ink tablet for review and pull the annotations back"
)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding .manta/ (defaults to the current directory)
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// adb serial of the tablet. Overrides MANTA_DEVICE_SERIAL and manta.toml
    #[arg(long, global = true)]
    pub serial: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a markdown file and push it to the tablet for review
    Review {
        /// Markdown document to review
        path: String,
    },
    /// Retrieve annotated PDFs and write review summaries
    Done {
        /// Only retrieve pending reviews whose path contains this text
        pattern: Option<String>,
    },
    /// List pending reviews
    List {
        /// Include completed reviews
        #[arg(long)]
        all: bool,
    },
    /// Print the agent integration guide
    Usage,
    /// Print tool schemas as JSON (OpenAI function format)
    Tools,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Run the MCP server on stdio
    Serve,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default manta.toml file
    Init,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Review { path } => cmd::cmd_review(&cli, project_dir, path).await?,
        Commands::Done { pattern } => {
            cmd::cmd_done(&cli, project_dir, pattern.as_deref()).await?
        }
        Commands::List { all } => cmd::cmd_list(&project_dir, *all)?,
        Commands::Usage => cmd::cmd_usage(),
        Commands::Tools => cmd::cmd_tools()?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
        Commands::Serve => cmd::cmd_serve(&cli, project_dir).await?,
    }

    Ok(())
}
