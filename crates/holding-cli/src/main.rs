mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{project::ProjectSubcommand, user::UserSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "holding",
    about = "Case management for family holding formation — workspace, users, projects, API server",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: auto-detect from .holding/)
    #[arg(long, global = true, env = "HOLDING_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a workspace in the current directory
    Init {
        /// Workspace name (default: directory name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Plant demo users and a demo project
    Seed,

    /// Start the API server
    Serve {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, default_value = "8420")]
        port: u16,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        subcommand: UserSubcommand,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { name } => cmd::init::run(&root, name.as_deref()),
        Commands::Seed => cmd::seed::run(&root),
        Commands::Serve { port } => cmd::serve::run(&root, port),
        Commands::User { subcommand } => cmd::user::run(&root, subcommand, cli.json),
        Commands::Project { subcommand } => cmd::project::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
