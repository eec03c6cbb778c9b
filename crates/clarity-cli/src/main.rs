mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "clarity",
    about = "Interactive project clarification wizard — interview, scope, and export a build plan",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: auto-detect from .clarity/ or .git/)
    #[arg(long, global = true, env = "CLARITY_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the clarification wizard for a project (resumes saved answers)
    Run {
        /// Project name (lowercase, hyphens allowed)
        name: String,

        /// Let the completion port choose the next stage (falls back to the
        /// static order whenever it fails)
        #[arg(long)]
        assisted: bool,
    },

    /// List known projects
    List,

    /// Show a project's collected answers
    Show { name: String },

    /// Re-export the scaffolding artifacts for a project
    Export { name: String },

    /// Show the stage catalog in walk order
    Stages,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Run { name, assisted } => cmd::run::run(&root, &name, assisted),
        Commands::List => cmd::project::list(&root, cli.json),
        Commands::Show { name } => cmd::project::show(&root, &name, cli.json),
        Commands::Export { name } => cmd::project::export(&root, &name),
        Commands::Stages => cmd::stages::run(&root, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
