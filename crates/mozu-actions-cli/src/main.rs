mod cmd;
mod install;
mod output;
mod prompt;
mod root;

use clap::{Parser, Subcommand};
use cmd::generate::GenerateArgs;
use mozu_actions_core::pipeline::Generator;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mozu-actions",
    about = "Scaffold Mozu extension projects and the custom functions behind their actions",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project directory (default: nearest directory with .mozu-actions.json, else cwd)
    #[arg(long, global = true, env = "MOZU_ACTIONS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log at debug level
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new extension project, then add actions to it
    App(GenerateArgs),

    /// Add actions and custom functions to an existing project
    Action(GenerateArgs),

    /// List the domains and actions that can be scaffolded
    Catalog {
        /// Use the internal action definitions endpoint, including beta actions
        #[arg(long)]
        internal: bool,

        /// Seconds to wait for the internal endpoint
        #[arg(long, value_name = "SECS")]
        catalog_timeout: Option<u64>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::App(args) => {
            let root = root::resolve_root(cli.root.as_deref(), false);
            cmd::generate::run(&root, Generator::App, args, cli.json)
        }
        Commands::Action(args) => {
            let root = root::resolve_root(cli.root.as_deref(), true);
            cmd::generate::run(&root, Generator::Action, args, cli.json)
        }
        Commands::Catalog {
            internal,
            catalog_timeout,
        } => cmd::catalog::run(internal, catalog_timeout, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
