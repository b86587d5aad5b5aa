//! npm and git, run as child processes in the project directory.

use mozu_actions_core::pipeline::{GitRepo, Installer};
use mozu_actions_core::{Result, ScaffoldError};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

pub struct NpmInstaller;

pub struct GitCli;

fn locate(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| ScaffoldError::ExternalCommand {
        program: program.to_string(),
        message: "not found on PATH".to_string(),
    })
}

fn run_in(root: &Path, program: &str, args: &[&str]) -> Result<()> {
    let binary = locate(program)?;
    info!(program, ?args, "running");
    let status = Command::new(binary).args(args).current_dir(root).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(ScaffoldError::ExternalCommand {
            program: program.to_string(),
            message: format!("exited with {status}"),
        })
    }
}

impl Installer for NpmInstaller {
    fn install_dev_dependencies(&self, root: &Path, packages: &[&str]) -> Result<()> {
        let mut args = vec!["install", "--save-dev"];
        args.extend_from_slice(packages);
        run_in(root, "npm", &args)
    }
}

impl GitRepo for GitCli {
    fn init(&self, root: &Path) -> Result<()> {
        run_in(root, "git", &["init", "--quiet"])
    }
}
