use crate::install::{GitCli, NpmInstaller};
use crate::output::print_summary;
use crate::prompt::TermPrompter;
use anyhow::{bail, Context};
use clap::Args;
use mozu_actions_core::{
    catalog::CatalogOptions,
    ident::DottedId,
    merge::PreconfiguredFunction,
    pipeline::{self, Generator, RunOptions},
    prompt::is_function_name,
};
use std::path::Path;
use std::time::Duration;

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Action ids to scaffold without being asked
    #[arg(value_name = "ACTION")]
    pub actions: Vec<String>,

    /// Use the internal action definitions and environment choices
    #[arg(long)]
    pub internal: bool,

    /// Reuse the answers saved in .mozu-actions.json
    #[arg(long = "skip-prompts", alias = "skipPrompts")]
    pub skip_prompts: bool,

    /// Do not run npm install
    #[arg(long = "skip-install", alias = "skipInstall")]
    pub skip_install: bool,

    /// Same as --skip-prompts --skip-install
    #[arg(long)]
    pub quick: bool,

    /// Replace existing implementation and test files
    #[arg(long = "overwrite-all", alias = "overwriteAll")]
    pub overwrite_all: bool,

    /// Test framework for generated unit tests (mocha, manual)
    #[arg(long = "test-framework", alias = "testFramework", value_name = "NAME")]
    pub test_framework: Option<String>,

    /// Seconds to wait for the internal action definitions endpoint
    #[arg(long, value_name = "SECS")]
    pub catalog_timeout: Option<u64>,

    /// Functions a composing generator requires, as a JSON array of
    /// {"actionId", "functionIds"} objects
    #[arg(long, hide = true, value_name = "JSON")]
    pub preconfigured: Option<String>,

    /// Function whose files must never be overwritten
    #[arg(long = "do-not-write", alias = "doNotWrite", hide = true, value_name = "FUNCTION")]
    pub do_not_write: Vec<String>,
}

impl GenerateArgs {
    pub fn into_options(self, root: &Path, generator: Generator) -> anyhow::Result<RunOptions> {
        let preconfigured: Vec<PreconfiguredFunction> = match self.preconfigured.as_deref() {
            Some(raw) => serde_json::from_str(raw).context("invalid --preconfigured JSON")?,
            None => Vec::new(),
        };
        // Function ids become file names under assets/.
        let ids = preconfigured
            .iter()
            .flat_map(|p| &p.function_ids)
            .chain(&self.do_not_write);
        for id in ids {
            if !is_function_name(id) {
                bail!("invalid function id '{id}': use letters, digits, '_', '$', '.' or '-'");
            }
        }
        Ok(RunOptions {
            root: root.to_path_buf(),
            generator,
            action_names: self.actions.into_iter().map(DottedId::new).collect(),
            internal: self.internal,
            skip_prompts: self.skip_prompts || self.quick,
            skip_install: self.skip_install || self.quick,
            overwrite_all: self.overwrite_all,
            test_framework: self.test_framework,
            preconfigured,
            do_not_write: self.do_not_write,
            catalog: CatalogOptions {
                internal: self.internal,
                remote_url: None,
                timeout: self.catalog_timeout.map(Duration::from_secs),
            },
        })
    }
}

pub fn run(root: &Path, generator: Generator, args: GenerateArgs, json: bool) -> anyhow::Result<()> {
    let options = args.into_options(root, generator)?;
    if !json {
        match generator {
            Generator::App => println!("Creating Mozu extension project in: {}", root.display()),
            Generator::Action => println!("Adding actions to: {}", root.display()),
        }
    }

    let mut prompter = TermPrompter::default();
    let summary = pipeline::run(options, &mut prompter, &NpmInstaller, &GitCli)?;
    print_summary(&summary, json)
}
