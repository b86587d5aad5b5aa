//! A generator run as an explicit sequence of phases.
//!
//! Each phase takes the [`RunState`] by value and hands it back, so the order
//! `initializing -> prompting -> configuring -> writing -> install -> end` is
//! visible at the call site. The app generator adds [`project_prompting`]
//! before the action phases.

use crate::catalog::{Catalog, CatalogOptions};
use crate::config::PersistedConfig;
use crate::detect::{detect_implemented, Implemented};
use crate::error::Result;
use crate::framework::{TestFramework, BASE_DEV_DEPENDENCIES};
use crate::ident::DottedId;
use crate::merge::{merge, MergedActions, PreconfiguredFunction};
use crate::paths;
use crate::plan::{build_plan, Plan};
use crate::project::{
    enable_on_install_function, project_answers, project_questions, ProjectAnswers, ProjectContext,
    ENABLE_ON_INSTALL_ACTION,
};
use crate::prompt::{ask_all, Answers, DefaultsPrompter, Prompter};
use crate::resolve::{flatten_actions, multiple_actions, ResolvedAction, Selection};
use crate::scaffold::{write_actions, write_project_files, ActionWriteOptions, WriteReport};
use indexmap::IndexSet;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const FALLBACK_PROJECT_NAME: &str = "mozu-actions-project";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    /// Project files plus the action step.
    App,
    /// Actions only, against an existing project.
    Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    ProjectPrompting,
    Prompting,
    Configuring,
    Writing,
    Install,
    End,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub root: PathBuf,
    pub generator: Generator,
    pub action_names: Vec<DottedId>,
    pub internal: bool,
    pub skip_prompts: bool,
    pub skip_install: bool,
    pub overwrite_all: bool,
    pub test_framework: Option<String>,
    pub preconfigured: Vec<PreconfiguredFunction>,
    pub do_not_write: Vec<String>,
    pub catalog: CatalogOptions,
}

impl RunOptions {
    pub fn new(root: impl Into<PathBuf>, generator: Generator) -> Self {
        Self {
            root: root.into(),
            generator,
            action_names: Vec::new(),
            internal: false,
            skip_prompts: false,
            skip_install: false,
            overwrite_all: false,
            test_framework: None,
            preconfigured: Vec::new(),
            do_not_write: Vec::new(),
            catalog: CatalogOptions::default(),
        }
    }
}

/// Runs `npm install --save-dev` or a stand-in.
pub trait Installer {
    fn install_dev_dependencies(&self, root: &Path, packages: &[&str]) -> Result<()>;
}

/// Runs `git init` or a stand-in.
pub trait GitRepo {
    fn init(&self, root: &Path) -> Result<()>;
}

pub struct RunState {
    pub options: RunOptions,
    pub phase: Phase,
    pub catalog: Catalog,
    pub persisted: PersistedConfig,
    pub implemented: Implemented,
    pub preconfigured: Vec<PreconfiguredFunction>,
    pub framework_flag: Option<TestFramework>,
    pub test_framework: TestFramework,
    pub project: Option<ProjectAnswers>,
    pub selection: Option<Selection>,
    pub resolved: Vec<ResolvedAction>,
    pub merged: MergedActions,
    pub report: WriteReport,
    pub notes: Vec<String>,
}

impl RunState {
    fn enter(&mut self, phase: Phase) {
        debug!(?phase, "entering phase");
        self.phase = phase;
    }

    fn root(&self) -> &Path {
        &self.options.root
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub actions: Vec<ResolvedAction>,
    pub domains: Vec<String>,
    pub files: WriteReport,
    pub notes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

pub fn initializing(options: RunOptions) -> Result<RunState> {
    debug!(phase = ?Phase::Initializing, root = %options.root.display(), "entering phase");
    let catalog = Catalog::load(&options.catalog)?;
    let persisted = PersistedConfig::load(&options.root)?;
    let implemented = detect_implemented(&options.root)?;

    let framework_flag = options
        .test_framework
        .as_deref()
        .map(str::parse::<TestFramework>)
        .transpose()?;
    let test_framework = match (framework_flag, persisted.test_framework.as_deref()) {
        (Some(flag), _) => flag,
        (None, Some(saved)) => saved.parse()?,
        (None, None) => TestFramework::Manual,
    };

    if options.skip_prompts && options.action_names.is_empty() {
        persisted.require_prior_selection(&options.root)?;
    }

    let preconfigured = options.preconfigured.clone();
    Ok(RunState {
        options,
        phase: Phase::Initializing,
        catalog,
        persisted,
        implemented,
        preconfigured,
        framework_flag,
        test_framework,
        project: None,
        selection: None,
        resolved: Vec::new(),
        merged: MergedActions::default(),
        report: WriteReport::default(),
        notes: Vec::new(),
    })
}

/// Project-level questions of the app generator. Confirming
/// enable-on-install hands the install hook to the action phases.
pub fn project_prompting(mut state: RunState, prompter: &mut dyn Prompter) -> Result<RunState> {
    state.enter(Phase::ProjectPrompting);
    let default_name = default_project_name(state.root());
    let ctx = ProjectContext {
        persisted: &state.persisted,
        default_name: &default_name,
        internal: state.options.internal,
        framework_flag: state.framework_flag,
        inside_git: paths::inside_git_repo(state.root()),
    };

    let mut answers = Answers::new();
    let mut defaults = DefaultsPrompter;
    let prompter: &mut dyn Prompter = if state.options.skip_prompts {
        &mut defaults
    } else {
        prompter
    };
    ask_all(prompter, &project_questions(&ctx), &mut answers)?;
    let project = project_answers(&answers, &ctx)?;

    state.test_framework = project.test_framework;
    if project.enable_on_install {
        let hook = enable_on_install_function();
        if !state.preconfigured.contains(&hook) {
            state.preconfigured.push(hook);
        }
    }
    state.project = Some(project);
    Ok(state)
}

/// Choose actions and custom functions, from arguments or in three rounds
/// of questions.
pub fn prompting(mut state: RunState, prompter: &mut dyn Prompter) -> Result<RunState> {
    state.enter(Phase::Prompting);
    let mut defaults = DefaultsPrompter;
    let prompter: &mut dyn Prompter = if state.options.skip_prompts {
        &mut defaults
    } else {
        prompter
    };

    let plan = build_plan(
        &state.catalog,
        &state.persisted,
        Some(state.options.action_names.as_slice()),
        &state.implemented,
        &state.preconfigured,
    )?;
    let plan = match plan {
        Plan::Resolved(actions) => {
            state.resolved = actions;
            return Ok(state);
        }
        Plan::Prompt(plan) => plan,
    };

    let mut answers = Answers::new();
    ask_all(prompter, &plan.selection_questions(), &mut answers)?;
    let chosen = flatten_actions(&answers, &state.catalog);
    ask_all(prompter, &plan.multiplicity_questions(&chosen), &mut answers)?;
    let multiple = multiple_actions(&answers);
    ask_all(prompter, &plan.function_name_questions(&chosen, &multiple), &mut answers)?;

    let mut selection = Selection::from_answers(&answers, &state.catalog);
    // Actions already on disk keep their functions unless new names were given.
    for id in &selection.action_names {
        if selection.multiplicity_choices.contains_key(id) {
            continue;
        }
        if let Some(names) = state.implemented.get(id).filter(|n| !n.is_empty()) {
            selection.multiplicity_choices.insert(id.clone(), names.clone());
        }
    }
    let resolved = selection.resolve(&state.catalog)?;
    info!(actions = resolved.len(), "selection resolved");
    state.resolved = resolved;
    state.selection = Some(selection);
    Ok(state)
}

/// Merge in preconfigured functions and remember the answers.
pub fn configuring(mut state: RunState) -> Result<RunState> {
    state.enter(Phase::Configuring);
    let mut merged = merge(&state.resolved, &state.preconfigured, &state.catalog)?;
    merged
        .do_not_overwrite
        .extend(state.options.do_not_write.iter().cloned());

    let persisted = &mut state.persisted;
    match &state.selection {
        Some(selection) => {
            persisted.domains = selection.domains.clone();
            persisted.action_names = selection.action_names.clone();
        }
        None => {
            let mut domains: IndexSet<String> = persisted.domains.drain(..).collect();
            let mut actions: IndexSet<DottedId> = persisted.action_names.drain(..).collect();
            for action in &state.resolved {
                domains.insert(action.domain.clone());
                actions.insert(action.name.clone());
            }
            persisted.domains = domains.into_iter().collect();
            persisted.action_names = actions.into_iter().collect();
        }
    }
    persisted.test_framework = Some(state.test_framework.as_str().to_string());
    if let Some(project) = &state.project {
        let info = &project.info;
        persisted.name = Some(info.name.clone());
        persisted.version = Some(info.version.clone());
        persisted.description = Some(info.description.clone());
        persisted.application_key = info.application_key.clone();
        persisted.developer_account_id = info.developer_account_id.clone();
        persisted.home_pod = Some(info.home_pod.clone());
        persisted.create_git = Some(project.create_git);
        persisted.enable_on_install = Some(project.enable_on_install);
    }
    persisted.save(&state.options.root)?;

    state.merged = merged;
    Ok(state)
}

pub fn writing(mut state: RunState) -> Result<RunState> {
    state.enter(Phase::Writing);
    let root = state.options.root.clone();
    let mut report = WriteReport::default();

    if let Some(project) = &state.project {
        write_project_files(
            &root,
            &project.info,
            state.test_framework,
            state.options.overwrite_all,
            &mut report,
        )?;
    }

    let (name, description) = project_identity(&state)?;
    let opts = ActionWriteOptions {
        overwrite_all: state.options.overwrite_all,
        test_framework: state.test_framework,
        project_name: name.as_deref(),
        project_description: description.as_deref(),
        enable_on_install: installs_enable_hook(&state.merged)
            || state.persisted.enable_on_install.unwrap_or(false),
    };
    write_actions(&root, &state.merged, &state.catalog, &opts, &mut report)?;

    state.report = report;
    Ok(state)
}

/// Install dev-dependencies and create the git repository. Neither failure
/// aborts the run.
pub fn install(mut state: RunState, installer: &dyn Installer, git: &dyn GitRepo) -> Result<RunState> {
    state.enter(Phase::Install);
    let root = state.options.root.clone();

    let wants_git = state.project.as_ref().is_some_and(|p| p.create_git);
    if wants_git && !root.join(".git").exists() {
        if let Err(e) = git.init(&root) {
            warn!(error = %e, "git init failed");
            state.notes.push(format!("git repository not created: {e}"));
        }
    }

    if state.options.skip_install {
        debug!("install skipped");
        state
            .notes
            .push("Skipped dependency install; run `npm install` before testing.".to_string());
        return Ok(state);
    }

    let packages: Vec<&str> = BASE_DEV_DEPENDENCIES
        .iter()
        .chain(state.test_framework.dev_dependencies())
        .copied()
        .collect();
    if let Err(e) = installer.install_dev_dependencies(&root, &packages) {
        warn!(error = %e, "dependency install failed");
        state.notes.push(format!(
            "Dependencies were not installed ({e}); run `npm install --save-dev {}` yourself.",
            packages.join(" ")
        ));
    }
    Ok(state)
}

pub fn end(mut state: RunState) -> RunSummary {
    state.enter(Phase::End);
    if !state.test_framework.writes_tests() {
        state.notes.push(
            "No test framework selected. Unit tests are strongly recommended for custom functions."
                .to_string(),
        );
    }
    RunSummary {
        actions: state.merged.actions,
        domains: state.merged.domains.into_iter().collect(),
        files: state.report,
        notes: state.notes,
    }
}

/// Run every phase for `options.generator`.
pub fn run(
    options: RunOptions,
    prompter: &mut dyn Prompter,
    installer: &dyn Installer,
    git: &dyn GitRepo,
) -> Result<RunSummary> {
    let mut state = initializing(options)?;
    if state.options.generator == Generator::App {
        state = project_prompting(state, prompter)?;
    }
    let state = prompting(state, prompter)?;
    let state = configuring(state)?;
    let state = writing(state)?;
    let state = install(state, installer, git)?;
    Ok(end(state))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn default_project_name(root: &Path) -> String {
    root.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_PROJECT_NAME)
        .to_string()
}

/// The enable-actions hook is present when it arrived as a preconfigured
/// function, from the app generator or from a parent run.
fn installs_enable_hook(merged: &MergedActions) -> bool {
    merged.do_not_overwrite.contains(ENABLE_ON_INSTALL_ACTION)
        && merged.actions.iter().any(|a| {
            a.name.as_str() == ENABLE_ON_INSTALL_ACTION
                && a.custom_function_names.iter().any(|f| f == ENABLE_ON_INSTALL_ACTION)
        })
}

/// Name and description for generated tests: remembered answers first, then
/// the project's package.json.
fn project_identity(state: &RunState) -> Result<(Option<String>, Option<String>)> {
    let mut name = state.persisted.name.clone();
    let mut description = state.persisted.description.clone();
    if name.is_none() || description.is_none() {
        let package = state.root().join(paths::PACKAGE_JSON);
        if package.exists() {
            let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&package)?)?;
            let field = |key: &str| value.get(key).and_then(|v| v.as_str()).map(str::to_string);
            name = name.or_else(|| field("name"));
            description = description.or_else(|| field("description"));
        }
    }
    Ok((name, description))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
