//! Writes the project skeleton and the per-action files.

use crate::catalog::Catalog;
use crate::error::{Result, ScaffoldError};
use crate::framework::TestFramework;
use crate::io;
use crate::merge::MergedActions;
use crate::paths;
use crate::project::{ProjectInfo, ENABLE_ON_INSTALL_ACTION};
use crate::template::fill;
use indexmap::IndexSet;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;
use tracing::debug;

/// Bundle path the hosting runtime loads custom functions from.
pub const VIRTUAL_PATH: &str = "./dist/app.js";

#[derive(Debug, Default, Clone, Serialize)]
pub struct WriteReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub skipped: Vec<String>,
}

impl WriteReport {
    fn created(&mut self, root: &Path, path: &Path) {
        self.created.push(paths::relative(root, path));
    }

    fn updated(&mut self, root: &Path, path: &Path) {
        self.updated.push(paths::relative(root, path));
    }

    fn skipped(&mut self, root: &Path, path: &Path) {
        self.skipped.push(paths::relative(root, path));
    }
}

pub struct ActionWriteOptions<'a> {
    pub overwrite_all: bool,
    pub test_framework: TestFramework,
    pub project_name: Option<&'a str>,
    pub project_description: Option<&'a str>,
    /// Write the enable-actions body for the install action's function.
    pub enable_on_install: bool,
}

// ---------------------------------------------------------------------------
// Project files
// ---------------------------------------------------------------------------

pub fn write_project_files(
    root: &Path,
    project: &ProjectInfo,
    framework: TestFramework,
    overwrite_all: bool,
    report: &mut WriteReport,
) -> Result<()> {
    for (name, content) in [
        (".editorconfig", EDITORCONFIG),
        (".jshintrc", JSHINTRC),
        (".gitignore", GITIGNORE),
    ] {
        let path = root.join(name);
        if io::write_if_missing(&path, content.as_bytes())? {
            report.created(root, &path);
        } else {
            report.skipped(root, &path);
        }
    }

    write_package_json(root, project, framework, report)?;
    write_mozu_config(root, project, report)?;

    let readme = root.join(paths::README_MD);
    let content = fill(
        README_TEMPLATE,
        &[
            ("name", project.name.as_str()),
            ("version", project.version.as_str()),
            ("description", project.description.as_str()),
        ],
    );
    write_guarded(root, &readme, &content, overwrite_all, false, report)?;
    Ok(())
}

fn write_package_json(
    root: &Path,
    project: &ProjectInfo,
    framework: TestFramework,
    report: &mut WriteReport,
) -> Result<()> {
    let path = root.join(paths::PACKAGE_JSON);
    let mut package = json!({
        "name": project.name,
        "version": project.version,
        "description": project.description,
        "main": "assets/dist/app.js",
        "private": true,
        "scripts": {},
        "devDependencies": {}
    });
    let existed = path.exists();
    if existed {
        let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        merge_json(&mut package, on_disk);
    }
    if let Some(script) = framework.test_script() {
        merge_json(&mut package, json!({ "scripts": { "test": script } }));
    }
    io::write_json(&path, &package)?;
    if existed {
        report.updated(root, &path);
    } else {
        report.created(root, &path);
    }
    Ok(())
}

fn write_mozu_config(root: &Path, project: &ProjectInfo, report: &mut WriteReport) -> Result<()> {
    let path = root.join(paths::MOZU_CONFIG);
    let existed = path.exists();
    let mut config = if existed {
        serde_json::from_str(&std::fs::read_to_string(&path)?)?
    } else {
        json!({})
    };
    let mut fresh = json!({ "baseUrl": format!("https://{}", project.home_pod) });
    if let Some(account) = &project.developer_account_id {
        fresh["developerAccountId"] = json!(account);
    }
    if let Some(key) = &project.application_key {
        fresh["workingApplicationKey"] = json!(key);
    }
    merge_json(&mut config, fresh);
    io::write_json(&path, &config)?;
    if existed {
        report.updated(root, &path);
    } else {
        report.created(root, &path);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Action files
// ---------------------------------------------------------------------------

pub fn write_actions(
    root: &Path,
    merged: &MergedActions,
    catalog: &Catalog,
    opts: &ActionWriteOptions<'_>,
    report: &mut WriteReport,
) -> Result<()> {
    if opts.test_framework.writes_tests() {
        if opts.project_name.is_none() {
            return Err(ScaffoldError::MissingProjectField("name"));
        }
        if opts.project_description.is_none() {
            return Err(ScaffoldError::MissingProjectField("description"));
        }
    }

    for action in &merged.actions {
        let context = catalog
            .get(&action.name)
            .map(|def| def.context.clone())
            .unwrap_or(Value::Null);
        for function in &action.custom_function_names {
            let protected = merged.do_not_overwrite.contains(function);

            let impl_path = paths::implementation_path(root, &action.domain, function);
            let body = if opts.enable_on_install
                && action.name.as_str() == ENABLE_ON_INSTALL_ACTION
                && function == ENABLE_ON_INSTALL_ACTION
            {
                ENABLE_ACTIONS_IMPLEMENTATION.to_string()
            } else {
                implementation_skeleton(action.name.as_str(), function, &context)?
            };
            write_guarded(root, &impl_path, &body, opts.overwrite_all, protected, report)?;

            if opts.test_framework.writes_tests() {
                let test_path = paths::test_path(root, function);
                let body = fill(
                    MOCHA_TEST_TEMPLATE,
                    &[
                        ("name", opts.project_name.unwrap_or_default()),
                        ("description", opts.project_description.unwrap_or_default()),
                        ("action", action.name.as_str()),
                        ("domain", action.domain.as_str()),
                        ("function", function.as_str()),
                    ],
                );
                write_guarded(root, &test_path, &body, opts.overwrite_all, protected, report)?;
            }
        }
    }

    for domain in &merged.domains {
        let path = paths::domain_manifest(root, domain);
        let existed = path.exists();
        io::atomic_write(&path, domain_manifest(merged, domain).as_bytes())?;
        if existed {
            report.updated(root, &path);
        } else {
            report.created(root, &path);
        }
    }

    let entry = root.join(paths::ENTRY_FILE);
    let existed = entry.exists();
    io::atomic_write(&entry, entry_index(&merged.domains).as_bytes())?;
    if existed {
        report.updated(root, &entry);
    } else {
        report.created(root, &entry);
    }

    let functions = paths::functions_manifest(root);
    let existed = functions.exists();
    io::write_json(&functions, &functions_manifest(merged))?;
    if existed {
        report.updated(root, &functions);
    } else {
        report.created(root, &functions);
    }
    Ok(())
}

/// Create `path`, or replace it under `overwrite_all` unless it is protected.
fn write_guarded(
    root: &Path,
    path: &Path,
    content: &str,
    overwrite_all: bool,
    protected: bool,
    report: &mut WriteReport,
) -> Result<()> {
    if !path.exists() {
        io::atomic_write(path, content.as_bytes())?;
        report.created(root, path);
    } else if overwrite_all && !protected {
        io::atomic_write(path, content.as_bytes())?;
        report.updated(root, path);
    } else {
        debug!(path = %path.display(), protected, "keeping existing file");
        report.skipped(root, path);
    }
    Ok(())
}

fn implementation_skeleton(action: &str, function: &str, context: &Value) -> Result<String> {
    let context = serde_json::to_string_pretty(context)?
        .lines()
        .map(|l| format!(" * {l}"))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(fill(
        IMPLEMENTATION_TEMPLATE,
        &[("action", action), ("function", function), ("context", context.as_str())],
    ))
}

fn domain_manifest(merged: &MergedActions, domain: &str) -> String {
    let entries: Vec<String> = merged
        .actions
        .iter()
        .filter(|a| a.domain == domain)
        .flat_map(|a| {
            a.custom_function_names.iter().map(move |f| {
                format!(
                    "  '{f}': {{\n    actionName: '{action}',\n    customFunction: require('../domains/{domain}/{f}')\n  }}",
                    action = a.name,
                )
            })
        })
        .collect();
    format!("module.exports = {{\n\n{}\n}};\n", entries.join(",\n\n"))
}

fn entry_index(domains: &IndexSet<String>) -> String {
    let requires: Vec<String> = domains
        .iter()
        .map(|d| format!("  require('./manifests/{d}')"))
        .collect();
    fill(ENTRY_TEMPLATE, &[("requires", requires.join(",\n").as_str())])
}

fn functions_manifest(merged: &MergedActions) -> Value {
    let exports: Vec<Value> = merged
        .actions
        .iter()
        .flat_map(|a| {
            a.custom_function_names.iter().map(move |f| {
                json!({
                    "id": f,
                    "virtualPath": VIRTUAL_PATH,
                    "actionId": a.name,
                })
            })
        })
        .collect();
    json!({ "exports": exports })
}

/// Recursively overlay `overlay` onto `base`; non-object values replace.
pub fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

const IMPLEMENTATION_TEMPLATE: &str = r#"/**
 * Implementation for {{action}}
 * Custom function: {{function}}
 *
 * This custom function receives the following context object:
{{context}}
 */

module.exports = function (context, callback) {
  callback();
};
"#;

const ENABLE_ACTIONS_IMPLEMENTATION: &str = r#"/**
 * Runs when the application is installed and enables every custom function
 * listed in functions.json for the installing tenant.
 */

var ActionInstaller = require('mozu-action-helpers/installers/actions');

module.exports = function (context, callback) {
  var installer = new ActionInstaller({ context: context.apiContext });
  installer.enableActions(context)
    .then(callback.bind(null, null), callback);
};
"#;

const MOCHA_TEST_TEMPLATE: &str = r#"/**
 * Unit tests for {{name}}: {{description}}
 *
 * Scaffold for the custom function `{{function}}`, implementing
 * `{{action}}`. Modify the test conditions below. You may:
 *  - add assertions on code actions with Simulator.assert
 *  - create a mock context with Simulator.context() and modify it
 *  - use the mock business objects in Simulator.fixtures
 */

'use strict';

var Simulator = require('mozu-action-simulator');
var assert = Simulator.assert;

var actionName = '{{action}}';

describe('{{function}} implementing {{action}}', function () {

  var action;

  before(function () {
    action = require('../src/domains/{{domain}}/{{function}}');
  });

  it('runs successfully', function (done) {

    var callback = function (err) {
      assert.ok(!err, 'Callback was called with an error: ' + err);
      done();
    };

    var context = Simulator.context(actionName, callback);

    Simulator.simulate(actionName, action, context, callback);
  });
});
"#;

const ENTRY_TEMPLATE: &str = r#"var manifests = [
{{requires}}
];

module.exports = manifests.reduce(function (all, manifest) {
  Object.keys(manifest).forEach(function (key) {
    all[key] = manifest[key];
  });
  return all;
}, {});
"#;

const README_TEMPLATE: &str = r#"# {{name}}

Version {{version}}

{{description}}

## Layout

- `assets/src/domains/<domain>/` holds one file per custom function.
- `assets/src/manifests/<domain>.js` maps custom functions to their actions.
- `assets/test/` holds the unit tests, when a test framework was chosen.
- `assets/functions.json` lists the exported custom functions.

Run the generator again to add actions; existing implementations are kept.
"#;

const EDITORCONFIG: &str = r#"root = true

[*]
indent_style = space
indent_size = 2
end_of_line = lf
charset = utf-8
trim_trailing_whitespace = true
insert_final_newline = true

[*.md]
trim_trailing_whitespace = false
"#;

const JSHINTRC: &str = r#"{
  "node": true,
  "curly": true,
  "eqeqeq": true,
  "undef": true,
  "unused": true,
  "strict": false,
  "globals": {
    "describe": false,
    "it": false,
    "before": false,
    "after": false
  }
}
"#;

const GITIGNORE: &str = r#"node_modules
assets/dist
mozu.config.json
*.log
"#;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
