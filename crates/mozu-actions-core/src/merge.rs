use crate::catalog::Catalog;
use crate::error::Result;
use crate::ident::DottedId;
use crate::resolve::{ensure_unique_functions, ResolvedAction};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// An action/function pair a composing generator requires, whatever the user
/// picked. Its files are created once and never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreconfiguredFunction {
    pub action_id: DottedId,
    pub function_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedActions {
    pub actions: Vec<ResolvedAction>,
    pub domains: IndexSet<String>,
    pub do_not_overwrite: IndexSet<String>,
}

/// Fold preconfigured functions into the resolved selection.
///
/// A preconfigured action already in `resolved` gains the missing function
/// ids (exact string match); otherwise it is appended. Applying the same
/// `preconfigured` to the result again changes nothing.
pub fn merge(
    resolved: &[ResolvedAction],
    preconfigured: &[PreconfiguredFunction],
    catalog: &Catalog,
) -> Result<MergedActions> {
    let mut actions = resolved.to_vec();
    let mut do_not_overwrite = IndexSet::new();

    for pre in preconfigured {
        do_not_overwrite.extend(pre.function_ids.iter().cloned());
        match actions.iter_mut().find(|a| a.name == pre.action_id) {
            Some(existing) => {
                for id in &pre.function_ids {
                    if !existing.custom_function_names.contains(id) {
                        existing.custom_function_names.push(id.clone());
                    }
                }
            }
            None => {
                let domain = catalog.require_domain(&pre.action_id)?.to_string();
                let functions: IndexSet<String> = pre.function_ids.iter().cloned().collect();
                actions.push(ResolvedAction {
                    name: pre.action_id.clone(),
                    domain,
                    custom_function_names: functions.into_iter().collect(),
                });
            }
        }
    }

    ensure_unique_functions(&actions)?;
    let domains = actions.iter().map(|a| a.domain.clone()).collect();

    Ok(MergedActions {
        actions,
        domains,
        do_not_overwrite,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
