use crate::catalog::Catalog;
use crate::error::{Result, ScaffoldError};
use crate::ident::DottedId;
use crate::plan::{actions_key, function_names_key, CREATE_MULTIPLE_KEY, DOMAINS_KEY, MULTIPLE, MULTIPLE_ACTIONS_KEY};
use crate::prompt::{split_names, Answers};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ResolvedAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAction {
    pub name: DottedId,
    pub domain: String,
    pub custom_function_names: Vec<String>,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// What the user picked across the prompt rounds, before resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub domains: Vec<String>,
    pub action_names: Vec<DottedId>,
    pub create_multiple: bool,
    pub multiplicity_choices: IndexMap<DottedId, Vec<String>>,
}

impl Selection {
    pub fn from_answers(answers: &Answers, catalog: &Catalog) -> Self {
        let create_multiple = answers
            .get(CREATE_MULTIPLE_KEY)
            .and_then(|a| a.as_text())
            .is_some_and(|v| v == MULTIPLE);
        Self {
            domains: answers
                .get(DOMAINS_KEY)
                .map(|a| a.as_choices().to_vec())
                .unwrap_or_default(),
            action_names: flatten_actions(answers, catalog),
            create_multiple,
            multiplicity_choices: if create_multiple {
                function_names(answers)
            } else {
                IndexMap::new()
            },
        }
    }

    pub fn resolve(&self, catalog: &Catalog) -> Result<Vec<ResolvedAction>> {
        resolve_actions(&self.action_names, catalog, &self.multiplicity_choices)
    }
}

/// Resolve raw prompt answers into action records.
pub fn resolve(
    answers: &Answers,
    catalog: &Catalog,
    multiplicity: &IndexMap<DottedId, Vec<String>>,
) -> Result<Vec<ResolvedAction>> {
    resolve_actions(&flatten_actions(answers, catalog), catalog, multiplicity)
}

/// Per-domain action answers as one list, in domain order, first one wins.
pub fn flatten_actions(answers: &Answers, catalog: &Catalog) -> Vec<DottedId> {
    let mut chosen = IndexSet::new();
    for domain in catalog.domains() {
        if let Some(answer) = answers.get(&actions_key(domain)) {
            chosen.extend(answer.as_choices().iter().map(|v| DottedId::new(v.as_str())));
        }
    }
    chosen.into_iter().collect()
}

/// Actions the user asked to give multiple functions to (step 4).
pub fn multiple_actions(answers: &Answers) -> Vec<DottedId> {
    let wants_multiple = answers
        .get(CREATE_MULTIPLE_KEY)
        .and_then(|a| a.as_text())
        .is_some_and(|v| v == MULTIPLE);
    if !wants_multiple {
        return Vec::new();
    }
    answers
        .get(MULTIPLE_ACTIONS_KEY)
        .map(|a| a.as_choices().iter().map(|v| DottedId::new(v.as_str())).collect())
        .unwrap_or_default()
}

/// Parsed function-name answers keyed by action.
pub fn function_names(answers: &Answers) -> IndexMap<DottedId, Vec<String>> {
    multiple_actions(answers)
        .into_iter()
        .filter_map(|id| {
            let raw = answers.get(&function_names_key(&id))?.as_text()?.to_string();
            let names: IndexSet<String> = split_names(&raw).into_iter().collect();
            Some((id, names.into_iter().collect()))
        })
        .collect()
}

pub fn resolve_actions(
    ids: &[DottedId],
    catalog: &Catalog,
    multiplicity: &IndexMap<DottedId, Vec<String>>,
) -> Result<Vec<ResolvedAction>> {
    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        let def = catalog
            .get(id)
            .ok_or_else(|| ScaffoldError::UnknownAction(id.to_string()))?;
        let custom_function_names = match multiplicity.get(id) {
            Some(names) if !names.is_empty() => names.clone(),
            _ => vec![id.to_string()],
        };
        resolved.push(ResolvedAction {
            name: id.clone(),
            domain: def.domain.clone(),
            custom_function_names,
        });
    }
    ensure_unique_functions(&resolved)?;
    Ok(resolved)
}

/// Every custom function name must be unique across the whole set, not just
/// within the prompt batch it was typed in.
pub fn ensure_unique_functions(actions: &[ResolvedAction]) -> Result<()> {
    let mut seen = IndexSet::new();
    let mut duplicates = IndexSet::new();
    for name in actions.iter().flat_map(|a| &a.custom_function_names) {
        if !seen.insert(name.as_str()) {
            duplicates.insert(name.clone());
        }
    }
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(ScaffoldError::DuplicateFunctionName(
            duplicates.into_iter().collect(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
