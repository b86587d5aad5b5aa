//! Builds the questions for choosing domains, actions and custom functions.
//!
//! Later questions depend on earlier answers, so the plan hands them out in
//! three rounds: [`PromptPlan::selection_questions`],
//! [`PromptPlan::multiplicity_questions`] and
//! [`PromptPlan::function_name_questions`].

use crate::catalog::Catalog;
use crate::config::PersistedConfig;
use crate::detect::Implemented;
use crate::error::Result;
use crate::ident::DottedId;
use crate::merge::PreconfiguredFunction;
use crate::prompt::{
    Choice, ChoiceItem, Question, QuestionKind, Validation, Visibility, FUNCTION_NAMES_PREFIX,
};
use crate::resolve::{ensure_unique_functions, ResolvedAction};
use indexmap::IndexSet;
use tracing::debug;

pub const DOMAINS_KEY: &str = "domains";
pub const CREATE_MULTIPLE_KEY: &str = "createMultiple";
pub const MULTIPLE_ACTIONS_KEY: &str = "multipleActions";
pub const SINGLE: &str = "single";
pub const MULTIPLE: &str = "multiple";

/// Action-id prefixes whose projects usually carry several functions per action.
const HIGH_TRAFFIC_PREFIXES: &[&str] = &["http.storefront."];

/// Answer key for one domain's action list. Answer keys are read as paths by
/// prompt renderers, so the domain goes in escaped.
pub fn actions_key(domain: &str) -> String {
    format!("actionNames_{}", DottedId::new(domain).escape())
}

pub fn function_names_key(action: &DottedId) -> String {
    format!("{FUNCTION_NAMES_PREFIX}{}", action.escape())
}

pub enum Plan<'a> {
    Prompt(PromptPlan<'a>),
    /// Action names were given up front; nothing to ask.
    Resolved(Vec<ResolvedAction>),
}

pub fn build_plan<'a>(
    catalog: &'a Catalog,
    persisted: &PersistedConfig,
    cli_args: Option<&[DottedId]>,
    implemented: &'a Implemented,
    preconfigured: &'a [PreconfiguredFunction],
) -> Result<Plan<'a>> {
    if let Some(args) = cli_args.filter(|a| !a.is_empty()) {
        let mut resolved = Vec::new();
        let unique: IndexSet<&DottedId> = args.iter().collect();
        for id in unique {
            let domain = catalog.require_domain(id)?;
            let custom_function_names = match implemented.get(id) {
                Some(names) if !names.is_empty() => names.clone(),
                _ => vec![id.to_string()],
            };
            resolved.push(ResolvedAction {
                name: id.clone(),
                domain: domain.to_string(),
                custom_function_names,
            });
        }
        let given = resolved.len();
        resolved.extend(existing_actions(catalog, persisted, implemented, args));
        ensure_unique_functions(&resolved)?;
        debug!(
            given,
            kept = resolved.len() - given,
            "actions given as arguments, skipping prompts"
        );
        return Ok(Plan::Resolved(resolved));
    }

    let default_actions: Vec<DottedId> = if implemented.is_empty() {
        persisted.action_names.clone()
    } else {
        implemented.keys().cloned().collect()
    };
    let default_domains: Vec<String> = if persisted.domains.is_empty() {
        let domains: IndexSet<&str> = default_actions
            .iter()
            .filter_map(|id| catalog.domain_of(id))
            .collect();
        domains.into_iter().map(str::to_string).collect()
    } else {
        persisted.domains.clone()
    };

    Ok(Plan::Prompt(PromptPlan {
        catalog,
        implemented,
        preconfigured,
        default_domains,
        default_actions,
    }))
}

/// Actions the project already has, on disk or remembered, that are not in
/// `args`. Argument runs add to the project, so these stay in the generated
/// index and functions.json.
fn existing_actions(
    catalog: &Catalog,
    persisted: &PersistedConfig,
    implemented: &Implemented,
    args: &[DottedId],
) -> Vec<ResolvedAction> {
    let known: IndexSet<&DottedId> = implemented
        .keys()
        .chain(&persisted.action_names)
        .filter(|id| !args.contains(*id))
        .collect();
    known
        .into_iter()
        .filter_map(|id| {
            let Some(domain) = catalog.domain_of(id) else {
                debug!(action = %id, "existing action not in catalog, dropped");
                return None;
            };
            let custom_function_names = match implemented.get(id) {
                Some(names) if !names.is_empty() => names.clone(),
                _ => vec![id.to_string()],
            };
            Some(ResolvedAction {
                name: id.clone(),
                domain: domain.to_string(),
                custom_function_names,
            })
        })
        .collect()
}

pub struct PromptPlan<'a> {
    catalog: &'a Catalog,
    implemented: &'a Implemented,
    preconfigured: &'a [PreconfiguredFunction],
    default_domains: Vec<String>,
    default_actions: Vec<DottedId>,
}

impl PromptPlan<'_> {
    /// Domain choice, then one action list per domain shown only when that
    /// domain was chosen.
    pub fn selection_questions(&self) -> Vec<Question> {
        let domains = self.catalog.domains();
        let mut questions = vec![Question::new(
            DOMAINS_KEY,
            "Choose domains:",
            QuestionKind::MultiSelect {
                choices: domains
                    .iter()
                    .map(|d| ChoiceItem::Choice(Choice::same(d.as_str())))
                    .collect(),
                defaults: self
                    .default_domains
                    .iter()
                    .filter(|d| domains.contains(d))
                    .cloned()
                    .collect(),
            },
        )
        .validate(Validation::AtLeastOne(
            "Please choose at least one domain to scaffold.".to_string(),
        ))];

        for domain in domains {
            let mut choices = vec![ChoiceItem::Separator(format!("- Domain {domain}"))];
            let mut defaults = Vec::new();
            for action in self.catalog.actions_in(domain) {
                let id = action.action_id.to_string();
                if self.default_actions.contains(&action.action_id) {
                    defaults.push(id.clone());
                }
                choices.push(ChoiceItem::Choice(Choice::same(id)));
            }
            questions.push(
                Question::new(
                    actions_key(domain),
                    "Choose one or more actions to scaffold.",
                    QuestionKind::MultiSelect { choices, defaults },
                )
                .when(Visibility::ChoiceIncludes {
                    question: DOMAINS_KEY.to_string(),
                    value: domain.clone(),
                }),
            );
        }
        questions
    }

    /// Whether to give some actions more than one custom function, and which.
    /// Empty when no chosen action supports it.
    pub fn multiplicity_questions(&self, chosen: &[DottedId]) -> Vec<Question> {
        let capable: Vec<&DottedId> = chosen
            .iter()
            .filter(|id| self.catalog.supports_multiple(id))
            .collect();
        if capable.is_empty() {
            return Vec::new();
        }

        let already_multiple: Vec<String> = capable
            .iter()
            .filter(|id| self.implemented.get(**id).is_some_and(|f| f.len() > 1))
            .map(|id| id.to_string())
            .collect();
        let high_traffic = chosen.iter().any(|id| {
            HIGH_TRAFFIC_PREFIXES
                .iter()
                .any(|p| id.as_str().starts_with(p))
        });
        let default_mode = if !already_multiple.is_empty() || high_traffic {
            MULTIPLE
        } else {
            SINGLE
        };

        vec![
            Question::new(
                CREATE_MULTIPLE_KEY,
                "Some of the chosen actions can run several custom functions. How many per action?",
                QuestionKind::Select {
                    choices: vec![
                        Choice::new("One custom function per action", SINGLE),
                        Choice::new("Multiple custom functions for some actions", MULTIPLE),
                    ],
                    default: Some(default_mode.to_string()),
                },
            ),
            Question::new(
                MULTIPLE_ACTIONS_KEY,
                "Which actions should have multiple custom functions?",
                QuestionKind::MultiSelect {
                    choices: capable
                        .iter()
                        .map(|id| ChoiceItem::Choice(Choice::same(id.as_str())))
                        .collect(),
                    defaults: already_multiple,
                },
            )
            .when(Visibility::Equals {
                question: CREATE_MULTIPLE_KEY.to_string(),
                value: MULTIPLE.to_string(),
            }),
        ]
    }

    /// One free-text question per action in `multiple`. Names already bound
    /// to single-function actions or preconfigured functions are taken. A
    /// single-function action with functions on disk keeps those names.
    pub fn function_name_questions(&self, chosen: &[DottedId], multiple: &[DottedId]) -> Vec<Question> {
        multiple
            .iter()
            .map(|id| {
                let mut taken: Vec<String> = chosen
                    .iter()
                    .filter(|c| !multiple.contains(*c))
                    .flat_map(|c| match self.implemented.get(c) {
                        Some(names) if !names.is_empty() => names.clone(),
                        _ => vec![c.to_string()],
                    })
                    .collect();
                taken.extend(
                    self.preconfigured
                        .iter()
                        .filter(|p| &p.action_id != id)
                        .flat_map(|p| p.function_ids.iter().cloned()),
                );
                let default = self
                    .implemented
                    .get(id)
                    .filter(|names| !names.is_empty())
                    .map(|names| names.join(","));
                Question::new(
                    function_names_key(id),
                    format!("Custom function names for {id} (comma-separated):"),
                    QuestionKind::Input { default },
                )
                .validate(Validation::FunctionNames { taken })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ActionDefinition;
    use crate::error::ScaffoldError;
    use crate::prompt::{Answer, Answers};
    use indexmap::IndexMap;

    fn catalog() -> Catalog {
        let def = |id: &str, multi: bool| ActionDefinition {
            action_id: DottedId::new(id),
            domain: String::new(),
            context: serde_json::Value::Null,
            supports_multiple_custom_functions: multi,
            beta: false,
        };
        Catalog::from_definitions(
            &[
                "platform.applications".to_string(),
                "commerce.carts".to_string(),
                "storefront".to_string(),
            ],
            vec![
                def("platform.applications.install", true),
                def("embedded.commerce.carts.addItem.before", true),
                def("embedded.commerce.carts.updateItem.before", false),
                def("http.storefront.routes", true),
            ],
            false,
        )
    }

    fn prompt_plan<'a>(
        catalog: &'a Catalog,
        persisted: &PersistedConfig,
        implemented: &'a Implemented,
    ) -> PromptPlan<'a> {
        match build_plan(catalog, persisted, None, implemented, &[]).unwrap() {
            Plan::Prompt(plan) => plan,
            Plan::Resolved(_) => panic!("expected prompts"),
        }
    }

    #[test]
    fn cli_args_skip_prompts() {
        let catalog = catalog();
        let implemented = IndexMap::new();
        let args = [DottedId::new("platform.applications.install")];
        let plan = build_plan(&catalog, &PersistedConfig::default(), Some(&args[..]), &implemented, &[]).unwrap();
        let Plan::Resolved(actions) = plan else {
            panic!("expected resolved selection");
        };
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].domain, "platform.applications");
        assert_eq!(actions[0].custom_function_names, ["platform.applications.install"]);
    }

    #[test]
    fn cli_arg_without_domain_is_unknown() {
        let catalog = catalog();
        let implemented = IndexMap::new();
        let args = [DottedId::new("embedded.commerce.orders.action.before")];
        let err = build_plan(&catalog, &PersistedConfig::default(), Some(&args[..]), &implemented, &[])
            .err()
            .unwrap();
        assert!(matches!(err, ScaffoldError::UnknownAction(_)));
    }

    #[test]
    fn cli_args_keep_implemented_functions() {
        let catalog = catalog();
        let route = DottedId::new("http.storefront.routes");
        let mut implemented = IndexMap::new();
        implemented.insert(route.clone(), vec!["home".to_string(), "about".to_string()]);
        let Plan::Resolved(actions) =
            build_plan(&catalog, &PersistedConfig::default(), Some(&[route][..]), &implemented, &[]).unwrap()
        else {
            panic!("expected resolved selection");
        };
        assert_eq!(actions[0].custom_function_names, ["home", "about"]);
    }

    #[test]
    fn selection_questions_follow_catalog_order() {
        let catalog = catalog();
        let implemented = IndexMap::new();
        let persisted = PersistedConfig {
            domains: vec!["commerce.carts".to_string()],
            action_names: vec!["embedded.commerce.carts.addItem.before".into()],
            ..Default::default()
        };
        let questions = prompt_plan(&catalog, &persisted, &implemented).selection_questions();

        let names: Vec<&str> = questions.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "domains",
                "actionNames_platform*applications",
                "actionNames_commerce*carts",
                "actionNames_storefront",
            ]
        );
        let QuestionKind::MultiSelect { defaults, .. } = &questions[0].kind else {
            panic!("domains should be a multi-select");
        };
        assert_eq!(defaults, &["commerce.carts"]);

        let QuestionKind::MultiSelect { choices, defaults } = &questions[2].kind else {
            panic!("actions should be a multi-select");
        };
        assert_eq!(
            choices[0],
            ChoiceItem::Separator("- Domain commerce.carts".to_string())
        );
        assert_eq!(defaults, &["embedded.commerce.carts.addItem.before"]);
    }

    #[test]
    fn action_lists_visible_only_for_chosen_domains() {
        let catalog = catalog();
        let implemented = IndexMap::new();
        let questions =
            prompt_plan(&catalog, &PersistedConfig::default(), &implemented).selection_questions();
        let mut answers = Answers::new();
        answers.insert(
            DOMAINS_KEY.to_string(),
            Answer::Choices(vec!["storefront".to_string()]),
        );
        let visible: Vec<&str> = questions
            .iter()
            .filter(|q| q.is_visible(&answers))
            .map(|q| q.name.as_str())
            .collect();
        assert_eq!(visible, ["domains", "actionNames_storefront"]);
    }

    #[test]
    fn implemented_actions_drive_defaults() {
        let catalog = catalog();
        let mut implemented = IndexMap::new();
        implemented.insert(
            DottedId::new("platform.applications.install"),
            vec!["platform.applications.install".to_string()],
        );
        let questions =
            prompt_plan(&catalog, &PersistedConfig::default(), &implemented).selection_questions();
        assert_eq!(
            questions[0].default_answer(),
            Answer::Choices(vec!["platform.applications".to_string()])
        );
    }

    #[test]
    fn no_multiplicity_questions_without_capable_actions() {
        let catalog = catalog();
        let implemented = IndexMap::new();
        let plan = prompt_plan(&catalog, &PersistedConfig::default(), &implemented);
        assert!(plan
            .multiplicity_questions(&["embedded.commerce.carts.updateItem.before".into()])
            .is_empty());
    }

    #[test]
    fn multiplicity_defaults_to_single() {
        let catalog = catalog();
        let implemented = IndexMap::new();
        let plan = prompt_plan(&catalog, &PersistedConfig::default(), &implemented);
        let questions = plan.multiplicity_questions(&[
            "embedded.commerce.carts.addItem.before".into(),
            "embedded.commerce.carts.updateItem.before".into(),
        ]);
        assert_eq!(questions[0].default_answer(), Answer::Choice(SINGLE.to_string()));
        let QuestionKind::MultiSelect { choices, .. } = &questions[1].kind else {
            panic!("expected multi-select");
        };
        assert_eq!(choices.len(), 1);
    }

    #[test]
    fn multiplicity_defaults_to_multiple_for_routes_or_prior_functions() {
        let catalog = catalog();
        let implemented = IndexMap::new();
        let plan = prompt_plan(&catalog, &PersistedConfig::default(), &implemented);
        let questions = plan.multiplicity_questions(&["http.storefront.routes".into()]);
        assert_eq!(questions[0].default_answer(), Answer::Choice(MULTIPLE.to_string()));

        let mut implemented = IndexMap::new();
        implemented.insert(
            DottedId::new("embedded.commerce.carts.addItem.before"),
            vec!["a".to_string(), "b".to_string()],
        );
        let plan = prompt_plan(&catalog, &PersistedConfig::default(), &implemented);
        let questions = plan.multiplicity_questions(&["embedded.commerce.carts.addItem.before".into()]);
        assert_eq!(questions[0].default_answer(), Answer::Choice(MULTIPLE.to_string()));
        assert_eq!(
            questions[1].default_answer(),
            Answer::Choices(vec!["embedded.commerce.carts.addItem.before".to_string()])
        );
    }

    #[test]
    fn function_name_questions_reserve_single_actions() {
        let catalog = catalog();
        let mut implemented = IndexMap::new();
        let route = DottedId::new("http.storefront.routes");
        implemented.insert(route.clone(), vec!["home".to_string(), "cart".to_string()]);
        let preconfigured = vec![PreconfiguredFunction {
            action_id: "platform.applications.install".into(),
            function_ids: vec!["enable".to_string()],
        }];
        let Plan::Prompt(plan) =
            build_plan(&catalog, &PersistedConfig::default(), None, &implemented, &preconfigured).unwrap()
        else {
            panic!("expected prompts");
        };
        let chosen = [route.clone(), "embedded.commerce.carts.updateItem.before".into()];
        let questions = plan.function_name_questions(&chosen, &[route.clone()]);

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].name, "functionNames_http*storefront*routes");
        assert_eq!(questions[0].default_answer(), Answer::Text("home,cart".to_string()));
        assert_eq!(
            questions[0].validate,
            Some(Validation::FunctionNames {
                taken: vec![
                    "embedded.commerce.carts.updateItem.before".to_string(),
                    "enable".to_string(),
                ]
            })
        );
    }

    #[test]
    fn single_actions_reserve_their_functions_on_disk() {
        let catalog = catalog();
        let route = DottedId::new("http.storefront.routes");
        let carts = DottedId::new("embedded.commerce.carts.addItem.before");
        let mut implemented = IndexMap::new();
        implemented.insert(route.clone(), vec!["home".to_string(), "about".to_string()]);
        let plan = prompt_plan(&catalog, &PersistedConfig::default(), &implemented);

        let questions = plan.function_name_questions(&[route, carts.clone()], &[carts]);
        assert_eq!(
            questions[0].validate,
            Some(Validation::FunctionNames {
                taken: vec!["home".to_string(), "about".to_string()]
            })
        );
    }

    #[test]
    fn cli_args_add_to_existing_actions() {
        let catalog = catalog();
        let route = DottedId::new("http.storefront.routes");
        let mut implemented = IndexMap::new();
        implemented.insert(route.clone(), vec!["home".to_string()]);
        let persisted = PersistedConfig {
            action_names: vec![route.clone(), "platform.applications.install".into()],
            ..Default::default()
        };
        let args = [DottedId::new("embedded.commerce.carts.addItem.before")];
        let Plan::Resolved(actions) =
            build_plan(&catalog, &persisted, Some(&args[..]), &implemented, &[]).unwrap()
        else {
            panic!("expected resolved selection");
        };

        let names: Vec<&str> = actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "embedded.commerce.carts.addItem.before",
                "http.storefront.routes",
                "platform.applications.install",
            ]
        );
        assert_eq!(actions[1].custom_function_names, ["home"]);
        assert_eq!(actions[2].domain, "platform.applications");
    }
}
