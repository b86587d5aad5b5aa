//! Project-level prompts asked by the app generator before it composes the
//! action step.

use crate::config::PersistedConfig;
use crate::error::{Result, ScaffoldError};
use crate::framework::TestFramework;
use crate::merge::PreconfiguredFunction;
use crate::prompt::{is_semver, Answer, Answers, Choice, Question, QuestionKind, Validation};

pub const DEFAULT_VERSION: &str = "0.1.0";
pub const DEFAULT_HOME_POD: &str = "home.mozu.com";

/// Environments offered to internal developers.
pub const HOME_PODS: &[(&str, &str)] = &[
    ("Production / Sandbox", "home.mozu.com"),
    ("Staging", "home.staging.mozu.com"),
    ("QA", "home.mozu-qa.com"),
    ("CI", "home.mozu-ci.com"),
];

/// The install action that receives the enable-actions function.
pub const ENABLE_ON_INSTALL_ACTION: &str = "embedded.platform.applications.install";

pub const NAME_KEY: &str = "name";
pub const VERSION_KEY: &str = "version";
pub const DESCRIPTION_KEY: &str = "description";
pub const APPLICATION_KEY_KEY: &str = "applicationKey";
pub const DEVELOPER_ACCOUNT_KEY: &str = "developerAccountId";
pub const HOME_POD_KEY: &str = "homePod";
pub const TEST_FRAMEWORK_KEY: &str = "testFramework";
pub const ENABLE_ON_INSTALL_KEY: &str = "enableOnInstall";
pub const CREATE_GIT_KEY: &str = "createGit";

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub application_key: Option<String>,
    pub developer_account_id: Option<String>,
    pub home_pod: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectAnswers {
    pub info: ProjectInfo,
    pub test_framework: TestFramework,
    pub enable_on_install: bool,
    pub create_git: bool,
}

/// Inputs that shape which project questions are asked and their defaults.
pub struct ProjectContext<'a> {
    pub persisted: &'a PersistedConfig,
    pub default_name: &'a str,
    pub internal: bool,
    /// Set by `--testFramework`; the framework question is then not asked.
    pub framework_flag: Option<TestFramework>,
    pub inside_git: bool,
}

pub fn project_questions(ctx: &ProjectContext<'_>) -> Vec<Question> {
    let p = ctx.persisted;
    let mut questions = vec![
        Question::new(
            NAME_KEY,
            "Name your extension:",
            QuestionKind::Input {
                default: Some(p.name.clone().unwrap_or_else(|| ctx.default_name.to_string())),
            },
        )
        .validate(Validation::Required),
        Question::new(
            VERSION_KEY,
            "Initial version:",
            QuestionKind::Input {
                default: Some(p.version.clone().unwrap_or_else(|| DEFAULT_VERSION.to_string())),
            },
        )
        .validate(Validation::SemVer),
        Question::new(
            DESCRIPTION_KEY,
            "Short description:",
            QuestionKind::Input {
                default: Some(p.description.clone().unwrap_or_default()),
            },
        ),
        Question::new(
            APPLICATION_KEY_KEY,
            "Application key for this project:",
            QuestionKind::Input {
                default: p.application_key.clone(),
            },
        ),
        Question::new(
            DEVELOPER_ACCOUNT_KEY,
            "Developer account id:",
            QuestionKind::Input {
                default: p.developer_account_id.clone(),
            },
        ),
    ];

    if ctx.internal {
        questions.push(Question::new(
            HOME_POD_KEY,
            "Choose an environment:",
            QuestionKind::Select {
                choices: HOME_PODS
                    .iter()
                    .map(|(label, pod)| Choice::new(format!("{label} ({pod})"), *pod))
                    .collect(),
                default: Some(
                    p.home_pod
                        .clone()
                        .unwrap_or_else(|| DEFAULT_HOME_POD.to_string()),
                ),
            },
        ));
    }

    if ctx.framework_flag.is_none() {
        questions.push(Question::new(
            TEST_FRAMEWORK_KEY,
            "Choose a test framework:",
            QuestionKind::Select {
                choices: TestFramework::all()
                    .iter()
                    .map(|f| Choice::new(f.label(), f.as_str()))
                    .collect(),
                default: Some(
                    p.test_framework
                        .clone()
                        .unwrap_or_else(|| TestFramework::Manual.as_str().to_string()),
                ),
            },
        ));
    }

    questions.push(Question::new(
        ENABLE_ON_INSTALL_KEY,
        format!(
            "Enable actions on install? (This will add a custom function to the {ENABLE_ON_INSTALL_ACTION} action.)"
        ),
        QuestionKind::Confirm {
            default: p.enable_on_install.unwrap_or(false),
        },
    ));

    if !ctx.inside_git {
        questions.push(Question::new(
            CREATE_GIT_KEY,
            "Create a git repository?",
            QuestionKind::Confirm {
                default: p.create_git.unwrap_or(false),
            },
        ));
    }

    questions
}

pub fn project_answers(answers: &Answers, ctx: &ProjectContext<'_>) -> Result<ProjectAnswers> {
    let text = |key: &str| {
        answers
            .get(key)
            .and_then(Answer::as_text)
            .map(|s| s.trim().to_string())
    };
    let optional = |key: &str| text(key).filter(|s| !s.is_empty());

    let name = optional(NAME_KEY).ok_or(ScaffoldError::MissingProjectField("name"))?;
    let version = text(VERSION_KEY).unwrap_or_else(|| DEFAULT_VERSION.to_string());
    if !is_semver(&version) {
        return Err(ScaffoldError::InvalidVersion(version));
    }

    let test_framework = match ctx.framework_flag {
        Some(f) => f,
        None => optional(TEST_FRAMEWORK_KEY)
            .as_deref()
            .unwrap_or(TestFramework::Manual.as_str())
            .parse()?,
    };

    Ok(ProjectAnswers {
        info: ProjectInfo {
            name,
            version,
            description: text(DESCRIPTION_KEY).unwrap_or_default(),
            application_key: optional(APPLICATION_KEY_KEY),
            developer_account_id: optional(DEVELOPER_ACCOUNT_KEY),
            home_pod: optional(HOME_POD_KEY)
                .or_else(|| ctx.persisted.home_pod.clone())
                .unwrap_or_else(|| DEFAULT_HOME_POD.to_string()),
        },
        test_framework,
        enable_on_install: answers
            .get(ENABLE_ON_INSTALL_KEY)
            .and_then(Answer::as_bool)
            .unwrap_or(false),
        create_git: answers
            .get(CREATE_GIT_KEY)
            .and_then(Answer::as_bool)
            .unwrap_or(false),
    })
}

pub fn enable_on_install_function() -> PreconfiguredFunction {
    PreconfiguredFunction {
        action_id: ENABLE_ON_INSTALL_ACTION.into(),
        function_ids: vec![ENABLE_ON_INSTALL_ACTION.to_string()],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{ask_all, DefaultsPrompter};

    fn ctx(persisted: &PersistedConfig) -> ProjectContext<'_> {
        ProjectContext {
            persisted,
            default_name: "my-extension",
            internal: false,
            framework_flag: None,
            inside_git: false,
        }
    }

    #[test]
    fn defaults_come_from_directory_and_persisted_config() {
        let persisted = PersistedConfig {
            test_framework: Some("mocha".to_string()),
            enable_on_install: Some(true),
            ..Default::default()
        };
        let ctx = ctx(&persisted);
        let mut answers = Answers::new();
        ask_all(&mut DefaultsPrompter, &project_questions(&ctx), &mut answers).unwrap();
        let project = project_answers(&answers, &ctx).unwrap();

        assert_eq!(project.info.name, "my-extension");
        assert_eq!(project.info.version, DEFAULT_VERSION);
        assert_eq!(project.info.home_pod, DEFAULT_HOME_POD);
        assert_eq!(project.test_framework, TestFramework::Mocha);
        assert!(project.enable_on_install);
        assert!(!project.create_git);
    }

    #[test]
    fn environment_question_only_for_internal_runs() {
        let persisted = PersistedConfig::default();
        let mut ctx = ctx(&persisted);
        assert!(!project_questions(&ctx).iter().any(|q| q.name == HOME_POD_KEY));
        ctx.internal = true;
        assert!(project_questions(&ctx).iter().any(|q| q.name == HOME_POD_KEY));
    }

    #[test]
    fn framework_flag_suppresses_question() {
        let persisted = PersistedConfig::default();
        let mut ctx = ctx(&persisted);
        ctx.framework_flag = Some(TestFramework::Manual);
        assert!(!project_questions(&ctx).iter().any(|q| q.name == TEST_FRAMEWORK_KEY));
    }

    #[test]
    fn git_question_skipped_inside_repository() {
        let persisted = PersistedConfig::default();
        let mut ctx = ctx(&persisted);
        ctx.inside_git = true;
        assert!(!project_questions(&ctx).iter().any(|q| q.name == CREATE_GIT_KEY));
    }

    #[test]
    fn invalid_persisted_version_is_rejected() {
        let persisted = PersistedConfig {
            version: Some("1.0".to_string()),
            ..Default::default()
        };
        let ctx = ctx(&persisted);
        let mut answers = Answers::new();
        let err = ask_all(&mut DefaultsPrompter, &project_questions(&ctx), &mut answers).unwrap_err();
        assert!(matches!(err, ScaffoldError::InvalidAnswer { ref question, .. } if question == VERSION_KEY));
    }

    #[test]
    fn enable_on_install_targets_install_action() {
        let f = enable_on_install_function();
        assert_eq!(f.action_id.as_str(), ENABLE_ON_INSTALL_ACTION);
        assert_eq!(f.function_ids, [ENABLE_ON_INSTALL_ACTION]);
    }
}
