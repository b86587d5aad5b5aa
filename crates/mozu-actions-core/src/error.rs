use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("action catalog could not be loaded: {0}")]
    CatalogLoad(String),

    #[error("no domain found for action name '{0}'; it appears to be an invalid action")]
    UnknownAction(String),

    #[error("custom function names must be unique; duplicated: {}", .0.join(", "))]
    DuplicateFunctionName(Vec<String>),

    #[error("unsupported test framework '{0}'; supported: mocha, manual")]
    UnsupportedTestFramework(String),

    #[error("no prior configuration found in {0}; run again without --skip-prompts")]
    NoPriorConfiguration(String),

    #[error("invalid version '{0}': expected <major>.<minor>.<patch>[-annotation]")]
    InvalidVersion(String),

    #[error("invalid answer for '{question}': {message}")]
    InvalidAnswer { question: String, message: String },

    #[error("{program} failed: {message}")]
    ExternalCommand { program: String, message: String },

    #[error("missing project {0}")]
    MissingProjectField(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ScaffoldError>;
