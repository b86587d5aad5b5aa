use crate::error::ScaffoldError;
use std::fmt;
use std::str::FromStr;

/// Dev-dependencies every generated project needs regardless of framework.
pub const BASE_DEV_DEPENDENCIES: &[&str] = &["mozu-action-helpers", "mozu-action-simulator"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestFramework {
    Mocha,
    Manual,
}

impl TestFramework {
    pub fn all() -> &'static [TestFramework] {
        &[TestFramework::Mocha, TestFramework::Manual]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TestFramework::Mocha => "mocha",
            TestFramework::Manual => "manual",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TestFramework::Mocha => "Mocha",
            TestFramework::Manual => "None/Manual",
        }
    }

    pub fn writes_tests(self) -> bool {
        self != TestFramework::Manual
    }

    pub fn dev_dependencies(self) -> &'static [&'static str] {
        match self {
            TestFramework::Mocha => &["mocha"],
            TestFramework::Manual => &[],
        }
    }

    /// `scripts.test` entry for package.json.
    pub fn test_script(self) -> Option<&'static str> {
        match self {
            TestFramework::Mocha => Some("mocha assets/test"),
            TestFramework::Manual => None,
        }
    }
}

impl fmt::Display for TestFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestFramework {
    type Err = ScaffoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mocha" => Ok(TestFramework::Mocha),
            "manual" => Ok(TestFramework::Manual),
            _ => Err(ScaffoldError::UnsupportedTestFramework(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_frameworks() {
        for fw in TestFramework::all() {
            assert_eq!(fw.as_str().parse::<TestFramework>().unwrap(), *fw);
        }
    }

    #[test]
    fn rejects_unsupported() {
        let err = "nodeunit".parse::<TestFramework>().unwrap_err();
        assert!(matches!(err, ScaffoldError::UnsupportedTestFramework(ref f) if f == "nodeunit"));
    }

    #[test]
    fn manual_writes_no_tests() {
        assert!(!TestFramework::Manual.writes_tests());
        assert!(TestFramework::Manual.dev_dependencies().is_empty());
        assert!(TestFramework::Mocha.writes_tests());
    }
}
