use crate::ident::DottedId;
use crate::template::render_path;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = ".mozu-actions.json";
pub const MANIFESTS_DIR: &str = "assets/src/manifests";

pub const ENTRY_FILE: &str = "assets/src/index.js";
pub const FUNCTIONS_MANIFEST: &str = "assets/functions.json";
pub const PACKAGE_JSON: &str = "package.json";
pub const README_MD: &str = "README.md";
pub const MOZU_CONFIG: &str = "mozu.config.json";

pub const MANIFEST_TEMPLATE: &str = "assets/src/manifests/{domain}.js";
pub const IMPLEMENTATION_TEMPLATE: &str = "assets/src/domains/{domain}/{function}.js";
pub const TEST_TEMPLATE: &str = "assets/test/{function}.t.js";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn manifests_dir(root: &Path) -> PathBuf {
    root.join(MANIFESTS_DIR)
}

pub fn domain_manifest(root: &Path, domain: &str) -> PathBuf {
    let domain = DottedId::new(domain).escape();
    render_path(root, MANIFEST_TEMPLATE, &[("domain", &domain)])
}

pub fn implementation_path(root: &Path, domain: &str, function: &str) -> PathBuf {
    let domain = DottedId::new(domain).escape();
    let function = DottedId::new(function).escape();
    render_path(
        root,
        IMPLEMENTATION_TEMPLATE,
        &[("domain", &domain), ("function", &function)],
    )
}

pub fn test_path(root: &Path, function: &str) -> PathBuf {
    let function = DottedId::new(function).escape();
    render_path(root, TEST_TEMPLATE, &[("function", &function)])
}

/// `root`-relative display form used in progress output.
pub fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

pub fn functions_manifest(root: &Path) -> PathBuf {
    root.join(FUNCTIONS_MANIFEST)
}

/// True when `root` or any ancestor holds a `.git` directory.
pub fn inside_git_repo(root: &Path) -> bool {
    root.ancestors().any(|dir| dir.join(".git").exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.mozu-actions.json")
        );
        assert_eq!(
            implementation_path(root, "platform.applications", "enable"),
            PathBuf::from("/tmp/proj/assets/src/domains/platform.applications/enable.js")
        );
        assert_eq!(
            domain_manifest(root, "commerce.carts"),
            PathBuf::from("/tmp/proj/assets/src/manifests/commerce.carts.js")
        );
        assert_eq!(
            test_path(root, "embedded.commerce.carts.addItem.before"),
            PathBuf::from("/tmp/proj/assets/test/embedded.commerce.carts.addItem.before.t.js")
        );
    }

    #[test]
    fn detects_git_in_ancestor() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        assert!(inside_git_repo(&nested));
    }
}
