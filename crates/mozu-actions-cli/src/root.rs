use mozu_actions_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the project directory.
///
/// Priority:
/// 1. `--root` flag / `MOZU_ACTIONS_ROOT` env var (passed in as `explicit`)
/// 2. With `search_up`, the nearest ancestor of `cwd` holding `.mozu-actions.json`
/// 3. `cwd`
pub fn resolve_root(explicit: Option<&Path>, search_up: bool) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if search_up {
        if let Some(found) = find_project(&cwd) {
            return found;
        }
    }
    cwd
}

fn find_project(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| paths::config_path(dir).is_file())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()), true);
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_project_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".mozu-actions.json"), "{}").unwrap();
        let subdir = dir.path().join("assets/src/domains");
        std::fs::create_dir_all(&subdir).unwrap();

        assert_eq!(find_project(&subdir).as_deref(), Some(dir.path()));
    }

    #[test]
    fn no_project_marker_finds_nothing() {
        let dir = TempDir::new().unwrap();
        let subdir = dir.path().join("nested");
        std::fs::create_dir_all(&subdir).unwrap();
        // An ancestor outside the tempdir could carry a marker; only check
        // that the tempdir itself is never returned.
        assert_ne!(find_project(&subdir).as_deref(), Some(dir.path()));
    }
}
