use crate::error::Result;
use crate::ident::DottedId;
use crate::paths;
use indexmap::IndexMap;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Action id to the custom function names already implemented for it.
pub type Implemented = IndexMap<DottedId, Vec<String>>;

static ENTRY_RE: OnceLock<Regex> = OnceLock::new();

fn entry_re() -> &'static Regex {
    ENTRY_RE.get_or_init(|| {
        Regex::new(r#"['"]([^'"]+)['"]\s*:\s*\{\s*actionName\s*:\s*['"]([^'"]+)['"]"#).unwrap()
    })
}

/// Read the generated domain manifests under `assets/src/manifests/`.
pub fn detect_implemented(root: &Path) -> Result<Implemented> {
    let dir = paths::manifests_dir(root);
    let mut implemented = Implemented::new();
    if !dir.is_dir() {
        return Ok(implemented);
    }

    let mut files: Vec<_> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "js"))
        .collect();
    files.sort();

    for file in files {
        let source = std::fs::read_to_string(&file)?;
        parse_manifest(&source, &mut implemented);
    }
    debug!(actions = implemented.len(), "detected implemented actions");
    Ok(implemented)
}

fn parse_manifest(source: &str, into: &mut Implemented) {
    for caps in entry_re().captures_iter(source) {
        let function = caps[1].to_string();
        let functions = into.entry(DottedId::new(&caps[2])).or_default();
        if !functions.contains(&function) {
            functions.push(function);
        }
    }
}
