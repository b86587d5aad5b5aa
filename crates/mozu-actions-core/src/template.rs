//! Path expansion for generated files.
//!
//! Path templates name their variables as `{name}`. After substitution every
//! `/`-separated segment is un-escaped, so callers hand in [`EscapedId`]s and
//! dotted identifiers come out intact in the final file name.
//!
//! File bodies use `{{name}}` placeholders and go through [`fill`].

use crate::ident::{EscapedId, ESCAPE_MARKER};
use std::path::{Path, PathBuf};

pub fn render_path(root: &Path, template: &str, vars: &[(&str, &EscapedId)]) -> PathBuf {
    let mut rendered = template.to_string();
    for (name, value) in vars {
        rendered = rendered.replace(&format!("{{{name}}}"), value.as_str());
    }
    rendered
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| {
            path.join(segment.replace(ESCAPE_MARKER, "."))
        })
}

/// Substitute `{{key}}` placeholders. Unknown placeholders are left as-is.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |out, (key, value)| {
        out.replace(&format!("{{{{{key}}}}}"), value)
    })
}
