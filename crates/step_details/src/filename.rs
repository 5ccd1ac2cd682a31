/// File extensions a pipeline step may point at.
pub const ALLOWED_STEP_EXTENSIONS: &[&str] = &["ipynb", "py", "R", "sh", "jl", "js"];

/// Everything after the last `.`, or an empty string when there is none.
pub fn extension_from_filename(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => "",
    }
}

/// Rule-based check run before asking whether a step file exists.
pub fn path_validator(path: &str) -> bool {
    if path.is_empty() || path.ends_with('/') {
        return false;
    }
    ALLOWED_STEP_EXTENSIONS.contains(&extension_from_filename(path))
}

/// Derive a file stem from a step title.
///
/// Lowercases, collapses anything outside `[a-z0-9_-]` into a single `_` and
/// trims separators from both ends.
pub fn to_valid_filename(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_separator = false;
    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(ch);
        } else {
            pending_separator = true;
        }
    }
    out.trim_matches(|c| c == '_' || c == '-').to_string()
}
