//! Cardstyles compiled into the binary.
//!
//! Embedded files are addressed by their path under `cardstyles/`, e.g.
//! `mtg/default.yaml`. Templates loaded from here get a `template_dir` of
//! `builtin/<tcg>`, and asset paths starting with `builtin/` are served
//! from the same tree.

use include_dir::{Dir, include_dir};

/// Embedded cardstyle tree.
static BUILTIN: Dir = include_dir!("$CARGO_MANIFEST_DIR/cardstyles");

/// Path prefix that addresses the embedded tree.
pub const BUILTIN_PREFIX: &str = "builtin";

const EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Raw bytes of an embedded file. Accepts paths with or without the
/// `builtin/` prefix.
pub fn builtin_bytes(path: &str) -> Option<&'static [u8]> {
    let path = strip_prefix(path);
    BUILTIN.get_file(path).map(|f| f.contents())
}

pub(crate) fn read_text(path: &str) -> Option<&'static str> {
    BUILTIN.get_file(strip_prefix(path))?.contents_utf8()
}

/// Embedded path of `<tcg>/<style>.{yaml,yml}`, if present.
pub(crate) fn find(tcg: &str, style: &str) -> Option<String> {
    EXTENSIONS
        .iter()
        .map(|ext| format!("{}/{}.{}", tcg, style, ext))
        .find(|p| BUILTIN.get_file(p).is_some())
}

/// Resolve `reference` against an embedded directory, trying the template
/// extensions when the reference has none.
pub(crate) fn find_relative(dir: &str, reference: &str) -> Option<String> {
    let joined = normalize(strip_prefix(dir), strip_prefix(reference))?;
    if BUILTIN.get_file(&joined).is_some() {
        return Some(joined);
    }
    EXTENSIONS
        .iter()
        .map(|ext| format!("{}.{}", joined, ext))
        .find(|p| BUILTIN.get_file(p).is_some())
}

/// `builtin/`-prefixed path of an embedded asset relative to `dir`, if present.
pub(crate) fn asset_path(dir: &str, reference: &str) -> Option<String> {
    let joined = normalize(strip_prefix(dir), strip_prefix(reference))?;
    BUILTIN
        .get_file(&joined)
        .map(|_| format!("{}/{}", BUILTIN_PREFIX, joined))
}

/// Every embedded cardstyle as `(tcg, style, path)`, sorted.
pub(crate) fn entries() -> Vec<(String, String, String)> {
    let mut out = Vec::new();
    for tcg_dir in BUILTIN.dirs() {
        let Some(tcg) = tcg_dir.path().file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        for file in tcg_dir.files() {
            let path = file.path();
            let is_template = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.contains(&e));
            if !is_template {
                continue;
            }
            if let (Some(style), Some(full)) =
                (path.file_stem().and_then(|s| s.to_str()), path.to_str())
            {
                out.push((tcg.to_string(), style.to_string(), full.replace('\\', "/")));
            }
        }
    }
    out.sort();
    out
}

fn strip_prefix(path: &str) -> &str {
    match path.strip_prefix(BUILTIN_PREFIX) {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => path,
    }
}

/// Join `reference` onto `dir` resolving `.` and `..`; `None` if it escapes the root.
fn normalize(dir: &str, reference: &str) -> Option<String> {
    let mut parts: Vec<&str> = if reference.starts_with('/') {
        Vec::new()
    } else {
        dir.split('/').filter(|p| !p.is_empty()).collect()
    };
    for part in reference.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            p => parts.push(p),
        }
    }
    Some(parts.join("/"))
}
