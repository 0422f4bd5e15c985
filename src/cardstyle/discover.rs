//! Enumerating every cardstyle the resolver can see.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::builtin;
use super::resolve::{Origin, Resolver, read_origin};

/// Search tier a cardstyle was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardstyleSource {
    Workspace,
    User,
    Legacy,
    Embedded,
}

impl CardstyleSource {
    pub fn label(self) -> &'static str {
        match self {
            CardstyleSource::Workspace => "workspace",
            CardstyleSource::User => "user",
            CardstyleSource::Legacy => "legacy",
            CardstyleSource::Embedded => "embedded",
        }
    }
}

/// Summary of a discoverable cardstyle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardstyleInfo {
    pub tcg: String,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    pub source: CardstyleSource,
    /// File path for on-disk cardstyles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Resolver {
    /// Every `(tcg, name)` pair across the search tiers in priority order.
    /// When a pair exists in several tiers only the winning one is listed.
    pub fn list_cardstyles(&self) -> Vec<CardstyleInfo> {
        let paths = self.paths();
        let mut found = Vec::new();

        if let Some(root) = &paths.workspace {
            found.extend(scan_tree(root, CardstyleSource::Workspace));
        }
        if let Some(root) = &paths.user {
            found.extend(scan_tree(root, CardstyleSource::User));
            found.extend(scan_flat(root));
        }
        if let Some(root) = &paths.legacy {
            found.extend(scan_tree(root, CardstyleSource::Legacy));
        }
        if paths.embedded {
            found.extend(
                builtin::entries()
                    .into_iter()
                    .filter_map(|(tcg, name, path)| {
                        describe(Origin::Embedded(path), tcg, name, CardstyleSource::Embedded)
                    }),
            );
        }

        let mut seen = HashSet::new();
        found.retain(|info| seen.insert((info.tcg.clone(), info.name.clone())));
        found
    }
}

/// `<root>/<tcg>/<style>.yaml` files.
fn scan_tree(root: &Path, source: CardstyleSource) -> Vec<CardstyleInfo> {
    let mut out = Vec::new();
    for tcg_dir in sorted_entries(root).into_iter().filter(|p| p.is_dir()) {
        let Some(tcg) = file_name(&tcg_dir) else {
            continue;
        };
        for file in sorted_entries(&tcg_dir).into_iter().filter(|p| is_template_file(p)) {
            if let Some(style) = file_stem(&file)
                && let Some(info) = describe(Origin::File(file), tcg.clone(), style, source)
            {
                out.push(info);
            }
        }
    }
    out
}

/// Flat `<root>/<style>.yaml` files; the TCG comes from the document.
fn scan_flat(root: &Path) -> Vec<CardstyleInfo> {
    sorted_entries(root)
        .into_iter()
        .filter(|p| is_template_file(p))
        .filter_map(|file| {
            let style = file_stem(&file)?;
            let origin = Origin::File(file);
            let tcg = match read_origin(&origin) {
                Ok(t) if !t.tcg.is_empty() => t.tcg,
                Ok(_) => {
                    tracing::warn!(path = %origin, "flat cardstyle has no tcg, skipping");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(path = %origin, error = %e, "unreadable cardstyle, skipping");
                    return None;
                }
            };
            describe(origin, tcg, style, CardstyleSource::User)
        })
        .collect()
}

fn describe(origin: Origin, tcg: String, name: String, source: CardstyleSource) -> Option<CardstyleInfo> {
    let template = match read_origin(&origin) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(path = %origin, error = %e, "unreadable cardstyle, skipping");
            return None;
        }
    };
    let embedded = source == CardstyleSource::Embedded;

    let display_name = if template.name.is_empty() {
        format!("{} {}", tcg.to_uppercase(), capitalize(&name))
    } else {
        template.name
    };
    let description = match (template.description.is_empty(), embedded) {
        (false, _) => template.description,
        (true, true) => format!("Built-in {} {} cardstyle", tcg.to_uppercase(), name),
        (true, false) => String::new(),
    };
    let version = match (template.version.is_empty(), embedded) {
        (true, true) => "embedded".to_string(),
        _ => template.version,
    };
    let path = match origin {
        Origin::File(path) => Some(path),
        Origin::Embedded(_) => None,
    };

    Some(CardstyleInfo {
        tcg,
        name,
        display_name,
        description,
        version,
        extends: template.extends.filter(|e| !e.trim().is_empty()),
        source,
        path,
    })
}

fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();
    paths
}

fn is_template_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "yaml" || e == "yml")
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()?.to_str().map(str::to_string)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()?.to_str().map(str::to_string)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
