//! Cardstyle lookup across the search tiers, `extends` resolution and caching.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use super::builtin::{self, BUILTIN_PREFIX};
use super::merge::merge;
use super::Template;
use crate::error::{CardgenError, Result};

/// Longest `extends` chain accepted before the resolver reports a cycle.
pub const MAX_EXTENDS_DEPTH: usize = 32;

const EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Where the resolver looks for cardstyles, highest priority first.
#[derive(Debug, Clone, Default)]
pub struct SearchPaths {
    /// Project-local root, laid out as `<tcg>/<style>.yaml`.
    pub workspace: Option<PathBuf>,
    /// Per-user root. Holds `<tcg>/<style>.yaml` plus flat `<style>.yaml`
    /// files whose declared `tcg` must match.
    pub user: Option<PathBuf>,
    /// Extra directory from the command line, laid out like the workspace.
    pub legacy: Option<PathBuf>,
    /// Fall back to the cardstyles compiled into the binary.
    pub embedded: bool,
}

impl SearchPaths {
    /// `templates/` in the working directory, `~/.cardgen/cardstyles`, the
    /// given legacy directory and the embedded cardstyles.
    pub fn standard(legacy: Option<PathBuf>) -> Self {
        Self {
            workspace: Some(PathBuf::from("templates")),
            user: dirs::home_dir().map(|home| home.join(".cardgen").join("cardstyles")),
            legacy,
            embedded: true,
        }
    }

    /// Only the embedded cardstyles.
    pub fn embedded_only() -> Self {
        Self {
            embedded: true,
            ..Default::default()
        }
    }
}

/// Where a template document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Origin {
    File(PathBuf),
    /// Path inside the embedded tree, e.g. `mtg/base.yaml`.
    Embedded(String),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::File(path) => write!(f, "{}", path.display()),
            Origin::Embedded(path) => write!(f, "{}/{}", BUILTIN_PREFIX, path),
        }
    }
}

/// Read a single template document without following `extends`.
pub(super) fn read_origin(origin: &Origin) -> Result<Template> {
    match origin {
        Origin::File(path) => {
            let text = std::fs::read_to_string(path)?;
            let mut template = Template::from_yaml(&text, &origin.to_string())?;
            template.template_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            Ok(template)
        }
        Origin::Embedded(path) => {
            let text = builtin::read_text(path).ok_or_else(|| CardgenError::TemplateParse {
                origin: origin.to_string(),
                message: "embedded file is missing or not UTF-8".to_string(),
            })?;
            let mut template = Template::from_yaml(text, &origin.to_string())?;
            let dir = path.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
            template.template_dir = Path::new(BUILTIN_PREFIX).join(dir);
            Ok(template)
        }
    }
}

/// `<dir>/<style>.yaml` or `.yml`, whichever exists first.
pub(super) fn file_candidate(dir: &Path, style: &str) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", style, ext)))
        .find(|p| p.is_file())
}

/// The path itself, or the path with a template extension appended.
fn with_extensions(base: &Path) -> Option<PathBuf> {
    // Drop `.` components so the same file always has the same origin.
    let base: PathBuf = base
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let base = base.as_path();
    if base.is_file() {
        return Some(base.to_path_buf());
    }
    if base.extension().is_some_and(|e| EXTENSIONS.iter().any(|x| e == *x)) {
        return None;
    }
    EXTENSIONS
        .iter()
        .map(|ext| {
            let mut s = base.as_os_str().to_owned();
            s.push(".");
            s.push(ext);
            PathBuf::from(s)
        })
        .find(|p| p.is_file())
}

/// Finds, merges and caches cardstyles.
///
/// One resolver is meant to live for the whole run; resolved templates are
/// cached by `(tcg, style)` and never invalidated.
pub struct Resolver {
    paths: SearchPaths,
    cache: RwLock<HashMap<(String, String), Arc<Template>>>,
}

impl Resolver {
    pub fn new(paths: SearchPaths) -> Self {
        Self {
            paths,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn paths(&self) -> &SearchPaths {
        &self.paths
    }

    /// Resolve a cardstyle to a fully merged template.
    pub fn resolve(&self, tcg: &str, style: &str) -> Result<Arc<Template>> {
        let key = (tcg.to_string(), style.to_string());
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            tracing::trace!(tcg, style, "cardstyle cache hit");
            return Ok(Arc::clone(hit));
        }

        let origin = self
            .locate(tcg, style)?
            .ok_or_else(|| CardgenError::CardstyleNotFound {
                tcg: tcg.to_string(),
                style: style.to_string(),
            })?;
        tracing::debug!(tcg, style, origin = %origin, "loading cardstyle");

        let template = self.load(origin, tcg, &mut Vec::new())?;
        template.check()?;

        // Racing loads of the same key are harmless: both produce the same template.
        let template = Arc::new(template);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&template));
        Ok(template)
    }

    /// First tier holding `tcg/style`.
    fn locate(&self, tcg: &str, style: &str) -> Result<Option<Origin>> {
        if let Some(root) = &self.paths.workspace
            && let Some(path) = file_candidate(&root.join(tcg), style)
        {
            return Ok(Some(Origin::File(path)));
        }

        if let Some(root) = &self.paths.user {
            if let Some(path) = file_candidate(&root.join(tcg), style) {
                return Ok(Some(Origin::File(path)));
            }
            if let Some(path) = file_candidate(root, style) {
                let origin = Origin::File(path);
                let declared = read_origin(&origin)?.tcg;
                if declared == tcg {
                    return Ok(Some(origin));
                }
                tracing::debug!(origin = %origin, declared = %declared, wanted = tcg, "skipping flat cardstyle for another TCG");
            }
        }

        if let Some(root) = &self.paths.legacy
            && let Some(path) = file_candidate(&root.join(tcg), style)
        {
            return Ok(Some(Origin::File(path)));
        }

        if self.paths.embedded
            && let Some(path) = builtin::find(tcg, style)
        {
            return Ok(Some(Origin::Embedded(path)));
        }

        Ok(None)
    }

    /// Load `origin` and, recursively, its base chain.
    fn load(&self, origin: Origin, tcg: &str, chain: &mut Vec<String>) -> Result<Template> {
        let id = origin.to_string();
        if chain.contains(&id) || chain.len() >= MAX_EXTENDS_DEPTH {
            chain.push(id);
            return Err(CardgenError::CyclicTemplate {
                chain: chain.join(" -> "),
            });
        }
        chain.push(id);

        let template = read_origin(&origin)?;
        let Some(reference) = template
            .extends
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
        else {
            return Ok(template);
        };

        let family = if template.tcg.is_empty() {
            tcg
        } else {
            template.tcg.as_str()
        };
        let base_origin = self.locate_extends(reference, &origin, family)?;
        tracing::debug!(template = %origin, base = %base_origin, "following extends");

        let base = self.load(base_origin, tcg, chain)?;
        Ok(merge(&base, &template))
    }

    /// Resolve an `extends` reference: a path relative to the referencing
    /// template first, then a logical `tcg/style` or `style` name.
    fn locate_extends(&self, reference: &str, current: &Origin, tcg: &str) -> Result<Origin> {
        if reference.starts_with(BUILTIN_PREFIX)
            && let Some(path) = builtin::find_relative("", reference)
        {
            return Ok(Origin::Embedded(path));
        }

        match current {
            Origin::File(path) => {
                let reference_path = Path::new(reference);
                let base = if reference_path.is_absolute() {
                    reference_path.to_path_buf()
                } else {
                    path.parent().unwrap_or(Path::new(".")).join(reference_path)
                };
                if let Some(found) = with_extensions(&base) {
                    return Ok(Origin::File(found));
                }
            }
            Origin::Embedded(path) => {
                let dir = path.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
                if let Some(found) = builtin::find_relative(dir, reference) {
                    return Ok(Origin::Embedded(found));
                }
            }
        }

        let logical = reference.trim_start_matches("./");
        let logical = EXTENSIONS
            .iter()
            .find_map(|ext| logical.strip_suffix(&format!(".{}", ext)))
            .unwrap_or(logical);
        let (family, style) = match logical.split_once('/') {
            Some((family, style)) if !family.is_empty() && !style.contains('/') => (family, style),
            _ => (tcg, logical),
        };

        match self.locate(family, style)? {
            Some(origin) => Ok(origin),
            None => Err(CardgenError::BaseTemplateNotFound {
                reference: reference.to_string(),
                source: Box::new(CardgenError::CardstyleNotFound {
                    tcg: family.to_string(),
                    style: style.to_string(),
                }),
            }),
        }
    }
}
