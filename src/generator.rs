//! Card generation pipeline.
//!
//! For each input file: parse → resolve cardstyle → validate → render → save
//! as `<output_dir>/<stem>.png`. The output directory is relative to the
//! input file's directory unless absolute.
//!
//! Batches render cards in parallel with rayon. A failing card is logged
//! and counted; it never stops the rest of the batch.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::card::parse_file;
use crate::cardstyle::{Resolver, SearchPaths, validate_card};
use crate::error::{CardgenError, Result};
use crate::render::{CardRenderer, RenderContext};

/// Default output directory name, created next to each input file.
pub const DEFAULT_OUTPUT_DIR: &str = ".cardgen-out";

/// Generator settings, usually built from CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Legacy custom cardstyle directory (`--template-dir`).
    pub template_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Stop after validation; write nothing.
    pub validate_only: bool,
    /// Worker threads for batches; `None` uses rayon's default.
    pub jobs: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            template_dir: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            validate_only: false,
            jobs: None,
        }
    }
}

/// Result of processing one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Validated,
    Rendered(PathBuf),
}

/// Per-file results of a batch run, in input order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub successes: Vec<(PathBuf, Outcome)>,
    pub failures: Vec<(PathBuf, CardgenError)>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.successes.len()
    }

    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the resolver and render caches shared by every card in a run.
pub struct Generator {
    config: GeneratorConfig,
    resolver: Resolver,
    ctx: RenderContext,
}

impl Generator {
    /// Generator over the standard search tiers, with network access.
    pub fn new(config: GeneratorConfig) -> Self {
        let resolver = Resolver::new(SearchPaths::standard(config.template_dir.clone()));
        Self::with_parts(config, resolver, RenderContext::new())
    }

    pub fn with_parts(config: GeneratorConfig, resolver: Resolver, ctx: RenderContext) -> Self {
        Self {
            config,
            resolver,
            ctx,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Where the PNG for `input` is written.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let dir = if self.config.output_dir.is_absolute() {
            self.config.output_dir.clone()
        } else {
            input
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(&self.config.output_dir)
        };
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "card".to_string());
        dir.join(format!("{}.png", stem))
    }

    /// Process a single card file.
    pub fn generate_card(&self, path: &Path) -> Result<Outcome> {
        let card = parse_file(path)?;

        let template = self.resolver.resolve(&card.tcg, &card.cardstyle)?;
        validate_card(&card, &template)?;

        if self.config.validate_only {
            tracing::info!(path = %path.display(), "card is valid");
            return Ok(Outcome::Validated);
        }

        let rendered = CardRenderer::new(&self.ctx).render(&card, &template)?;

        let out = self.output_path(path);
        if let Some(dir) = out.parent() {
            std::fs::create_dir_all(dir)?;
        }
        rendered
            .image
            .save(&out)
            .map_err(|e| CardgenError::Image(format!("Failed to save {}: {}", out.display(), e)))?;

        tracing::info!(input = %path.display(), output = %out.display(), "generated card");
        Ok(Outcome::Rendered(out))
    }

    /// Process every input, in parallel, collecting failures.
    pub fn run_batch(&self, inputs: &[PathBuf]) -> BatchSummary {
        match self.config.jobs {
            Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(|| self.process_all(inputs)),
                Err(e) => {
                    tracing::warn!(error = %e, jobs = n, "could not build worker pool, using default");
                    self.process_all(inputs)
                }
            },
            None => self.process_all(inputs),
        }
    }

    fn process_all(&self, inputs: &[PathBuf]) -> BatchSummary {
        let results: Vec<(PathBuf, Result<Outcome>)> = inputs
            .par_iter()
            .map(|path| (path.clone(), self.generate_card(path)))
            .collect();

        let mut summary = BatchSummary::default();
        for (path, result) in results {
            match result {
                Ok(outcome) => summary.successes.push((path, outcome)),
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "card failed");
                    summary.failures.push((path, e));
                }
            }
        }
        summary
    }
}

/// Card files to process: `path` itself, or every `.md` file below it.
///
/// Directory results are sorted so batches are reproducible. Output
/// directories are never descended into.
pub fn collect_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    let meta = std::fs::metadata(path)?;
    if !meta.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut out = Vec::new();
    walk(path, &mut out)?;
    out.sort();
    Ok(out)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            if path.file_name().is_some_and(|n| n == DEFAULT_OUTPUT_DIR) {
                continue;
            }
            walk(&path, out)?;
        } else if path.extension().is_some_and(|e| e == "md") {
            out.push(path);
        }
    }
    Ok(())
}
