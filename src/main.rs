//! # cardgen CLI
//!
//! Command-line interface for rendering trading cards.
//!
//! ## Usage
//!
//! ```bash
//! # Render one card to cards/.cardgen-out/bolt.png
//! cardgen cards/bolt.md
//!
//! # Render every .md file under a directory, 4 at a time
//! cardgen --jobs 4 cards/
//!
//! # Check cards against their cardstyles without rendering
//! cardgen --validate-only cards/
//!
//! # Show every cardstyle the resolver can find
//! cardgen --list-templates
//! cardgen --list-templates --json
//! ```
//!
//! ## Verbosity
//!
//! | Flag(s)   | Filter level |
//! |-----------|--------------|
//! | (none)    | WARN         |
//! | `-v`      | INFO         |
//! | `-vv`     | DEBUG        |
//! | `-vvv`    | TRACE        |
//! | `--quiet` | ERROR        |
//!
//! `RUST_LOG` overrides all of the above if set.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cardgen::{
    CardgenError, Generator, GeneratorConfig,
    cardstyle::{CardstyleInfo, CardstyleSource},
    generator::{self, DEFAULT_OUTPUT_DIR, Outcome},
};

/// cardgen - Trading card image generator
#[derive(Parser, Debug)]
#[command(name = "cardgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Card file or directory of cards (searched recursively for .md files)
    #[arg(required_unless_present = "list_templates")]
    path: Option<PathBuf>,

    /// Validate cards without generating images
    #[arg(long)]
    validate_only: bool,

    /// Extra cardstyle directory, searched after the user directory
    #[arg(long, value_name = "DIR")]
    template_dir: Option<PathBuf>,

    /// Output directory, relative to each card's directory unless absolute
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// List available cardstyles and exit
    #[arg(long)]
    list_templates: bool,

    /// Print the cardstyle listing as JSON
    #[arg(long, requires = "list_templates")]
    json: bool,

    /// Number of cards rendered in parallel
    #[arg(long, short = 'j', value_name = "N")]
    jobs: Option<usize>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when some cards failed.
fn run() -> Result<bool, CardgenError> {
    let cli = Cli::parse();
    init_logging(&cli);

    let generator = Generator::new(GeneratorConfig {
        template_dir: cli.template_dir.clone(),
        output_dir: cli.output_dir.clone(),
        validate_only: cli.validate_only,
        jobs: cli.jobs,
    });

    if cli.list_templates {
        let styles = generator.resolver().list_cardstyles();
        if cli.json {
            let json = serde_json::to_string_pretty(&styles).map_err(std::io::Error::from)?;
            println!("{}", json);
        } else {
            print_listing(&styles);
        }
        return Ok(true);
    }

    let Some(path) = cli.path else {
        return Ok(true);
    };
    let inputs = generator::collect_inputs(&path)?;
    if inputs.is_empty() {
        println!("No .md files found in {}", path.display());
        return Ok(true);
    }

    let summary = generator.run_batch(&inputs);
    for (file, outcome) in &summary.successes {
        println!("{}", success_line(file, outcome));
    }
    for (file, err) in &summary.failures {
        eprintln!("Error: {}: {}", file.display(), err);
    }
    let verb = if cli.validate_only { "Validated" } else { "Generated" };
    println!(
        "{} {} of {} card(s){}",
        verb,
        summary.succeeded(),
        summary.total(),
        if summary.is_success() { "" } else { ", see errors above" }
    );
    Ok(summary.is_success())
}

fn success_line(file: &Path, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Validated => format!("✓ {} is valid", file.display()),
        Outcome::Rendered(out) => format!("Generated: {} -> {}", file.display(), out.display()),
    }
}

fn print_listing(styles: &[CardstyleInfo]) {
    if styles.is_empty() {
        println!("No cardstyles found.");
        return;
    }

    let mut by_tcg: BTreeMap<&str, Vec<&CardstyleInfo>> = BTreeMap::new();
    for style in styles {
        by_tcg.entry(style.tcg.as_str()).or_default().push(style);
    }

    println!("Available Cardstyles:");
    for (tcg, styles) in by_tcg {
        println!();
        println!("{}:", tcg.to_uppercase());
        for style in styles {
            print!("  {}/{}", tcg, style.name);
            if !style.display_name.is_empty() && style.display_name != style.name {
                print!(" ({})", style.display_name);
            }
            println!("  [{}]", style.source.label());
            if !style.description.is_empty() {
                println!("      {}", style.description);
            }
            if let Some(extends) = &style.extends {
                println!("      Extends: {}", extends);
            }
            if style.source != CardstyleSource::Embedded
                && let Some(path) = &style.path
            {
                println!("      Path: {}", path.display());
            }
        }
    }
}

/// Initialise the global tracing subscriber, writing to stderr.
fn init_logging(cli: &Cli) {
    let level = derive_level(cli.verbose, cli.quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cardgen={level}")));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    // Fails only if a subscriber is already set.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Translate the verbosity counter and quiet flag to a level string.
fn derive_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
