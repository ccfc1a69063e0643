//! staticmap: print a static-map request URL for a geometry file.
//!
//! Reads geometries grouped by kind from JSON, applies a map
//! configuration (styles, path style, simplification options, API key)
//! and prints the assembled request.
//!
//! # Usage
//!
//! ```text
//! cargo run --bin staticmap -- [OPTIONS] <GEOMETRY_JSON>
//! ```
//!
//! where `GEOMETRY_JSON` looks like
//!
//! ```json
//! { "markers": [[45, -73]], "polylines": [[[45, -73], [45.1, -73.2]]] }
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use staticmap_core::{GeometryKind, MapConfig, MapRequest, RawGeometry, RequestBuilder};
use tracing_subscriber::EnvFilter;

/// Assemble a static-map request URL from geometries and a style sheet.
#[derive(Parser)]
#[command(name = "staticmap", version)]
struct Cli {
    /// Geometry JSON file, or `-` to read from stdin.
    geometry: PathBuf,

    /// Map configuration JSON file (key, baseUrl, styles, pathStyle,
    /// simplification). Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Full map configuration as a JSON string. Takes precedence over
    /// `--config`.
    #[arg(long)]
    config_json: Option<String>,

    /// API key, overriding the configuration.
    #[arg(long)]
    key: Option<String>,

    /// Endpoint prefix including the trailing `?`, overriding the
    /// configuration.
    #[arg(long)]
    base_url: Option<String>,

    /// Cumulative turning angle (degrees) that keeps a vertex.
    #[arg(long)]
    angle_threshold: Option<f64>,

    /// Minimum turn (degrees) for an intermediate vertex to survive.
    #[arg(long)]
    subdivision_threshold: Option<f64>,

    /// Tenths of intermediate vertices considered per triggered segment.
    #[arg(long)]
    precision: Option<f64>,

    /// Maximum intermediate vertices kept per triggered segment.
    #[arg(long)]
    max_subdivision: Option<usize>,

    /// Explicit identifier instead of the URL hash.
    #[arg(long)]
    ident: Option<String>,

    /// Print `{"url": ..., "ident": ...}` instead of the bare URL.
    #[arg(long)]
    json: bool,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(short, long)]
    verbose: bool,
}

/// JSON output shape for `--json`.
#[derive(Serialize)]
struct Output<'a> {
    url: &'a str,
    ident: &'a str,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = config_from_cli(cli)?;
    let text = read_input(&cli.geometry)?;
    let groups = parse_geometries(&text)?;

    let mut builder = RequestBuilder::new(&config).context("invalid map configuration")?;
    builder
        .set_geometries(groups)
        .context("invalid geometry input")?;
    let request: MapRequest = builder
        .build_with_ident(cli.ident.clone())
        .context("failed to build request")?;

    if cli.json {
        let output = Output {
            url: request.url(),
            ident: request.ident(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", request.url());
    }
    Ok(())
}

/// Install a compact stderr subscriber filtered by `RUST_LOG`.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Build a [`MapConfig`] from the config source plus CLI overrides.
fn config_from_cli(cli: &Cli) -> anyhow::Result<MapConfig> {
    let mut config: MapConfig = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).context("error parsing --config-json")?
    } else if let Some(ref path) = cli.config {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("error reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("error parsing {}", path.display()))?
    } else {
        MapConfig::default()
    };

    if let Some(ref key) = cli.key {
        config.key.clone_from(key);
    }
    if let Some(ref base_url) = cli.base_url {
        config.base_url.clone_from(base_url);
    }

    let options = &mut config.simplification;
    if let Some(value) = cli.angle_threshold {
        options.angle_threshold = value;
    }
    if let Some(value) = cli.subdivision_threshold {
        options.subdivision_threshold = value;
    }
    if let Some(value) = cli.precision {
        options.precision = value;
    }
    if let Some(value) = cli.max_subdivision {
        options.max_subdivision = value;
    }

    tracing::debug!(?config, "resolved map configuration");
    Ok(config)
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("error reading stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("error reading {}", path.display()))
}

/// Parse a geometry document into `(kind name, items)` groups, in file
/// order.
///
/// Groups under unrecognized names are dropped without inspecting their
/// contents.
fn parse_geometries(text: &str) -> anyhow::Result<Vec<(String, Vec<RawGeometry>)>> {
    let document: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(text).context("geometry input must be a JSON object")?;

    let mut groups = Vec::with_capacity(document.len());
    for (name, value) in document {
        if GeometryKind::from_name(&name).is_none() {
            tracing::warn!(kind = %name, "skipping unrecognized geometry kind");
            continue;
        }
        let items: Vec<RawGeometry> = serde_json::from_value(value)
            .with_context(|| format!("\"{name}\" must be an array of coordinate arrays"))?;
        groups.push((name, items));
    }
    Ok(groups)
}
