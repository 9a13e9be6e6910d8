//! certigrade CLI — classify one certificate document into a credibility
//! verdict
//!
//! Exit code 0 covers every successful classification, including Fake and
//! Unrated outcomes — those are valid results, not failures. Non-zero means
//! the input could not be classified at all (extraction, input, or
//! configuration failure).

use anyhow::{Context, Result};
use certigrade::{
    report, CertigradeEngine, EngineConfig, InputSource, PlainTextExtractor, ReferenceData, Signal,
    StructuralSignals,
};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "certigrade", version, about = "Certificate credibility classifier")]
struct Cli {
    /// Certificate input: a text file path, or '-' for stdin
    #[arg(short, long)]
    input: String,

    /// Issuer registry + skill taxonomy TOML (built-in defaults when omitted)
    #[arg(long, env = "CERTIGRADE_REGISTRY")]
    registry: Option<PathBuf>,

    /// Engine configuration TOML: weights, thresholds, limits
    #[arg(long, env = "CERTIGRADE_CONFIG")]
    config: Option<PathBuf>,

    /// Signature-presence confidence from an external detector (0.0–1.0)
    #[arg(long)]
    signature: Option<f64>,

    /// Design-marker confidence from an external detector (0.0–1.0)
    #[arg(long)]
    design_marker: Option<f64>,

    /// Write the result document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON document
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let data = match &cli.registry {
        Some(path) => ReferenceData::from_toml_file(path)
            .with_context(|| format!("loading registry {}", path.display()))?,
        None => ReferenceData::builtin(),
    };
    let config = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let engine = CertigradeEngine::new(config, &data).context("engine startup")?;

    let input = if cli.input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        InputSource::Text(text)
    } else {
        InputSource::Path(PathBuf::from(&cli.input))
    };

    // Detector readings, when the caller has them; the engine falls back to
    // text-derived signals otherwise
    let signals = match (cli.signature, cli.design_marker) {
        (None, None) => None,
        (signature, design_marker) => Some(StructuralSignals::new(
            signature.map_or_else(Signal::absent, Signal::detected),
            design_marker.map_or_else(Signal::absent, Signal::detected),
        )),
    };

    let result = engine
        .classify_input(Arc::new(PlainTextExtractor), input, signals)
        .await
        .with_context(|| format!("classifying {}", cli.input))?;

    let document = if cli.pretty {
        report::json::render_pretty(&result)?
    } else {
        report::json::render(&result)?
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &document)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "result written");
        }
        None => println!("{document}"),
    }

    Ok(())
}
