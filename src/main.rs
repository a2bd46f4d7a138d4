// SPDX-License-Identifier: GPL-3.0-only

//! Floatboard command-line tool
//!
//! Loads a keyboard layout template, scales it to a target width and prints
//! the resulting key geometry as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use floatboard::config::Config;
use floatboard::layout::load_layout;
use floatboard::scaling::{ScalePolicy, analysis};

/// Scale a keyboard layout template to a target width.
#[derive(Debug, Parser)]
#[command(name = "floatboard", version)]
struct Cli {
    /// Template file path, or builtin:NAME for an embedded template
    layout: String,

    /// Target width in pixels
    target_width: i32,

    /// Hide the language-switch key after scaling
    #[arg(long = "hide-language-switch")]
    hide_language_switch: bool,

    /// Skip gap distribution and only multiply key geometry
    #[arg(long)]
    naive: bool,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging on stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("floatboard=info".parse::<tracing_subscriber::filter::Directive>()?),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => Config::default(),
    };

    let parsed = load_layout(&cli.layout).with_context(|| format!("load layout {}", cli.layout))?;
    for warning in &parsed.warnings {
        tracing::warn!("{}", warning);
    }
    let template = parsed.layout;

    let mut scaler = config.scaler();
    if cli.naive {
        scaler = scaler.with_policy(ScalePolicy::Naive);
    }

    let mut scaled = scaler
        .scale(&template, cli.target_width)
        .with_context(|| format!("scale {} to {}", template.id, cli.target_width))?;
    tracing::info!(
        layout = %template.id,
        from = template.total_width,
        to = scaled.target_width(),
        factor = scaled.factor(),
        policy = %scaled.policy(),
        "scaled layout"
    );

    if cli.hide_language_switch {
        let outcome = scaled.set_language_switch_visibility(false);
        tracing::info!(?outcome, "language switch hidden");
    }

    analysis::log_gap_report(scaled.layout(), "output");

    let json = serde_json::to_string_pretty(scaled.layout()).context("serialize scaled layout")?;
    println!("{}", json);
    Ok(())
}
