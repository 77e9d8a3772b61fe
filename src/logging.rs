use anyhow::{Context, Result};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    fmt::{format::FmtSpan, Layer},
    prelude::*,
};

use crate::Args;

pub fn init(args: &Args) -> Result<()> {
    let filter = level_filter(&args.log_level)?;

    // Span close events carry the request_id and handler timing.
    let layer = Layer::default().with_span_events(FmtSpan::CLOSE);
    let layer = match args.json {
        true => layer.json().with_filter(filter).boxed(),
        false => layer.with_filter(filter).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .context("A global tracing subscriber is already installed")
}

fn level_filter(log_level: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(log_level.trim())
        .with_context(|| format!("Unknown log level \"{log_level}\""))
}
