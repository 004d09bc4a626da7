use crate::Result;
use std::fs::File;
use std::path::Path;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

pub const LOG_FILE: &str = "cloudapi.log";

/// Installs the global subscriber, writing JSON lines to `dir/cloudapi.log`.
///
/// Terminal output is left alone; everything the user is meant to read is
/// printed by the commands themselves.
pub fn system_logger(dir: &Path, log_level: &str) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let file = File::create(dir.join(LOG_FILE))?;

    let file_layer = Layer::new()
        .json()
        .with_writer(file)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    let filter_layer = EnvFilter::new(log_level);

    let subscriber = Registry::default().with(file_layer).with(filter_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!("Tracing set up.");

    Ok(())
}
