use std::fs;
use std::path::Path;

use crate::models::{BuiltBatch, Config};

use anyhow::{Context, Result};
use tracing::info;

/// Reads a built viewing history from disk.
///
/// This is the only fatal input error: an unreadable file or a document that
/// is not a valid batch aborts the recap. Bad dates inside individual items
/// are left for the stats pass to skip.
pub fn read_built(path: &Path) -> Result<BuiltBatch> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let batch =
        parse_built(&data).with_context(|| format!("failed to load {}", path.display()))?;

    info!(
        path = %path.display(),
        items = batch.items.len(),
        source = batch.source.as_deref().unwrap_or(""),
        "loaded built history"
    );

    Ok(batch)
}

pub fn parse_built(data: &str) -> Result<BuiltBatch> {
    serde_json::from_str(data).context("invalid built json")
}

pub fn load_config(path: &Path) -> Config {
    if let Ok(data) = fs::read_to_string(path) {
        serde_json::from_str(&data).unwrap_or_default()
    } else {
        Config::default()
    }
}

pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config dir: {}", dir.display()))?;
    }
    let data = serde_json::to_string_pretty(config)?;
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Writes `contents` to `out`, or stdout when `out` is `-`.
pub fn write_output(out: &Path, contents: &str) -> Result<()> {
    if out == Path::new("-") {
        print!("{contents}");
        return Ok(());
    }
    fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}
