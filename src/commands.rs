use std::path::Path;

use crate::models::{Config, OutputFormat};
use crate::{paths, report, stats, store};

use anyhow::{Result, bail};
use chrono::{Datelike, Local};
use colored::Colorize;

pub fn recap(input: &Path, year: Option<i32>, json: bool, out: &Path) -> Result<()> {
    let paths = paths::AppPaths::init()?;
    let cfg = store::load_config(&paths.config_file);

    let year = resolve_year(year)?;
    let batch = store::read_built(input)?;
    let stats = stats::compute(&batch, year);

    let format = if json { OutputFormat::Json } else { cfg.format };
    let rendered = match format {
        OutputFormat::Json => {
            let mut data = serde_json::to_string_pretty(&stats)?;
            data.push('\n');
            data
        }
        OutputFormat::Text => {
            // No escape codes in files
            if out != Path::new("-") {
                colored::control::set_override(false);
            }
            report::render_text(&stats, cfg.rows)
        }
    };

    store::write_output(out, &rendered)?;

    if out != Path::new("-") {
        eprintln!("{} {}", "Wrote:".green(), out.display());
    }

    Ok(())
}

/// Falls back to the current local year when no year is given.
fn resolve_year(year: Option<i32>) -> Result<i32> {
    match year {
        None => Ok(Local::now().year()),
        Some(y) if (1..=9999).contains(&y) => Ok(y),
        Some(y) => bail!("invalid year '{y}': expected YYYY"),
    }
}

pub fn config(key: &str, value: &str) -> Result<()> {
    let paths = paths::AppPaths::init()?;
    let mut cfg = store::load_config(&paths.config_file);

    apply_config(&mut cfg, key, value)?;

    store::save_config(&paths.config_file, &cfg)?;
    println!("{}", "Config updated.".green());
    Ok(())
}

fn apply_config(cfg: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "format" => match value.to_lowercase().as_str() {
            "text" => cfg.format = OutputFormat::Text,
            "json" => cfg.format = OutputFormat::Json,
            _ => bail!("invalid format '{value}': use 'text' or 'json'"),
        },
        "rows" => match value.parse::<usize>() {
            Ok(n) if n > 0 => cfg.rows = n,
            _ => bail!("invalid rows value '{value}': use a positive number"),
        },
        _ => bail!("unknown config key '{key}': available keys are 'format', 'rows'"),
    }
    Ok(())
}

pub fn info() -> Result<()> {
    let paths = paths::AppPaths::init()?;
    let cfg = store::load_config(&paths.config_file);

    println!("{}", "Settings".bold());
    println!("---------------");
    println!("Config: {}", paths.config_file.display());
    println!("Format: {:?}", cfg.format);
    println!("Rows:   {}", cfg.rows);

    let config_exists = paths.config_file.exists();
    println!("Config File Exists? {config_exists}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_year_defaults_to_current() {
        assert_eq!(resolve_year(None).unwrap(), Local::now().year());
    }

    #[test]
    fn resolve_year_accepts_explicit() {
        assert_eq!(resolve_year(Some(2023)).unwrap(), 2023);
    }

    #[test]
    fn resolve_year_rejects_out_of_range() {
        assert!(resolve_year(Some(0)).is_err());
        assert!(resolve_year(Some(20231)).is_err());
    }

    #[test]
    fn apply_config_format() {
        let mut cfg = Config::default();
        apply_config(&mut cfg, "format", "JSON").unwrap();
        assert_eq!(cfg.format, OutputFormat::Json);
        apply_config(&mut cfg, "format", "text").unwrap();
        assert_eq!(cfg.format, OutputFormat::Text);
        assert!(apply_config(&mut cfg, "format", "yaml").is_err());
    }

    #[test]
    fn apply_config_rows() {
        let mut cfg = Config::default();
        apply_config(&mut cfg, "rows", "5").unwrap();
        assert_eq!(cfg.rows, 5);
        assert!(apply_config(&mut cfg, "rows", "0").is_err());
        assert!(apply_config(&mut cfg, "rows", "many").is_err());
        assert_eq!(cfg.rows, 5);
    }

    #[test]
    fn apply_config_unknown_key() {
        let mut cfg = Config::default();
        let err = apply_config(&mut cfg, "colour", "on").unwrap_err();
        assert!(err.to_string().contains("unknown config key"));
    }
}
