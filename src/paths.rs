use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use etcetera::app_strategy::{AppStrategy, AppStrategyArgs};

// Windows -> AppData\Roaming\vrecap
#[cfg(target_os = "windows")]
use etcetera::app_strategy::Windows as Strategy;

// Mac & Linux -> ~/.config/vrecap
#[cfg(not(target_os = "windows"))]
use etcetera::app_strategy::Xdg as Strategy;

/// Points the CLI at a config file outside the per-user config dir.
pub const CONFIG_ENV: &str = "VRECAP_CONFIG";

const CONFIG_FILE_NAME: &str = "config.json";

pub struct AppPaths {
    pub config_file: PathBuf,
}

impl AppPaths {
    /// Resolves the config file. Nothing is created here; `save_config`
    /// makes the parent directory on first write.
    pub fn init() -> Result<Self> {
        let config_file = match config_override(std::env::var_os(CONFIG_ENV)) {
            Some(path) => path,
            None => default_config_dir()?.join(CONFIG_FILE_NAME),
        };
        Ok(Self { config_file })
    }
}

/// An unset or empty override means "use the default location".
fn config_override(value: Option<OsString>) -> Option<PathBuf> {
    value.filter(|v| !v.is_empty()).map(PathBuf::from)
}

fn default_config_dir() -> Result<PathBuf> {
    let args = AppStrategyArgs {
        top_level_domain: "com".to_string(),
        author: "vrecap".to_string(),
        app_name: "vrecap".to_string(),
    };
    let strategy = Strategy::new(args).map_err(|_| anyhow!("could not determine config dir"))?;
    Ok(strategy.config_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_when_set() {
        let path = config_override(Some(OsString::from("/tmp/recap.json")));
        assert_eq!(path, Some(PathBuf::from("/tmp/recap.json")));
    }

    #[test]
    fn empty_or_missing_override_is_ignored() {
        assert_eq!(config_override(Some(OsString::new())), None);
        assert_eq!(config_override(None), None);
    }

    #[test]
    fn default_config_file_is_named_config_json() {
        let dir = default_config_dir().unwrap();
        assert!(dir.ends_with("vrecap"));
        assert_eq!(
            dir.join(CONFIG_FILE_NAME).file_name().unwrap(),
            "config.json"
        );
    }
}
