// src/config/validate.rs

use crate::config::{MonitorConfig, RawMonitorConfig};
use crate::errors::{Result, TreeMirrorError};

impl TryFrom<RawMonitorConfig> for MonitorConfig {
    type Error = TreeMirrorError;

    fn try_from(raw: RawMonitorConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(MonitorConfig::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawMonitorConfig) -> Result<()> {
    validate_paths(cfg)?;
    validate_excludes(cfg)?;
    validate_capacity(cfg)?;
    Ok(())
}

fn validate_paths(cfg: &RawMonitorConfig) -> Result<()> {
    if cfg.root.as_os_str().is_empty() {
        return Err(TreeMirrorError::Config("root path must not be empty".to_string()));
    }
    if cfg.staging_dir.as_os_str().is_empty() {
        return Err(TreeMirrorError::Config(
            "staging directory must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_excludes(cfg: &RawMonitorConfig) -> Result<()> {
    for prefix in &cfg.extra_excludes {
        // An empty prefix would exclude everything.
        if prefix.is_empty() {
            return Err(TreeMirrorError::Config(
                "exclusion prefixes must not be empty".to_string(),
            ));
        }
        // Watched paths are canonical, so a relative prefix can never match.
        if !prefix.starts_with('/') {
            return Err(TreeMirrorError::Config(format!(
                "exclusion prefix {prefix:?} must be an absolute path"
            )));
        }
    }
    Ok(())
}

fn validate_capacity(cfg: &RawMonitorConfig) -> Result<()> {
    if cfg.max_watches == 0 {
        return Err(TreeMirrorError::Config(
            "max_watches must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
