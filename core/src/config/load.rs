use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::AppConfig;

/// Get the default sweep data directory: ~/.sweep
pub fn get_sweep_data_dir() -> Result<PathBuf, ConfigError> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| ConfigError::NoHomeDir)?;
    Ok(PathBuf::from(home).join(".sweep"))
}

/// Load configuration from an explicit file, falling back to the default
/// lookup when `path` is `None`.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut cfg = match path {
        Some(p) => read_file(p)?,
        None => return load_default(),
    };
    apply_env_overrides(&mut cfg)?;
    expand_paths(&mut cfg);
    Ok(cfg)
}

pub fn load_default() -> Result<AppConfig, ConfigError> {
    // Priority 1: ./sweep.toml (current directory)
    let local_config = Path::new("sweep.toml");

    // Priority 2: ~/.sweep/config.toml
    let home_config = get_sweep_data_dir().ok().map(|d| d.join("config.toml"));

    let mut cfg = if local_config.exists() {
        read_file(local_config)?
    } else if let Some(p) = home_config.as_deref().filter(|p| p.exists()) {
        read_file(p)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg)?;
    expand_paths(&mut cfg);
    Ok(cfg)
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let cfg = toml::from_str::<AppConfig>(&s).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(cfg)
}

/// Environment variable overrides (highest priority after CLI flags).
pub fn apply_env_overrides(cfg: &mut AppConfig) -> Result<(), ConfigError> {
    if let Ok(v) = std::env::var("SWEEP_SOLVER_BIN") {
        if !v.trim().is_empty() {
            cfg.solver.bin = v;
        }
    }
    if let Ok(v) = std::env::var("SWEEP_MAX_WORKERS") {
        if !v.trim().is_empty() {
            cfg.scheduler.max_workers =
                v.trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "SWEEP_MAX_WORKERS",
                        value: v.clone(),
                    })?;
        }
    }
    if let Ok(v) = std::env::var("SWEEP_OUTPUT_DIR") {
        if !v.trim().is_empty() {
            cfg.output.directory = v;
        }
    }
    Ok(())
}

fn expand_paths(cfg: &mut AppConfig) {
    cfg.output.directory = expand(&cfg.output.directory);
    cfg.solver.bin = expand(&cfg.solver.bin);
    if let Some(dir) = cfg.solver.workdir.as_mut() {
        *dir = expand(dir);
    }
    if let Some(dir) = cfg.logging.directory.as_mut() {
        *dir = expand(dir);
    }
}

fn expand(s: &str) -> String {
    match shellexpand::full(s) {
        Ok(v) => v.into_owned(),
        Err(e) => {
            tracing::warn!(value = %s, error = %e, "path expansion failed, using raw value");
            s.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scheduler]\nmax_workers = 4\nkill_on_cancel = true").unwrap();

        let cfg = load(Some(file.path())).unwrap();
        assert!(cfg.scheduler.kill_on_cancel);
        assert_eq!(cfg.grid.i_max, 63);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[grid\ni_max = ").unwrap();

        assert!(matches!(
            load(Some(file.path())),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_reports_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            load(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }
}
