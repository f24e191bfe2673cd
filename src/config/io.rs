use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::ConfigError;
use super::types::DashboardSettings;
use crate::app_dirs;

/// Resolve `<app root>/config.toml`, creating the app root if needed.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::config_file_path()?)
}

/// Load settings from the default location, returning defaults if the file is missing.
pub fn load_or_default() -> Result<DashboardSettings, ConfigError> {
    load_from(&config_path()?)
}

/// Load, normalize and validate settings from `path`. A missing file yields defaults.
pub fn load_from(path: &Path) -> Result<DashboardSettings, ConfigError> {
    if !path.exists() {
        return Ok(DashboardSettings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: DashboardSettings =
        toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
    let settings = settings.normalized();
    settings.validate()?;
    Ok(settings)
}

pub fn save(settings: &DashboardSettings) -> Result<(), ConfigError> {
    save_to_path(settings, &config_path()?)
}

/// Write settings as TOML, creating parent directories as needed.
pub fn save_to_path(settings: &DashboardSettings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(settings).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, data.as_bytes())
}

/// Write through a sibling temp file and rename it over `path`.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    use rand::TryRngCore;
    let write_error = |path: &Path, source: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let (Some(dir), Some(file_name)) = (path.parent(), path.file_name()) else {
        return Err(write_error(
            path,
            std::io::Error::other("config path has no parent directory or file name"),
        ));
    };

    let mut suffix = [0u8; 6];
    rand::rngs::OsRng
        .try_fill_bytes(&mut suffix)
        .map_err(|err| write_error(path, std::io::Error::other(err.to_string())))?;
    let suffix: String = suffix.iter().map(|b| format!("{b:02x}")).collect();
    let tmp_path = dir.join(format!("{}.tmp-{suffix}", file_name.to_string_lossy()));

    let result = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .and_then(|mut file| {
            file.write_all(data)?;
            file.sync_all()
        });
    if let Err(err) = result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(write_error(&tmp_path, err));
    }
    if let Err(err) = replace_file(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(write_error(path, err));
    }
    Ok(())
}

fn replace_file(tmp_path: &Path, path: &Path) -> std::io::Result<()> {
    match std::fs::rename(tmp_path, path) {
        Ok(()) => Ok(()),
        #[cfg(target_os = "windows")]
        Err(err)
            if matches!(
                err.kind(),
                std::io::ErrorKind::AlreadyExists | std::io::ErrorKind::PermissionDenied
            ) =>
        {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(inner) if inner.kind() == std::io::ErrorKind::NotFound => {}
                Err(inner) => return Err(inner),
            }
            std::fs::rename(tmp_path, path)
        }
        Err(err) => Err(err),
    }
}
