// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Volume configuration loaded from TOML with environment overrides.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Volume configuration.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{VolumeError, VolumeResult};

/// Default volume size: 1 MiB.
pub const DEFAULT_VOLUME_SIZE: u64 = 1024 * 1024;

/// Environment variable overriding [`VolumeConfig::volume_size`].
pub const ENV_VOLUME_SIZE: &str = "COHVOL_VOLUME_SIZE";
/// Environment variable overriding [`VolumeConfig::disk_path`].
pub const ENV_DISK: &str = "COHVOL_DISK";
/// Environment variable overriding [`VolumeConfig::metadata_path`].
pub const ENV_METADATA: &str = "COHVOL_METADATA";
/// Environment variable overriding [`VolumeConfig::credentials_path`].
pub const ENV_CREDENTIALS: &str = "COHVOL_CREDENTIALS";

fn default_volume_size() -> u64 {
    DEFAULT_VOLUME_SIZE
}

fn default_disk_path() -> PathBuf {
    PathBuf::from("virtual_disk.bin")
}

fn default_metadata_path() -> PathBuf {
    PathBuf::from("metadata.msgpack")
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("users.msgpack")
}

/// Where the volume lives and how large it is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VolumeConfig {
    /// Size of the backing store in bytes.
    #[serde(default = "default_volume_size")]
    pub volume_size: u64,
    /// Backing store file.
    #[serde(default = "default_disk_path")]
    pub disk_path: PathBuf,
    /// Metadata record file.
    #[serde(default = "default_metadata_path")]
    pub metadata_path: PathBuf,
    /// Credential record file.
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            volume_size: default_volume_size(),
            disk_path: default_disk_path(),
            metadata_path: default_metadata_path(),
            credentials_path: default_credentials_path(),
        }
    }
}

impl VolumeConfig {
    /// Place all three volume files under `dir`.
    pub fn in_dir(dir: &Path, volume_size: u64) -> Self {
        Self {
            volume_size,
            disk_path: dir.join(default_disk_path()),
            metadata_path: dir.join(default_metadata_path()),
            credentials_path: dir.join(default_credentials_path()),
        }
    }

    /// Load a TOML config file. Relative paths are taken relative to the
    /// file's directory.
    pub fn load(path: &Path) -> VolumeResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|err| VolumeError::Config(format!("read {}: {err}", path.display())))?;
        let mut cfg: VolumeConfig = toml::from_str(&text)
            .map_err(|err| VolumeError::Config(format!("parse {}: {err}", path.display())))?;
        cfg.rebase_paths(path);
        Ok(cfg)
    }

    fn rebase_paths(&mut self, path: &Path) {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        self.disk_path = join_base(base, &self.disk_path);
        self.metadata_path = join_base(base, &self.metadata_path);
        self.credentials_path = join_base(base, &self.credentials_path);
    }

    /// Apply `COHVOL_*` environment overrides. Empty values are ignored.
    pub fn apply_env(&mut self) -> VolumeResult<()> {
        if let Some(size) = env_value(ENV_VOLUME_SIZE)? {
            self.volume_size = size.parse::<u64>().map_err(|err| {
                VolumeError::Config(format!("invalid {ENV_VOLUME_SIZE} value '{size}': {err}"))
            })?;
        }
        if let Some(path) = env_value(ENV_DISK)? {
            self.disk_path = PathBuf::from(path);
        }
        if let Some(path) = env_value(ENV_METADATA)? {
            self.metadata_path = PathBuf::from(path);
        }
        if let Some(path) = env_value(ENV_CREDENTIALS)? {
            self.credentials_path = PathBuf::from(path);
        }
        Ok(())
    }
}

fn join_base(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn env_value(key: &str) -> VolumeResult<Option<String>> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_owned()))
            }
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(VolumeError::Config(format!("failed to read {key}: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        for key in [ENV_VOLUME_SIZE, ENV_DISK, ENV_METADATA, ENV_CREDENTIALS] {
            env::remove_var(key);
        }
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let cfg: VolumeConfig = toml::from_str("volume_size = 4096\n").expect("parse");
        assert_eq!(cfg.volume_size, 4096);
        assert_eq!(cfg.disk_path, PathBuf::from("virtual_disk.bin"));
        assert_eq!(cfg.metadata_path, PathBuf::from("metadata.msgpack"));
    }

    #[test]
    fn relative_paths_are_rebased_on_the_config_dir() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("cohvol.toml");
        fs::write(
            &path,
            "volume_size = 2048\n\
             disk_path = \"disk.img\"\n\
             metadata_path = \"/var/tmp/meta.msgpack\"\n",
        )
        .expect("write config");
        let cfg = VolumeConfig::load(&path).expect("load");
        assert_eq!(cfg.disk_path, dir.path().join("disk.img"));
        assert_eq!(cfg.metadata_path, PathBuf::from("/var/tmp/meta.msgpack"));
        assert_eq!(cfg.credentials_path, dir.path().join("users.msgpack"));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("cohvol.toml");
        fs::write(&path, "volume_size = \"big\"\n").expect("write config");
        assert!(matches!(VolumeConfig::load(&path), Err(VolumeError::Config(_))));
    }

    #[test]
    #[serial]
    fn env_overrides_replace_file_values() {
        clear_env();
        env::set_var(ENV_VOLUME_SIZE, " 8192 ");
        env::set_var(ENV_DISK, "/tmp/other.bin");
        env::set_var(ENV_METADATA, "");
        let mut cfg = VolumeConfig::default();
        cfg.apply_env().expect("apply");
        clear_env();
        assert_eq!(cfg.volume_size, 8192);
        assert_eq!(cfg.disk_path, PathBuf::from("/tmp/other.bin"));
        assert_eq!(cfg.metadata_path, PathBuf::from("metadata.msgpack"));
    }

    #[test]
    #[serial]
    fn unparsable_size_override_is_rejected() {
        clear_env();
        env::set_var(ENV_VOLUME_SIZE, "lots");
        let mut cfg = VolumeConfig::default();
        let result = cfg.apply_env();
        clear_env();
        assert!(matches!(result, Err(VolumeError::Config(_))));
    }
}
