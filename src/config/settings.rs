use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::core::compression::DEFAULT_MIN_COMPRESS_SIZE;
use crate::core::file::FileOptions;
use crate::core::shred::DEFAULT_PASSES;
use crate::crypto::kdf::KdfParams;
use crate::errors::{NokvaultError, Result};

/// User configuration, loaded from `config.toml` in the platform config
/// directory and `.nokvault.toml` in the working directory.
///
/// Every field has a default so nokvault works without any config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub encryption: EncryptionSettings,

    #[serde(default)]
    pub key_derivation: KeyDerivationSettings,

    #[serde(default)]
    pub security: SecuritySettings,
}

/// `[encryption]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionSettings {
    /// Gzip payloads before encrypting them.
    #[serde(default)]
    pub compression: bool,

    /// Store name, mode and mtime in the container and restore them.
    #[serde(default = "default_true")]
    pub preserve_metadata: bool,

    #[serde(default = "default_min_compress_size")]
    pub min_compress_size: usize,
}

/// `[key_derivation]`, the Argon2id cost parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDerivationSettings {
    /// Memory cost in KiB (default: 64 MB).
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    #[serde(default = "default_iterations")]
    pub iterations: u32,

    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

/// `[security]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySettings {
    /// Overwrite passes for `secure-delete`.
    #[serde(default = "default_delete_passes")]
    pub delete_passes: u32,

    /// How long a derived key may be reused from the key cache.
    #[serde(default = "default_key_cache_timeout_secs")]
    pub key_cache_timeout_secs: u64,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_min_compress_size() -> usize {
    DEFAULT_MIN_COMPRESS_SIZE
}

fn default_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_iterations() -> u32 {
    3
}

fn default_parallelism() -> u32 {
    4
}

fn default_delete_passes() -> u32 {
    DEFAULT_PASSES
}

fn default_key_cache_timeout_secs() -> u64 {
    300
}

impl Default for EncryptionSettings {
    fn default() -> Self {
        Self {
            compression: false,
            preserve_metadata: default_true(),
            min_compress_size: default_min_compress_size(),
        }
    }
}

impl Default for KeyDerivationSettings {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            delete_passes: default_delete_passes(),
            key_cache_timeout_secs: default_key_cache_timeout_secs(),
        }
    }
}

// ── Implementation ───────────────────────────────────────────────────

impl Settings {
    /// Name of the config file we look for in the project directory.
    pub const FILE_NAME: &'static str = ".nokvault.toml";

    /// Load settings from `<project_dir>/.nokvault.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        Self::load_layered(None, project_dir)
    }

    /// Load the global config file (if any) and overlay the project one.
    ///
    /// Keys set in the project file win; keys it leaves out keep the global
    /// value, table by table.
    pub fn load_layered(global: Option<&Path>, project_dir: &Path) -> Result<Self> {
        let mut merged = toml::Table::new();
        if let Some(global) = global {
            if let Some(table) = read_table(global)? {
                merge_tables(&mut merged, table);
            }
        }
        if let Some(table) = read_table(&project_dir.join(Self::FILE_NAME))? {
            merge_tables(&mut merged, table);
        }

        toml::Value::Table(merged)
            .try_into()
            .map_err(|e| NokvaultError::ConfigError(format!("invalid settings: {e}")))
    }

    /// `config.toml` in the platform config directory,
    /// e.g. `~/.config/nokvault/config.toml` on Linux.
    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "nokvault").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Convert the `[key_derivation]` table into crypto-layer params.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            memory_kib: self.key_derivation.memory_kib,
            iterations: self.key_derivation.iterations,
            parallelism: self.key_derivation.parallelism,
        }
    }

    /// Pipeline options for encrypt/decrypt.  The KDF params are recorded
    /// in each container.
    pub fn file_options(&self) -> FileOptions {
        FileOptions {
            compress: self.encryption.compression,
            min_compress_size: self.encryption.min_compress_size,
            preserve_metadata: self.encryption.preserve_metadata,
            kdf: Some(self.kdf_params()),
        }
    }

    pub fn key_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.security.key_cache_timeout_secs)
    }

    /// Every setting as a `(table.key, value)` pair, sorted by key.
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(self)
            .map_err(|e| NokvaultError::ConfigError(format!("cannot serialize settings: {e}")))?;
        let mut rows = Vec::new();
        if let toml::Value::Table(tables) = value {
            for (section, inner) in tables {
                if let toml::Value::Table(keys) = inner {
                    for (key, v) in keys {
                        rows.push((format!("{section}.{key}"), display_value(&v)));
                    }
                }
            }
        }
        Ok(rows)
    }

    /// Look up one setting by `table.key`, or by bare key name.
    pub fn get(&self, key: &str) -> Result<String> {
        let wanted = key.trim();
        self.entries()?
            .into_iter()
            .find(|(full, _)| {
                full == wanted || full.rsplit_once('.').is_some_and(|(_, bare)| bare == wanted)
            })
            .map(|(_, value)| value)
            .ok_or_else(|| {
                NokvaultError::ConfigError(format!("unknown configuration key: {key}"))
                    .with_hint("Run `nokvault config --show` to list the available keys.")
            })
    }

    /// The defaults as a TOML document.
    pub fn default_document() -> Result<String> {
        toml::to_string_pretty(&Self::default())
            .map_err(|e| NokvaultError::ConfigError(format!("cannot serialize settings: {e}")))
    }
}

fn display_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn read_table(path: &Path) -> Result<Option<toml::Table>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    let table = contents.parse::<toml::Table>().map_err(|e| {
        NokvaultError::ConfigError(format!("Failed to parse {}: {e}", path.display()))
    })?;
    Ok(Some(table))
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            other => {
                base.insert(key, other);
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
