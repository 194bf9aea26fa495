//! `nokvault config`: inspect the merged settings or write a default
//! global config file.

use std::fs;
use std::path::Path;

use crate::cli::{load_settings, output};
use crate::config::Settings;
use crate::errors::{NokvaultError, Result};

/// Execute the `config` command.  With no flags, behaves like `--show`.
pub fn execute(init: bool, get: Option<&str>) -> Result<()> {
    if init {
        let path = Settings::global_config_path().ok_or_else(|| {
            NokvaultError::ConfigError("no configuration directory for this platform".into())
        })?;
        init_file(&path)?;
        output::success(&format!("Configuration initialized at {}", path.display()));
        output::tip(&format!(
            "A {} in the working directory overrides it key by key.",
            Settings::FILE_NAME
        ));
        return Ok(());
    }

    let settings = load_settings()?;
    match get {
        Some(key) => println!("{}", settings.get(key)?),
        None => {
            let entries = settings.entries()?;
            let rows: Vec<(&str, String)> = entries
                .iter()
                .map(|(key, value)| (key.as_str(), value.clone()))
                .collect();
            output::print_fields(&rows);
        }
    }
    Ok(())
}

/// Write the default settings to `path`.  Refuses to overwrite.
fn init_file(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(NokvaultError::ConfigError(format!(
            "{} already exists",
            path.display()
        ))
        .with_hint("Edit the file directly, or delete it and run `nokvault config --init` again."));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, Settings::default_document()?)?;
    Ok(())
}
