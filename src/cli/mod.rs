//! CLI module: Clap argument parser, password supply, output helpers, and
//! command implementations.

pub mod commands;
pub mod output;
pub mod password;

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::Settings;
use crate::errors::Result;

use password::PasswordSource;

/// nokvault CLI: password-based file and directory encryption.
#[derive(Parser)]
#[command(
    name = "nokvault",
    about = "Encrypt files and directories into password-protected containers",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Never prompt; fail if no password source is available
    #[arg(long, global = true)]
    pub no_prompt: bool,

    /// Password (prefer NOKVAULT_PASSWORD or the prompt; this ends up in shell history)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Path to a keyfile whose contents are used as the password
    #[arg(long, global = true)]
    pub keyfile: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Encrypt a file or directory
    Encrypt {
        /// File or directory to encrypt
        path: PathBuf,

        /// Output path (default: <path>.nokvault)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compress before encrypting
        #[arg(long, conflicts_with = "no_compress")]
        compress: bool,

        /// Do not compress, even if enabled in the config
        #[arg(long)]
        no_compress: bool,

        /// Show what would be encrypted without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Decrypt a container or a directory of containers
    Decrypt {
        /// Container file or directory to decrypt
        path: PathBuf,

        /// Output path (default: <path> without .nokvault)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show what would be decrypted without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Re-encrypt a container under a new password
    RotateKey {
        /// Container to rotate
        path: PathBuf,

        /// New password (default: NOKVAULT_NEW_PASSWORD or prompt)
        #[arg(long)]
        new_password: Option<String>,

        /// Keyfile whose contents become the new password
        #[arg(long)]
        new_keyfile: Option<PathBuf>,
    },

    /// Overwrite a file several times, then delete it
    SecureDelete {
        /// File to destroy
        path: PathBuf,

        /// Number of overwrite passes (default: from config, 3)
        #[arg(long, allow_negative_numbers = true)]
        passes: Option<i64>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show the header and metadata of a container
    Info {
        /// Container file
        path: PathBuf,
    },

    /// Generate a new random keyfile
    KeyfileGenerate {
        /// Path for the keyfile
        path: PathBuf,
    },

    /// Show the merged configuration, or create a default config file
    Config {
        /// Show every setting (the default action)
        #[arg(long, conflicts_with_all = ["init", "get"])]
        show: bool,

        /// Write the default settings to the global config file
        #[arg(long, conflicts_with = "get")]
        init: bool,

        /// Print one setting, e.g. `key_derivation.iterations` or `iterations`
        #[arg(long, value_name = "KEY")]
        get: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Environment variable holding the password for non-interactive use.
pub const PASSWORD_ENV: &str = "NOKVAULT_PASSWORD";

/// Environment variable holding the new password for `rotate-key`.
pub const NEW_PASSWORD_ENV: &str = "NOKVAULT_NEW_PASSWORD";

/// Global config overlaid with `.nokvault.toml` from the working directory.
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load_layered(Settings::global_config_path().as_deref(), &cwd)
}

/// Password source built from the global flags.
///
/// `confirm` asks for the password twice when prompting (used when
/// creating a container).
pub fn password_source<'a>(cli: &'a Cli, prompt: &'a str, confirm: bool) -> PasswordSource<'a> {
    PasswordSource {
        keyfile: cli.keyfile.as_deref(),
        explicit: cli.password.as_deref(),
        env_var: PASSWORD_ENV,
        prompt,
        confirm,
        allow_prompt: !cli.no_prompt,
    }
}

/// Fail early with a hint when `path` does not exist.
pub fn require_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(crate::errors::NokvaultError::PathNotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encrypt_with_flags() {
        let cli = Cli::parse_from([
            "nokvault",
            "--no-prompt",
            "--password",
            "pw",
            "encrypt",
            "notes.txt",
            "-o",
            "out.nokvault",
            "--compress",
        ]);
        assert!(cli.no_prompt);
        assert_eq!(cli.password.as_deref(), Some("pw"));
        match cli.command {
            Commands::Encrypt {
                path,
                output,
                compress,
                no_compress,
                dry_run,
            } => {
                assert_eq!(path, PathBuf::from("notes.txt"));
                assert_eq!(output, Some(PathBuf::from("out.nokvault")));
                assert!(compress);
                assert!(!no_compress);
                assert!(!dry_run);
            }
            _ => panic!("expected encrypt"),
        }
    }

    #[test]
    fn compress_flags_conflict() {
        let res = Cli::try_parse_from(["nokvault", "encrypt", "x", "--compress", "--no-compress"]);
        assert!(res.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["nokvault", "decrypt", "x.nokvault", "--keyfile", "k", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.keyfile, Some(PathBuf::from("k")));
    }

    #[test]
    fn secure_delete_accepts_negative_passes() {
        let cli = Cli::parse_from(["nokvault", "secure-delete", "f", "--passes", "-1", "-f"]);
        match cli.command {
            Commands::SecureDelete { passes, force, .. } => {
                assert_eq!(passes, Some(-1));
                assert!(force);
            }
            _ => panic!("expected secure-delete"),
        }
    }

    #[test]
    fn password_source_follows_flags() {
        let cli = Cli::parse_from(["nokvault", "--no-prompt", "info", "x"]);
        let source = password_source(&cli, "Password", true);
        assert!(!source.allow_prompt);
        assert!(source.confirm);
        assert_eq!(source.env_var, PASSWORD_ENV);
        assert!(source.keyfile.is_none());
    }

    #[test]
    fn config_flags_are_exclusive() {
        assert!(Cli::try_parse_from(["nokvault", "config", "--show", "--init"]).is_err());
        assert!(Cli::try_parse_from(["nokvault", "config", "--init", "--get", "x"]).is_err());

        let cli = Cli::parse_from(["nokvault", "config", "--get", "iterations"]);
        match cli.command {
            Commands::Config { show, init, get } => {
                assert!(!show);
                assert!(!init);
                assert_eq!(get.as_deref(), Some("iterations"));
            }
            _ => panic!("expected config"),
        }
    }

    #[test]
    fn require_exists_reports_missing_path() {
        let err = require_exists(Path::new("/definitely/not/here")).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::InvalidInput);
    }
}
