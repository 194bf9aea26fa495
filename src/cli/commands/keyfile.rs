//! `nokvault keyfile-generate`: create a new random keyfile.

use std::path::Path;

use crate::cli::output;
use crate::crypto::keyfile::generate_keyfile;
use crate::errors::Result;

/// Execute the `keyfile-generate` command.  Refuses to overwrite.
pub fn execute(path: &Path) -> Result<()> {
    generate_keyfile(path)?;

    output::success(&format!("Keyfile generated at {}", path.display()));
    output::warning("Keep this file secret! Anyone with it can decrypt your containers.");
    output::tip("Use it with `nokvault --keyfile <path> encrypt <file>`.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    #[test]
    fn keyfile_generate_creates_file() {
        let dir = TempDir::new().unwrap();
        let kf_path = dir.path().join("my.keyfile");

        super::execute(&kf_path).unwrap();

        assert!(kf_path.exists(), "keyfile should be created");
        let data = std::fs::read(&kf_path).unwrap();
        assert_eq!(data.len(), 32, "keyfile should be 32 bytes");
    }

    #[test]
    fn keyfile_generate_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let kf_path = dir.path().join("existing");
        std::fs::write(&kf_path, b"keep me").unwrap();

        assert!(super::execute(&kf_path).is_err());
        assert_eq!(std::fs::read(&kf_path).unwrap(), b"keep me");
    }
}
