//! `nokvault info`: show a container's header and metadata without
//! decrypting it.

use std::fs::File;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::cli::output;
use crate::cli::require_exists;
use crate::container::format::{read_header_with_metadata, ContainerHeader};
use crate::container::metadata::FileMetadata;
use crate::errors::Result;

/// Execute the `info` command.
pub fn execute(path: &Path) -> Result<()> {
    require_exists(path)?;
    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let (header, metadata) = read_header_with_metadata(&mut file)?;

    output::print_fields(&fields(&header, metadata.as_ref(), file_len));
    Ok(())
}

fn fields(
    header: &ContainerHeader,
    metadata: Option<&FileMetadata>,
    file_len: u64,
) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Version", header.version.to_string()),
        ("Salt", BASE64.encode(header.salt)),
        ("Metadata size", format!("{} bytes", header.metadata_size)),
        ("Data offset", header.data_offset.to_string()),
        (
            "Ciphertext size",
            format!("{} bytes", file_len.saturating_sub(header.data_offset)),
        ),
    ];

    match metadata {
        Some(meta) => {
            rows.push(("Name", meta.name.clone()));
            rows.push(("Relative path", meta.relative_path.clone()));
            rows.push(("Original size", format!("{} bytes", meta.size)));
            rows.push(("Mode", format!("{:o}", meta.mode)));
            rows.push((
                "Modified",
                meta.mod_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ));
            if let Some(kdf) = meta.kdf {
                rows.push((
                    "Key derivation",
                    format!(
                        "argon2id m={} KiB, t={}, p={}",
                        kdf.memory_kib, kdf.iterations, kdf.parallelism
                    ),
                ));
            }
        }
        None => rows.push(("Metadata", "none".to_string())),
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::format::HEADER_SIZE;

    #[test]
    fn fields_without_metadata() {
        let header = ContainerHeader {
            version: 1,
            salt: [0u8; 16],
            metadata_size: 0,
            data_offset: HEADER_SIZE as u64,
        };
        let rows = fields(&header, None, 100);
        assert!(rows.contains(&("Salt", "AAAAAAAAAAAAAAAAAAAAAA==".to_string())));
        assert!(rows.contains(&("Ciphertext size", "62 bytes".to_string())));
        assert!(rows.contains(&("Metadata", "none".to_string())));
    }
}
