//! Container module: the on-disk encrypted file.
//!
//! This module provides:
//! - The fixed binary header and its reader/writer (`format`)
//! - `FileMetadata` captured from and restored to the filesystem (`metadata`)

pub mod format;
pub mod metadata;

// Re-export the most commonly used items.
pub use format::{
    read_container, read_header, read_header_with_metadata, write_container, write_header,
    Container, ContainerHeader, CONTAINER_SUFFIX, CURRENT_VERSION, HEADER_SIZE, MAGIC,
};
pub use metadata::{restore_metadata, FileMetadata};
