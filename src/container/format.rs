//! Binary container format.
//!
//! A `.nokvault` file has this layout:
//!
//! ```text
//! [NOKVAULT: 8][version: 2 LE][salt: 16][metadata_size: 4 LE][data_offset: 8 LE]
//! [metadata JSON: metadata_size bytes][nonce: 12][ciphertext][tag: 16]
//! ```
//!
//! - **Magic** (`NOKVAULT`): identifies the file as a nokvault container.
//! - **Version**: format version (currently `1`).
//! - **Salt**: the Argon2id salt the container key was derived with.
//! - **Metadata size**: length of the JSON metadata block, `0` if absent.
//! - **Data offset**: `HEADER_SIZE + metadata_size`, so readers can seek
//!   straight to the ciphertext.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::metadata::FileMetadata;
use crate::crypto::kdf::{Salt, SALT_LEN};
use crate::errors::{NokvaultError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every container.
pub const MAGIC: &[u8; 8] = b"NOKVAULT";

/// Current binary format version.
pub const CURRENT_VERSION: u16 = 1;

/// Size of the fixed header: 8 + 2 + 16 + 4 + 8.
pub const HEADER_SIZE: usize = 38;

/// File name suffix used for containers.
pub const CONTAINER_SUFFIX: &str = ".nokvault";

// ---------------------------------------------------------------------------
// ContainerHeader
// ---------------------------------------------------------------------------

/// The fixed-size header at the start of every container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u16,
    pub salt: Salt,
    pub metadata_size: u32,
    pub data_offset: u64,
}

impl ContainerHeader {
    fn new(salt: Salt, metadata_size: u32) -> Self {
        Self {
            version: CURRENT_VERSION,
            salt,
            metadata_size,
            data_offset: HEADER_SIZE as u64 + u64::from(metadata_size),
        }
    }

    fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..8].copy_from_slice(MAGIC);
        buf[8..10].copy_from_slice(&self.version.to_le_bytes());
        buf[10..26].copy_from_slice(&self.salt);
        buf[26..30].copy_from_slice(&self.metadata_size.to_le_bytes());
        buf[30..38].copy_from_slice(&self.data_offset.to_le_bytes());
        buf
    }

    fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self> {
        if &buf[0..8] != MAGIC {
            return Err(NokvaultError::InvalidFormat(
                "invalid magic number: not a nokvault file".into(),
            ));
        }

        let version = u16::from_le_bytes([buf[8], buf[9]]);
        if version != CURRENT_VERSION {
            return Err(NokvaultError::UnsupportedVersion(version));
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&buf[10..26]);
        let metadata_size = u32::from_le_bytes([buf[26], buf[27], buf[28], buf[29]]);
        let mut offset = [0u8; 8];
        offset.copy_from_slice(&buf[30..38]);
        let data_offset = u64::from_le_bytes(offset);

        let expected = HEADER_SIZE as u64 + u64::from(metadata_size);
        if data_offset != expected {
            return Err(NokvaultError::InvalidFormat(format!(
                "data offset {data_offset} does not match header size + metadata size ({expected})"
            )));
        }

        Ok(Self {
            version,
            salt,
            metadata_size,
            data_offset,
        })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Write a container header, followed by the metadata block if present.
///
/// Fails before writing anything if the salt is not 16 bytes.
pub fn write_header<W: Write>(
    writer: &mut W,
    salt: &[u8],
    metadata: Option<&FileMetadata>,
) -> Result<()> {
    let salt: Salt = salt.try_into().map_err(|_| NokvaultError::InvalidSalt {
        expected: SALT_LEN,
        actual: salt.len(),
    })?;

    let metadata_json = match metadata {
        Some(meta) => serde_json::to_vec(meta)
            .map_err(|e| NokvaultError::SerializationError(format!("metadata: {e}")))?,
        None => Vec::new(),
    };
    let metadata_size = u32::try_from(metadata_json.len()).map_err(|_| {
        NokvaultError::SerializationError(format!(
            "metadata length {} exceeds u32::MAX",
            metadata_json.len()
        ))
    })?;

    let header = ContainerHeader::new(salt, metadata_size);
    writer.write_all(&header.to_bytes())?;
    if !metadata_json.is_empty() {
        writer.write_all(&metadata_json)?;
    }
    Ok(())
}

/// Read and validate the fixed header.  Leaves the reader positioned at
/// the start of the metadata block.
pub fn read_header<R: Read>(reader: &mut R) -> Result<ContainerHeader> {
    let mut buf = [0u8; HEADER_SIZE];
    reader.read_exact(&mut buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            NokvaultError::InvalidFormat("file too small to be a nokvault container".into())
        }
        _ => NokvaultError::Io(e),
    })?;
    ContainerHeader::from_bytes(&buf)
}

/// Read the header and, if `metadata_size > 0`, the metadata block.
/// Leaves the reader positioned at `data_offset`.
pub fn read_header_with_metadata<R: Read>(
    reader: &mut R,
) -> Result<(ContainerHeader, Option<FileMetadata>)> {
    let header = read_header(reader)?;
    if header.metadata_size == 0 {
        return Ok((header, None));
    }

    let len = usize::try_from(header.metadata_size).map_err(|_| {
        NokvaultError::InvalidFormat(format!(
            "metadata length {} exceeds platform address space",
            header.metadata_size
        ))
    })?;
    let mut json = Vec::new();
    reader
        .by_ref()
        .take(len as u64)
        .read_to_end(&mut json)
        .map_err(NokvaultError::Io)?;
    if json.len() != len {
        return Err(NokvaultError::InvalidFormat(
            "metadata length exceeds file size".into(),
        ));
    }

    let metadata: FileMetadata = serde_json::from_slice(&json)
        .map_err(|e| NokvaultError::InvalidFormat(format!("metadata JSON: {e}")))?;
    Ok((header, Some(metadata)))
}

/// A container read fully into memory.
#[derive(Debug)]
pub struct Container {
    pub header: ContainerHeader,
    pub metadata: Option<FileMetadata>,
    /// `nonce || ciphertext || tag`, everything from `data_offset` to EOF.
    pub ciphertext: Vec<u8>,
}

/// Open a container file, parse its header and metadata, and read the
/// ciphertext starting at `data_offset`.
pub fn read_container(path: &Path) -> Result<Container> {
    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();

    let (header, metadata) = read_header_with_metadata(&mut file)?;
    if header.data_offset > file_len {
        return Err(NokvaultError::InvalidFormat(
            "data offset exceeds file length".into(),
        ));
    }

    file.seek(SeekFrom::Start(header.data_offset))?;
    let mut ciphertext = Vec::new();
    file.read_to_end(&mut ciphertext)?;

    Ok(Container {
        header,
        metadata,
        ciphertext,
    })
}

/// Serialize a full container (header, metadata, ciphertext) to `writer`.
pub fn write_container<W: Write>(
    writer: &mut W,
    salt: &[u8],
    metadata: Option<&FileMetadata>,
    ciphertext: &[u8],
) -> Result<()> {
    write_header(writer, salt, metadata)?;
    writer.write_all(ciphertext)?;
    Ok(())
}
