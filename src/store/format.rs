//! On-disk layout for [`FileStore`](super::FileStore).
//!
//! ```text
//! [MAGIC 8B "FORGEKNN"][VERSION u32][DIMENSION u32][FLAGS u32][RESERVED u32]
//! [LEN u32][CRC32 u32][bincode StoredRecord]   <- one frame per record
//! [LEN u32][CRC32 u32][bincode StoredRecord]
//! ...
//! ```
//!
//! All integers are little-endian. Each frame carries its own checksum so
//! the file can be appended to without rewriting the header.

use crate::constants::file_store::{FRAME_PREFIX_SIZE, MAX_FRAME_BYTES};
use crate::error::{ForgeKnnError, Result};
use crate::types::{Label, VectorId};
use crate::vector::VectorRecord;
use serde::{Deserialize, Serialize};
use std::io::{self, Read};

/// Magic bytes identifying a forge-knn store file: "FORGEKNN"
pub const MAGIC: [u8; 8] = *b"FORGEKNN";

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

/// File header structure.
///
/// Total size: 24 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Magic bytes (must be MAGIC)
    pub magic: [u8; 8],
    /// Format version
    pub version: u32,
    /// Embedding length of every record in the file
    pub dimension: u32,
    /// Format flags, currently always zero
    pub flags: u32,
}

impl FileHeader {
    /// Header size in bytes.
    pub const SIZE: usize = 24;

    /// Create a header for a store of the given dimension.
    pub fn new(dimension: u32) -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            dimension,
            flags: 0,
        }
    }

    /// Serialize header to bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.magic);
        bytes[8..12].copy_from_slice(&self.version.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.dimension.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.flags.to_le_bytes());
        bytes
    }

    /// Deserialize and verify a header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(ForgeKnnError::invalid_format("header too small"));
        }

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&bytes[0..8]);
        if magic != MAGIC {
            return Err(ForgeKnnError::invalid_format("invalid magic bytes"));
        }

        let version = read_u32(&bytes[8..12]);
        if version > FORMAT_VERSION {
            return Err(ForgeKnnError::invalid_format(format!(
                "unsupported version {} (max supported: {})",
                version, FORMAT_VERSION
            )));
        }

        Ok(Self {
            magic,
            version,
            dimension: read_u32(&bytes[12..16]),
            flags: read_u32(&bytes[16..20]),
        })
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Serialized form of one record.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    id: u64,
    label: u32,
    embedding: Vec<f32>,
}

/// Encode one record as a complete checksummed frame.
pub(crate) fn encode_frame(id: VectorId, label: Label, embedding: &[f32]) -> Result<Vec<u8>> {
    let payload = bincode::serialize(&StoredRecord {
        id: id.as_u64(),
        label: label.as_u32(),
        embedding: embedding.to_vec(),
    })?;

    let len = u32::try_from(payload.len())
        .map_err(|_| ForgeKnnError::serialization_error("record too large for a frame"))?;
    let checksum = crc32fast::hash(&payload);

    let mut frame = Vec::with_capacity(FRAME_PREFIX_SIZE + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&checksum.to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Read the frame starting at `offset`.
///
/// Returns `Ok(None)` on a clean end of file, and the decoded record plus the
/// frame's size otherwise.
pub(crate) fn read_frame<R: Read>(
    reader: &mut R,
    offset: u64,
) -> Result<Option<(VectorRecord, u64)>> {
    let mut prefix = [0u8; FRAME_PREFIX_SIZE];
    match read_full(reader, &mut prefix)? {
        0 => return Ok(None),
        n if n < FRAME_PREFIX_SIZE => {
            return Err(ForgeKnnError::invalid_format(format!(
                "truncated frame header at byte offset {}",
                offset
            )))
        }
        _ => {}
    }

    let len = read_u32(&prefix[0..4]) as usize;
    let checksum = read_u32(&prefix[4..8]);
    if len > MAX_FRAME_BYTES {
        return Err(ForgeKnnError::invalid_format(format!(
            "frame at byte offset {} claims {} bytes",
            offset, len
        )));
    }

    let mut payload = vec![0u8; len];
    if read_full(reader, &mut payload)? < len {
        return Err(ForgeKnnError::invalid_format(format!(
            "truncated frame body at byte offset {}",
            offset
        )));
    }

    if crc32fast::hash(&payload) != checksum {
        return Err(ForgeKnnError::ChecksumMismatch { offset });
    }

    let stored: StoredRecord = bincode::deserialize(&payload)?;
    let record = VectorRecord::new(VectorId(stored.id), Label(stored.label), stored.embedding);
    Ok(Some((record, (FRAME_PREFIX_SIZE + len) as u64)))
}

/// Like `read_exact`, but reports how many bytes were read before EOF.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_roundtrip() {
        let header = FileHeader::new(784);
        let parsed = FileHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.dimension, 784);
    }

    #[test]
    fn test_invalid_magic() {
        let mut bytes = [0u8; FileHeader::SIZE];
        bytes[0..8].copy_from_slice(b"FORGEDB\0");
        let err = FileHeader::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ForgeKnnError::InvalidFormat(_)));
    }

    #[test]
    fn test_future_version_rejected() {
        let mut header = FileHeader::new(2);
        header.version = FORMAT_VERSION + 1;
        assert!(FileHeader::from_bytes(&header.to_bytes()).is_err());
    }

    #[test]
    fn test_frame_then_clean_eof() {
        let buf = encode_frame(VectorId(7), Label(3), &[0.25, 0.5]).unwrap();
        let written = buf.len() as u64;

        let mut cursor = Cursor::new(buf);
        let (record, size) = read_frame(&mut cursor, 0).unwrap().unwrap();
        assert_eq!(record.id, VectorId(7));
        assert_eq!(record.label, Label(3));
        assert_eq!(&record.embedding[..], &[0.25, 0.5]);
        assert_eq!(size, written);
        assert!(read_frame(&mut cursor, size).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_payload_detected() {
        let mut buf = encode_frame(VectorId(0), Label(1), &[1.0, 2.0, 3.0]).unwrap();
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;

        let err = read_frame(&mut Cursor::new(buf), 24).unwrap_err();
        assert!(matches!(err, ForgeKnnError::ChecksumMismatch { offset: 24 }));
    }

    #[test]
    fn test_truncated_frame_detected() {
        let mut buf = encode_frame(VectorId(0), Label(1), &[1.0, 2.0, 3.0]).unwrap();
        buf.truncate(buf.len() - 2);

        let err = read_frame(&mut Cursor::new(buf), 0).unwrap_err();
        assert!(matches!(err, ForgeKnnError::InvalidFormat(_)));
    }
}
