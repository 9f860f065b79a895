//! The binary assembly blob (`XABA`) — read, write and in-place replace.
//!
//! # Layout
//! ```text
//! FileHeader                      20 B
//! AssemblyDescriptor × N          24 B each
//! HashEntry × N  (hash32 table)   20 B each
//! HashEntry × N  (hash64 table)   20 B each
//! DataEntry × N                   12 B header + payload
//! ```
//! `N` is `local_entry_count`.  All integers are little-endian.  Data
//! entries are packed back to back: entry `i + 1` starts where entry `i`
//! ends, and `descriptors[i].data_size` is the full record size of entry
//! `i`.  Bytes after the last data entry are ignored on read and dropped on
//! write.
//!
//! # Round-trip
//! Every field keeps the value it had on disk, so reading and writing an
//! unmodified container reproduces the input byte for byte (up to the
//! ignored trailer).

pub mod data_entry;
pub mod descriptor;
pub mod hash_entry;
pub mod header;

use std::io::{self, Read, Write};
use std::path::Path;

use serde::Serializer;
use thiserror::Error;
use tracing::{debug, info};

use crate::codec::{Codec, CodecError};

pub use data_entry::{DataEntry, DATA_ENTRY_HEADER_SIZE, DATA_MAGIC};
pub use descriptor::{AssemblyDescriptor, DESCRIPTOR_SIZE};
pub use hash_entry::{HashEntry, HASH_ENTRY_SIZE};
pub use header::{FileHeader, FILE_HEADER_SIZE, MAGIC};

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Invalid {section} magic: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        section:  &'static str,
        expected: String,
        found:    String,
    },
    #[error("Truncated blob while reading {section}")]
    Truncated { section: &'static str },
    #[error("Data size {size} is smaller than the {min}-byte data entry header")]
    InvalidDataSize { size: i32, min: usize },
    #[error("Entry index {index} out of range (blob holds {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Entry {index} no longer fits 32-bit sizes and offsets")]
    SizeOverflow { index: usize },
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ContainerError {
    pub(crate) fn invalid_magic(section: &'static str, expected: &[u8; 4], found: &[u8; 4]) -> Self {
        ContainerError::InvalidMagic {
            section,
            expected: String::from_utf8_lossy(expected).into_owned(),
            found:    String::from_utf8_lossy(found).into_owned(),
        }
    }
}

/// Tags an I/O failure with the record being read.  A short read becomes
/// [`ContainerError::Truncated`]; anything else stays an I/O error.
pub(crate) trait SectionContext<T> {
    fn section(self, section: &'static str) -> Result<T, ContainerError>;
}

impl<T> SectionContext<T> for io::Result<T> {
    fn section(self, section: &'static str) -> Result<T, ContainerError> {
        self.map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => ContainerError::Truncated { section },
            _ => ContainerError::Io(e),
        })
    }
}

pub(crate) fn magic_str<S: Serializer>(magic: &[u8; 4], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(magic))
}

// ── Container ────────────────────────────────────────────────────────────────

/// A fully loaded blob.  The four tables are parallel: index `i` of each
/// describes the same entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub file_header:    FileHeader,
    pub descriptors:    Vec<AssemblyDescriptor>,
    pub hash32_entries: Vec<HashEntry>,
    pub hash64_entries: Vec<HashEntry>,
    pub data_entries:   Vec<DataEntry>,
}

impl Container {
    // ── Read ─────────────────────────────────────────────────────────────────

    /// Parse a blob from `reader`, positioned at its first byte.
    ///
    /// All-or-nothing: any bad magic or short read aborts with no partial
    /// result.
    pub fn read<R: Read>(mut reader: R) -> Result<Self, ContainerError> {
        let file_header = FileHeader::read(&mut reader)?;
        let count = file_header.local_entry_count as usize;
        debug!(
            version = file_header.version,
            local = file_header.local_entry_count,
            global = file_header.global_entry_count,
            store_id = file_header.store_id,
            "read blob header"
        );

        // Counts come from the file; grow as records arrive rather than
        // trusting them for an up-front allocation.
        let mut descriptors = Vec::new();
        for _ in 0..count {
            descriptors.push(AssemblyDescriptor::read(&mut reader).section("assembly descriptor")?);
        }
        let mut hash32_entries = Vec::new();
        for _ in 0..count {
            hash32_entries.push(HashEntry::read(&mut reader).section("hash32 table")?);
        }
        let mut hash64_entries = Vec::new();
        for _ in 0..count {
            hash64_entries.push(HashEntry::read(&mut reader).section("hash64 table")?);
        }

        let mut data_entries = Vec::with_capacity(descriptors.len());
        for (i, d) in descriptors.iter().enumerate() {
            let entry = DataEntry::read(&mut reader, d.data_size)?;
            debug!(
                entry = i,
                offset = d.data_offset,
                size = d.data_size,
                original_size = entry.original_size,
                "read data entry"
            );
            data_entries.push(entry);
        }

        Ok(Self {
            file_header,
            descriptors,
            hash32_entries,
            hash64_entries,
            data_entries,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContainerError> {
        Self::read(bytes)
    }

    /// Load a whole blob file into memory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "loading blob");
        Self::from_bytes(&bytes)
    }

    // ── Write ────────────────────────────────────────────────────────────────

    /// Serialize in on-disk order.  No validation happens here.
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        self.file_header.write(&mut writer)?;
        for d in &self.descriptors {
            d.write(&mut writer)?;
        }
        for e in &self.hash32_entries {
            e.write(&mut writer)?;
        }
        for e in &self.hash64_entries {
            e.write(&mut writer)?;
        }
        for e in &self.data_entries {
            e.write(&mut writer)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());
        self.write(&mut out).expect("writing to a Vec cannot fail");
        out
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes();
        std::fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "wrote blob");
        Ok(())
    }

    /// Byte length of [`Container::write`]'s output.
    pub fn serialized_len(&self) -> usize {
        FILE_HEADER_SIZE
            + self.descriptors.len() * DESCRIPTOR_SIZE
            + (self.hash32_entries.len() + self.hash64_entries.len()) * HASH_ENTRY_SIZE
            + self.data_entries.iter().map(DataEntry::record_size).sum::<usize>()
    }

    // ── Access ───────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.data_entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_entries.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<(), ContainerError> {
        let len = self.data_entries.len().min(self.descriptors.len());
        if index >= len {
            return Err(ContainerError::IndexOutOfRange { index, len: self.len() });
        }
        Ok(())
    }

    /// Decompressed content of entry `index`.
    pub fn decompress(&self, index: usize, codec: &dyn Codec) -> Result<Vec<u8>, ContainerError> {
        self.check_index(index)?;
        let entry = &self.data_entries[index];
        Ok(codec.decompress(&entry.payload, entry.original_size as usize)?)
    }

    // ── Mutation ─────────────────────────────────────────────────────────────

    /// Replace the content of entry `index` with `data`, recompressing it
    /// with `codec`.
    ///
    /// The entry's `data_size` grows or shrinks by the change in compressed
    /// length and every later descriptor's `data_offset` shifts by the same
    /// amount, so entries stay packed back to back.  Nothing else moves: the
    /// debug/config fields and other entries' payloads are left as they are.
    ///
    /// Every new value is computed before anything is written, so on error
    /// the container is unchanged.
    pub fn replace(&mut self, index: usize, data: &[u8], codec: &dyn Codec) -> Result<(), ContainerError> {
        self.check_index(index)?;
        let overflow = || ContainerError::SizeOverflow { index };

        let compressed = codec.compress(data)?;
        let original_size = u32::try_from(data.len()).map_err(|_| overflow())?;
        let old_len = i64::try_from(self.data_entries[index].payload.len()).map_err(|_| overflow())?;
        let new_len = i64::try_from(compressed.len()).map_err(|_| overflow())?;
        let delta = i32::try_from(new_len - old_len).map_err(|_| overflow())?;

        let data_size = self.descriptors[index]
            .data_size
            .checked_add(delta)
            .ok_or_else(overflow)?;
        let shifted = self.descriptors[index + 1..]
            .iter()
            .map(|d| d.data_offset.checked_add(delta).ok_or_else(overflow))
            .collect::<Result<Vec<i32>, _>>()?;

        self.descriptors[index].data_size = data_size;
        let entry = &mut self.data_entries[index];
        entry.original_size = original_size;
        entry.payload = compressed;
        for (d, offset) in self.descriptors[index + 1..].iter_mut().zip(shifted) {
            d.data_offset = offset;
        }

        info!(
            entry = index,
            original_size,
            data_size,
            delta,
            shifted = self.descriptors.len() - index - 1,
            "replaced entry"
        );
        Ok(())
    }
}
