use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Read, Write};

use super::{magic_str, ContainerError, SectionContext};

pub const MAGIC: &[u8; 4] = b"XABA";
/// On-disk size of [`FileHeader`].
pub const FILE_HEADER_SIZE: usize = 20;

/// Fixed 20-byte header at offset 0 of every blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileHeader {
    #[serde(serialize_with = "magic_str")]
    pub magic: [u8; 4],
    pub version: u32,
    /// Entries stored in this file.
    pub local_entry_count: u32,
    /// Entries across every cooperating store; may exceed the local count.
    pub global_entry_count: u32,
    pub store_id: u32,
}

impl FileHeader {
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u32::<LittleEndian>(self.local_entry_count)?;
        writer.write_u32::<LittleEndian>(self.global_entry_count)?;
        writer.write_u32::<LittleEndian>(self.store_id)?;
        Ok(())
    }

    /// Reads and validates the header.  Fails on the magic before touching
    /// the remaining fields.
    pub fn read<R: Read>(mut reader: R) -> Result<Self, ContainerError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).section("file header")?;
        if &magic != MAGIC {
            return Err(ContainerError::invalid_magic("file header", MAGIC, &magic));
        }
        let mut fields = || -> io::Result<[u32; 4]> {
            Ok([
                reader.read_u32::<LittleEndian>()?,
                reader.read_u32::<LittleEndian>()?,
                reader.read_u32::<LittleEndian>()?,
                reader.read_u32::<LittleEndian>()?,
            ])
        };
        let [version, local_entry_count, global_entry_count, store_id] =
            fields().section("file header")?;
        Ok(Self {
            magic,
            version,
            local_entry_count,
            global_entry_count,
            store_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileHeader {
        FileHeader {
            magic: *MAGIC,
            version: 1,
            local_entry_count: 2,
            global_entry_count: 5,
            store_id: 3,
        }
    }

    #[test]
    fn layout_is_little_endian_and_20_bytes() {
        let mut buf = Vec::new();
        sample().write(&mut buf).unwrap();
        assert_eq!(buf.len(), FILE_HEADER_SIZE);
        assert_eq!(
            buf,
            [
                b'X', b'A', b'B', b'A',
                1, 0, 0, 0,
                2, 0, 0, 0,
                5, 0, 0, 0,
                3, 0, 0, 0,
            ]
        );
        assert_eq!(FileHeader::read(buf.as_slice()).unwrap(), sample());
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut buf = Vec::new();
        sample().write(&mut buf).unwrap();
        buf[..4].copy_from_slice(b"XALZ");
        match FileHeader::read(buf.as_slice()) {
            Err(ContainerError::InvalidMagic { section, found, .. }) => {
                assert_eq!(section, "file header");
                assert_eq!(found, "XALZ");
            }
            other => panic!("expected InvalidMagic, got {other:?}"),
        }
    }

    #[test]
    fn short_header_is_truncated() {
        let err = FileHeader::read(&b"XABA\x01\x00"[..]).unwrap_err();
        assert!(matches!(err, ContainerError::Truncated { section: "file header" }));
    }
}
