use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Read, Write};

use super::{magic_str, ContainerError, SectionContext};

pub const DATA_MAGIC: &[u8; 4] = b"XALZ";
/// Size of the fixed part of a data entry; the payload follows it.
pub const DATA_ENTRY_HEADER_SIZE: usize = 12;

/// One compressed payload with its 12-byte header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataEntry {
    #[serde(serialize_with = "magic_str")]
    pub magic: [u8; 4],
    pub index: u32,
    /// Decompressed payload length.
    pub original_size: u32,
    #[serde(skip)]
    pub payload: Vec<u8>,
}

impl DataEntry {
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u32::<LittleEndian>(self.index)?;
        writer.write_u32::<LittleEndian>(self.original_size)?;
        writer.write_all(&self.payload)?;
        Ok(())
    }

    /// Reads one entry whose descriptor declares `data_size` bytes in total.
    pub fn read<R: Read>(mut reader: R, data_size: i32) -> Result<Self, ContainerError> {
        let payload_len = usize::try_from(data_size)
            .ok()
            .and_then(|size| size.checked_sub(DATA_ENTRY_HEADER_SIZE))
            .ok_or(ContainerError::InvalidDataSize {
                size: data_size,
                min: DATA_ENTRY_HEADER_SIZE,
            })?;

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).section("data entry header")?;
        if &magic != DATA_MAGIC {
            return Err(ContainerError::invalid_magic("data entry", DATA_MAGIC, &magic));
        }
        let index = reader.read_u32::<LittleEndian>().section("data entry header")?;
        let original_size = reader.read_u32::<LittleEndian>().section("data entry header")?;

        // Sized by what is actually present, not by the declared length.
        let mut payload = Vec::new();
        reader
            .by_ref()
            .take(payload_len as u64)
            .read_to_end(&mut payload)
            .section("data entry payload")?;
        if payload.len() != payload_len {
            return Err(ContainerError::Truncated { section: "data entry payload" });
        }

        Ok(Self { magic, index, original_size, payload })
    }

    /// Size of the full on-disk record.
    pub fn record_size(&self) -> usize {
        DATA_ENTRY_HEADER_SIZE + self.payload.len()
    }
}
