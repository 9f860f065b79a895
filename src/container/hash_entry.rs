use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Read, Write};

/// On-disk size of [`HashEntry`].
pub const HASH_ENTRY_SIZE: usize = 20;

/// One row of the hash32 or hash64 lookup table.
///
/// In the hash32 table `hash` holds the 32-bit digest zero-extended.  Rows
/// are kept in file order; nothing here searches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HashEntry {
    pub hash: u64,
    pub mapping_index: u32,
    pub local_store_index: u32,
    pub store_id: u32,
}

impl HashEntry {
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u64::<LittleEndian>(self.hash)?;
        writer.write_u32::<LittleEndian>(self.mapping_index)?;
        writer.write_u32::<LittleEndian>(self.local_store_index)?;
        writer.write_u32::<LittleEndian>(self.store_id)?;
        Ok(())
    }

    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        Ok(Self {
            hash: reader.read_u64::<LittleEndian>()?,
            mapping_index: reader.read_u32::<LittleEndian>()?,
            local_store_index: reader.read_u32::<LittleEndian>()?,
            store_id: reader.read_u32::<LittleEndian>()?,
        })
    }
}
