use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Read, Write};

/// On-disk size of [`AssemblyDescriptor`].
pub const DESCRIPTOR_SIZE: usize = 24;

/// Offsets and sizes for one entry.  All six fields are signed 32-bit.
///
/// `data_size` covers the whole data entry record, header included.  The
/// debug and config pairs point into a cooperating store and are carried
/// through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AssemblyDescriptor {
    pub data_offset: i32,
    pub data_size: i32,
    pub debug_data_offset: i32,
    pub debug_data_size: i32,
    pub config_data_offset: i32,
    pub config_data_size: i32,
}

impl AssemblyDescriptor {
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_i32::<LittleEndian>(self.data_offset)?;
        writer.write_i32::<LittleEndian>(self.data_size)?;
        writer.write_i32::<LittleEndian>(self.debug_data_offset)?;
        writer.write_i32::<LittleEndian>(self.debug_data_size)?;
        writer.write_i32::<LittleEndian>(self.config_data_offset)?;
        writer.write_i32::<LittleEndian>(self.config_data_size)?;
        Ok(())
    }

    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        Ok(Self {
            data_offset: reader.read_i32::<LittleEndian>()?,
            data_size: reader.read_i32::<LittleEndian>()?,
            debug_data_offset: reader.read_i32::<LittleEndian>()?,
            debug_data_size: reader.read_i32::<LittleEndian>()?,
            config_data_offset: reader.read_i32::<LittleEndian>()?,
            config_data_size: reader.read_i32::<LittleEndian>()?,
        })
    }

    /// First byte past this entry's data record.
    pub fn data_end(&self) -> i64 {
        i64::from(self.data_offset) + i64::from(self.data_size)
    }
}
