//! Base types for the structure of a TRE file.

use binrw::{BinRead, BinResult};
use std::io::{Read, Seek};

use crate::compression::STORED;
use crate::error::FormatError;

/// "TREE" read as a little-endian u32, the first four bytes of every archive.
pub const TREE_MAGIC: u32 = 0x5452_4545;

/// The version tag "0005".
pub const VERSION_0005: u32 = 0x3030_3035;

/// The version tag "0006".
pub const VERSION_0006: u32 = 0x3030_3036;

/// Size of one record in the inflated record block.
pub const RECORD_SIZE: usize = 24;

/// Size of one MD5 digest in the checksum block.
pub const MD5_SIZE: usize = 16;

/// TRE file header
///
/// Nine little-endian 32-bit fields. The magic and version are kept as raw
/// values so that [`TreeHeader::validate`] can report exactly what was found.
#[derive(BinRead, Debug, Copy, Clone, PartialEq)]
#[br(little)]
pub struct TreeHeader {
    /// The magic number, "TREE" for a valid archive
    pub file_id: u32,

    /// The format version tag, "0005" or "0006"
    pub version: u32,

    /// The number of records stored in the file
    pub total_records: u32,

    /// The offset from the beginning of the file where the record block starts
    pub records_offset: u32,

    /// The compression level of the record block
    pub records_compression_level: u32,

    /// The on-disk size of the record block
    pub records_deflated_size: u32,

    /// The compression level of the name block
    pub names_compression_level: u32,

    /// The on-disk size of the name block
    pub names_deflated_size: u32,

    /// The size of the name block once inflated
    pub names_inflated_size: u32,
}

impl TreeHeader {
    /// Check the magic number and version tag.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.file_id != TREE_MAGIC {
            return Err(FormatError::BadMagic {
                found: self.file_id,
            });
        }
        if self.version != VERSION_0005 && self.version != VERSION_0006 {
            return Err(FormatError::UnsupportedVersion {
                tag: version_tag(self.version),
            });
        }
        Ok(())
    }

    /// The version as the four character tag it reads as in a hex dump.
    pub fn version_tag(&self) -> String {
        version_tag(self.version)
    }
}

fn version_tag(version: u32) -> String {
    String::from_utf8_lossy(&version.to_be_bytes()).into_owned()
}

/// TRE file record
///
/// One fixed 24-byte entry from the record block. Field order matches the
/// on-disk layout. The record knows nothing about names or digests; the
/// archive parser binds those through `name_offset` and the record's position.
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(little)]
pub struct TreeRecord {
    /// A [`crc::CRC_32_BZIP2`] checksum of the record's name
    pub checksum: u32,

    /// The size of the record's data once inflated
    pub inflated_size: u32,

    /// The offset of the record's data from the start of the file
    pub data_offset: u32,

    /// The compression level of the record's data, 0 for stored
    pub compression_level: u32,

    /// The on-disk size of the record's data
    pub deflated_size: u32,

    /// The offset of the record's name within the inflated name block
    pub name_offset: u32,
}

impl TreeRecord {
    /// Decode one record from the inflated record block.
    ///
    /// Stored records may omit the redundant deflated size; it is normalized
    /// to the inflated size here, before anything else sees the record.
    pub fn decode<R: Read + Seek>(reader: &mut R) -> BinResult<Self> {
        let mut record = Self::read(reader)?;
        if record.compression_level == STORED && record.deflated_size == 0 {
            record.deflated_size = record.inflated_size;
        }
        Ok(record)
    }

    /// The CRC-32 the container stores for an entry with the given name.
    pub fn checksum_of(name: &str) -> u32 {
        crc::Crc::<u32>::new(&crc::CRC_32_BZIP2).checksum(name.as_bytes())
    }
}
