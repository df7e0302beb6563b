//! Helpers for building TRE archive images in memory and staging them as
//! temporary files.
#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use flate2::{write::ZlibEncoder, Compression};
use md5::{Digest, Md5};

pub const STORED: u32 = 0;
pub const ZLIB: u32 = 2;

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// One file to place in a built archive: name, contents, compression level.
pub type SourceFile<'a> = (&'a str, &'a [u8], u32);

/// Assemble a complete archive image: header, data region, record block,
/// name block, checksum block. `block_level` applies to the record and name
/// blocks; each file's data uses its own level.
pub fn build_archive(version: &[u8; 4], files: &[SourceFile], block_level: u32) -> Vec<u8> {
    let crc = crc::Crc::<u32>::new(&crc::CRC_32_BZIP2);

    let mut data_region = Vec::new();
    let mut records = Vec::new();
    let mut names = Vec::new();
    let mut checksums = Vec::new();

    for (name, data, level) in files {
        let on_disk = if *level == STORED {
            data.to_vec()
        } else {
            zlib(data)
        };

        let name_offset = names.len() as u32;
        names.extend_from_slice(name.as_bytes());
        names.push(0);

        records.extend_from_slice(&crc.checksum(name.as_bytes()).to_le_bytes());
        records.extend_from_slice(&(data.len() as u32).to_le_bytes());
        records.extend_from_slice(&(36 + data_region.len() as u32).to_le_bytes());
        records.extend_from_slice(&level.to_le_bytes());
        records.extend_from_slice(&(on_disk.len() as u32).to_le_bytes());
        records.extend_from_slice(&name_offset.to_le_bytes());

        checksums.extend_from_slice(&Md5::digest(&on_disk));
        data_region.extend_from_slice(&on_disk);
    }

    let records_block = if block_level == STORED {
        records.clone()
    } else {
        zlib(&records)
    };
    let names_block = if block_level == STORED {
        names.clone()
    } else {
        zlib(&names)
    };

    let mut image = Vec::new();
    image.extend_from_slice(b"EERT");
    image.extend_from_slice(version);
    image.extend_from_slice(&(files.len() as u32).to_le_bytes());
    image.extend_from_slice(&(36 + data_region.len() as u32).to_le_bytes());
    image.extend_from_slice(&block_level.to_le_bytes());
    image.extend_from_slice(&(records_block.len() as u32).to_le_bytes());
    image.extend_from_slice(&block_level.to_le_bytes());
    image.extend_from_slice(&(names_block.len() as u32).to_le_bytes());
    image.extend_from_slice(&(names.len() as u32).to_le_bytes());
    image.extend_from_slice(&data_region);
    image.extend_from_slice(&records_block);
    image.extend_from_slice(&names_block);
    image.extend_from_slice(&checksums);

    image
}

/// Write `bytes` to a uniquely named file in the system temp directory.
/// Callers remove it when they are done.
pub fn stage(tag: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("tre_vfs_{}_{tag}.tre", std::process::id()));
    std::fs::write(&path, bytes).unwrap();
    path
}
