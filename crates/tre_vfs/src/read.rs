//! Parsing TRE containers and reading entry data back on demand.

use binrw::BinRead;
use md5::{Digest, Md5};
use memmap2::Mmap;
use std::{
    fs::File,
    io::{self, Cursor, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::debug;

use crate::{
    compression::{inflate, STORED},
    error::{FormatError, Result},
    types::{TreeHeader, TreeRecord, MD5_SIZE, RECORD_SIZE},
};

/// One logical file bound to the archive that stores its bytes.
///
/// An entry carries only offsets and lengths; the data itself stays in the
/// archive file until [`TreeEntry::read_bytes`] is called. Entries outlive
/// the [`TreeArchive`] they were parsed from.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    /// Full forward-slash delimited path of the file inside the archive
    ///
    /// # Warnings
    ///
    /// It is dangerous to use this name directly when extracting an archive.
    /// It may contain an absolute path (`/etc/shadow`), or break out of the
    /// current directory (`../runtime`). Carelessly writing to these paths
    /// allows an attacker to craft a TRE archive that will overwrite critical
    /// files.
    pub name: String,

    /// CRC-32 checksum of the entry's name
    pub checksum: u32,

    /// MD5 digest of the entry's data as stored in the archive
    pub md5: [u8; MD5_SIZE],

    /// Compression level of the data, 0 for stored
    pub compression_level: u32,

    /// Size of the data as stored in the archive
    pub deflated_size: u32,

    /// Size of the data once inflated
    pub inflated_size: u32,

    /// Offset of the data from the start of the archive
    pub data_offset: u32,

    pub(crate) archive_path: Arc<PathBuf>,
}

impl TreeEntry {
    /// The archive file that owns this entry's bytes.
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Whether the data is stored without compression.
    pub fn is_stored(&self) -> bool {
        self.compression_level == STORED
    }

    /// Re-read this entry's data from its owning archive and inflate it.
    ///
    /// Every call opens its own handle and returns its own buffer, so
    /// concurrent extraction needs no coordination. A failure is scoped to
    /// this call; the entry and any overlay holding it stay valid. An archive
    /// that was moved or truncated since parse time surfaces as
    /// [`Error::Io`](crate::error::Error::Io).
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        let deflated = self.deflated_bytes()?;
        Ok(inflate(
            &deflated,
            self.compression_level,
            self.inflated_size as usize,
        )?)
    }

    /// Check the entry's data against the MD5 digest from the checksum block.
    ///
    /// The digest covers the bytes as they sit in the archive, before
    /// inflation.
    pub fn verify_md5(&self) -> Result<bool> {
        let deflated = self.deflated_bytes()?;
        Ok(Md5::digest(&deflated).as_slice() == self.md5)
    }

    /// Check the record checksum against the entry's name.
    pub fn verify_name_checksum(&self) -> bool {
        self.checksum == TreeRecord::checksum_of(&self.name)
    }

    fn deflated_bytes(&self) -> Result<Vec<u8>> {
        let file = File::open(self.archive_path.as_ref())?;
        // Archives run to hundreds of megabytes and entries are random
        // access, so map the file instead of seeking through it.
        let map = unsafe { Mmap::map(&file)? };

        let start = self.data_offset as usize;
        let end = start + self.deflated_size as usize;
        let data = map.get(start..end).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "{} is shorter than expected for entry {}",
                    self.archive_path.display(),
                    self.name
                ),
            )
        })?;

        Ok(data.to_vec())
    }
}

/// A parsed TRE container.
///
/// Parsing is a single forward pass: header, record block, name block,
/// checksum block. Only fully bound entries are kept; the blocks themselves
/// are discarded once parsing finishes.
///
/// ```no_run
/// fn list_tre_contents(path: &std::path::Path) -> tre_vfs::error::Result<()> {
///     let archive = tre_vfs::TreeArchive::open(path)?;
///
///     for entry in archive.entries() {
///         println!("{} ({} bytes)", entry.name, entry.inflated_size);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct TreeArchive {
    path: Arc<PathBuf>,
    header: TreeHeader,
    entries: Vec<TreeEntry>,
}

impl TreeArchive {
    /// Parse the TRE container at `path`, collecting the entries it contains.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::from_reader(File::open(path)?, path)
    }

    /// Parse a TRE container from any seekable reader.
    ///
    /// `path` is recorded as the owning archive of the produced entries, so
    /// it must point at the same bytes for [`TreeEntry::read_bytes`] to work
    /// later.
    pub fn from_reader<R: Read + Seek>(mut reader: R, path: impl Into<PathBuf>) -> Result<Self> {
        let path = Arc::new(path.into());

        let archive_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let header = TreeHeader::read(&mut reader)?;
        header.validate()?;

        let total = header.total_records as usize;

        reader.seek(SeekFrom::Start(header.records_offset as u64))?;
        let records = read_block(
            &mut reader,
            header.records_deflated_size,
            header.records_compression_level,
            RECORD_SIZE * total,
        )?;
        let names = read_block(
            &mut reader,
            header.names_deflated_size,
            header.names_compression_level,
            header.names_inflated_size as usize,
        )?;

        // The checksum block follows the name block directly and is never
        // compressed.
        let mut checksums = vec![0u8; MD5_SIZE * total];
        reader.read_exact(&mut checksums)?;

        let mut record_reader = Cursor::new(records);
        let mut entries = Vec::with_capacity(total);
        for index in 0..total {
            let record = TreeRecord::decode(&mut record_reader)?;

            if u64::from(record.data_offset) + u64::from(record.deflated_size) > archive_len {
                return Err(FormatError::DataOutOfBounds {
                    offset: record.data_offset,
                    size: record.deflated_size,
                    archive_len,
                }
                .into());
            }

            let name = resolve_name(&names, record.name_offset)?;
            let mut md5 = [0u8; MD5_SIZE];
            md5.copy_from_slice(&checksums[index * MD5_SIZE..(index + 1) * MD5_SIZE]);

            entries.push(TreeEntry {
                name,
                checksum: record.checksum,
                md5,
                compression_level: record.compression_level,
                deflated_size: record.deflated_size,
                inflated_size: record.inflated_size,
                data_offset: record.data_offset,
                archive_path: Arc::clone(&path),
            });
        }

        debug!(path = %path.display(), entries = entries.len(), "parsed tre container");

        Ok(Self {
            path,
            header,
            entries,
        })
    }

    /// The path this archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The version tag found in the header, "0005" or "0006".
    pub fn version_tag(&self) -> String {
        self.header.version_tag()
    }

    /// Number of entries contained in this archive.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this archive contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries in on-disk record order.
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Consume the archive, keeping only its entries.
    pub fn into_entries(self) -> Vec<TreeEntry> {
        self.entries
    }
}

fn read_block<R: Read>(
    reader: &mut R,
    deflated_size: u32,
    compression_level: u32,
    inflated_size: usize,
) -> Result<Vec<u8>> {
    let mut deflated = vec![0u8; deflated_size as usize];
    reader.read_exact(&mut deflated)?;
    Ok(inflate(&deflated, compression_level, inflated_size)?)
}

/// Scan the name block from `offset` up to the NUL terminator.
///
/// A name that starts outside the block, or runs off its end without a
/// terminator, fails the record instead of reading unrelated memory.
fn resolve_name(names: &[u8], offset: u32) -> Result<String> {
    let start = offset as usize;
    let invalid = || FormatError::InvalidNameOffset {
        offset,
        names_len: names.len() as u32,
    };

    if start >= names.len() {
        return Err(invalid().into());
    }

    let end = names[start..]
        .iter()
        .position(|&byte| byte == 0)
        .map(|nul| start + nul)
        .ok_or_else(invalid)?;

    Ok(String::from_utf8_lossy(&names[start..end]).into_owned())
}
