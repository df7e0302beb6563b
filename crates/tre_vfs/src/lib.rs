//! This library reads **TRE** archives used by *Star Wars Galaxies* and merges
//! stacks of them into one prioritized virtual file tree.
//!
//! # TRE Archive Format Documentation
//!
//! The TRE format is a custom binary container that stores game assets within a
//! single file, typically identified with the `.tre` extension. A TRE file
//! consists of a header, the raw data region, a record metadata block, a name
//! block, and a checksum block.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: 0x54524545 ("TREE")                               |
//! | 0x0004         | Version                | 4 bytes: 0x30303035 ("0005") or 0x30303036 ("0006")        |
//! | 0x0008         | Record Count           | 4 bytes: Number of records in the archive                  |
//! | 0x000C         | Record Offset          | 4 bytes: Offset to the record metadata block               |
//! | 0x0010         | Record Compression     | 4 bytes: Compression level for the record block            |
//! | 0x0014         | Record Comp. Size      | 4 bytes: Compressed size of the record block               |
//! | 0x0018         | Name Compression       | 4 bytes: Compression level for the name block              |
//! | 0x001C         | Name Comp. Size        | 4 bytes: Compressed size of the name block                 |
//! | 0x0020         | Name Uncomp. Size      | 4 bytes: Uncompressed size of the name block               |
//!
//! ## Data region
//!
//! The raw bytes of every archived file, stored back to back directly after the
//! header. Each record points into this region with an absolute file offset;
//! the bytes are either stored as-is or zlib compressed, per record.
//!
//! ## Record metadata block
//!
//! Starts at **Record Offset** and inflates to 24 bytes per record. Each
//! record is six little-endian 32-bit integers:
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | CRC32                  | 4 bytes: CRC-32 checksum of the record's name           |
//! | 0x0004         | Uncompressed Size      | 4 bytes: Size of the data when uncompressed             |
//! | 0x0008         | Data Offset            | 4 bytes: Offset of the data from the start of the file  |
//! | 0x000C         | Compression            | 4 bytes: Compression level for the record data          |
//! | 0x0010         | Compressed Size        | 4 bytes: Compressed size of the record data             |
//! | 0x0014         | Name Offset            | 4 bytes: Offset of the name within the name block       |
//!
//! A compression level of `0` means the data is stored uncompressed; any other
//! value means a zlib stream. Stored records may write `0` for the compressed
//! size, in which case it equals the uncompressed size.
//!
//! ## Name block
//!
//! Follows the record block. Inflates to **Name Uncomp. Size** bytes holding
//! the full forward-slash delimited path of every record as sequential
//! NUL-terminated strings, referenced by each record's name offset.
//!
//! ## Checksum block
//!
//! Follows the name block directly and is never compressed: one 16-byte MD5
//! digest per record, in record order, covering the record's data bytes as
//! they sit in the archive. The SOE launcher used this block during its file
//! scan to decide whether TREE data needed to be refreshed.
//!
//! # Overlay merging
//!
//! The game ships dozens of TRE files that layer on top of each other, so the
//! same logical path can be defined by several archives. [`TreeOverlay`]
//! resolves this: archives are merged in rank order (rank 0 first, the
//! highest priority) and the highest-ranked archive's copy of a path is the
//! one that stays visible. Entries keep only offsets and lengths plus the
//! path of their owning archive; data is read back on demand with
//! [`TreeEntry::read_bytes`].
//!
//! ```no_run
//! fn list_shared(paths: &[std::path::PathBuf]) -> tre_vfs::error::Result<()> {
//!     let overlay = tre_vfs::TreeOverlay::new();
//!     for failure in overlay.merge_all(paths) {
//!         eprintln!("skipped {}: {}", failure.archive.display(), failure.error);
//!     }
//!
//!     for name in overlay.list_by_prefix("datatables/") {
//!         println!("{name}");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod compression;
pub mod error;
pub mod overlay;
pub mod read;
pub mod types;

pub use overlay::TreeOverlay;
pub use read::{TreeArchive, TreeEntry};
