//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Structural problems found while parsing a TRE container.
///
/// Any of these abandons the whole archive's parse; no partial entries are
/// ever produced.
#[derive(Error, Diagnostic, Debug)]
pub enum FormatError {
    /// file does not start with the "TREE" magic
    #[error("file does not start with the TREE magic (found {found:#010x})")]
    BadMagic {
        /// The value found in the first four bytes
        found: u32,
    },

    /// version tag is neither "0005" nor "0006"
    #[error("unsupported TRE version \"{tag}\"")]
    UnsupportedVersion {
        /// The four character tag found in the header
        tag: String,
    },

    /// a record's name offset points outside the name block
    #[error("record name offset {offset} is outside the name block ({names_len} bytes)")]
    InvalidNameOffset {
        /// The offending offset
        offset: u32,
        /// The inflated length of the name block
        names_len: u32,
    },

    /// a record's data runs past the end of the archive file
    #[error("record data at {offset}+{size} runs past the end of the archive ({archive_len} bytes)")]
    DataOutOfBounds {
        /// Offset of the data from the start of the archive
        offset: u32,
        /// On-disk size of the data
        size: u32,
        /// Total length of the archive file
        archive_len: u64,
    },
}

/// Failures while inflating a compressed block or a single entry's data.
#[derive(Error, Diagnostic, Debug)]
pub enum DecompressionError {
    /// the zlib stream was truncated or malformed
    #[error("corrupt zlib stream")]
    CorruptStream(#[source] std::io::Error),

    /// a stored block does not match its declared size
    #[error("stored block is {actual} bytes, expected {expected}")]
    SizeMismatch {
        /// The size the header or record declared
        expected: usize,
        /// The size actually present
        actual: usize,
    },
}

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRW(#[from] binrw::Error),

    /// Transparent wrapper for [`FormatError`]
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Transparent wrapper for [`DecompressionError`]
    #[error(transparent)]
    Decompression(#[from] DecompressionError),

    /// no entry with the requested name exists in the overlay
    #[error("no entry named {0}")]
    EntryNotFound(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
