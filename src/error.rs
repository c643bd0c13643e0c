//! Result and Error types for the ptrac crate

use crate::{EventKind, Format};

/// Type alias for `Result<T, ptrac::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `ptrac` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The file could not be opened for the requested format
    #[error("failed to open ptrac file \"{path}\"")]
    OpenFailed {
        /// Path as given by the caller
        path: String,
        /// Underlying reason from the filesystem
        source: std::io::Error,
    },

    /// Underlying file I/O error
    #[error("failure in file I/O")]
    IOError(#[from] std::io::Error),

    /// Failure to deserialise a byte stream
    #[error("failed to deserialise byte stream")]
    UnableToDeserialise(#[from] Box<bincode::ErrorKind>),

    /// The header version is not the supported `-1` family
    #[error("unsupported ptrac version {0} (expected -1)")]
    UnsupportedVersion(i64),

    /// Leading and trailing fortran byte counts disagree
    #[error("fortran record byte counts disagree (lead {lead}, trail {trail})")]
    RecordMismatch {
        /// Byte count before the payload
        lead: u32,
        /// Byte count after the payload
        trail: u32,
    },

    /// A record length that cannot possibly be correct
    #[error("unreasonable record length {length} for a file of {file_length} bytes")]
    BadRecordLength {
        /// Stated payload length
        length: u32,
        /// Total length of the file
        file_length: u64,
    },

    /// The comment record is a fixed 80 or 128 bytes
    #[error("comment record of {0} bytes (expected 80 or 128)")]
    UnexpectedCommentLength(u32),

    /// End of file reached while the header was still being parsed
    #[error("unexpected end of file inside the header")]
    Truncated,

    /// End of stream reached mid-read in the file body
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// A token that should have been a number was something else
    #[error("failed to parse \"{0}\" as a number")]
    MalformedToken(String),

    /// The header declares no data fields for an event kind that occurred
    #[error("header declares no data fields for {0} events")]
    EmptyEventLayout(EventKind),

    /// Formats recognised by the family but read elsewhere
    #[error("{0:?} ptrac files are handled by a separate reader")]
    UnsupportedFormat(Format),
}

impl Error {
    /// End-of-stream conditions that mean a partial history, not a failure
    pub(crate) fn is_eof(&self) -> bool {
        match self {
            Error::UnexpectedEof => true,
            Error::IOError(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }

    /// Promote end-of-stream to the fatal header-phase variant
    pub(crate) fn fatal_eof(self) -> Self {
        if self.is_eof() {
            Error::Truncated
        } else {
            self
        }
    }
}
