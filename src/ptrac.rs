//! Primary reader handle for PTRAC files

// standard library
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

// crate modules
use crate::core::{FilterMode, Header, History};
use crate::error::{Error, Result};
use crate::reader::Reader;

// external crates
use log::info;

/// On-disk encodings of the PTRAC family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Whitespace-delimited text, line oriented
    Ascii,
    /// Fortran sequential binary with 32-bit record bookends
    Binary,
    /// HDF5 output from recent code versions, read by a separate parser
    Hdf5,
}

/// Streaming reader over one PTRAC file
///
/// The header is parsed when the reader is constructed and is immutable from
/// then on; histories are decoded lazily, in file order, as they are asked
/// for. The reader owns a single cursor over the file and is strictly
/// sequential. For concurrent throughput, shard by file.
///
/// ```rust, no_run
/// # use ptrac::{Ptrac, Format};
/// let mut ptrac = Ptrac::from_file("/path/to/ptrac", Format::Ascii).unwrap();
/// println!("{}", ptrac.header());
///
/// while let Some(history) = ptrac.read_history().unwrap() {
///     println!("nps {} underwent {} events", history.nps.nps, history.len());
/// }
/// ```
pub struct Ptrac<R: Read + Seek> {
    reader: Reader<R>,
}

impl Ptrac<File> {
    /// Open a PTRAC file and parse its header
    ///
    /// The `path` may be a [&str], [String], [Path], etc..
    ///
    /// Filtered text variants are detected automatically; binary input is
    /// taken as unfiltered (see [Ptrac::from_file_with]).
    ///
    /// Example
    /// ```rust, no_run
    /// # use ptrac::{Ptrac, Format};
    /// let mut ptrac = Ptrac::from_file("path/to/ptrac", Format::Binary).unwrap();
    /// let histories = ptrac.read_histories(1000).unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P, format: Format) -> Result<Self> {
        Self::from_file_with(path, format, FilterMode::default())
    }

    /// Open a PTRAC file with an explicit filter override
    ///
    /// There is no reliable way to tell a filtered binary file from an
    /// unfiltered one, so [FilterMode::Auto] never skips the extra filter
    /// record for binary input. Callers who know better pass
    /// [FilterMode::Filtered].
    ///
    /// Example
    /// ```rust, no_run
    /// # use ptrac::{FilterMode, Format, Ptrac};
    /// // A binary file known to be written under `event=src,col`
    /// let mut ptrac =
    ///     Ptrac::from_file_with("path/to/ptrac", Format::Binary, FilterMode::Filtered).unwrap();
    /// ```
    pub fn from_file_with<P: AsRef<Path>>(
        path: P,
        format: Format,
        mode: FilterMode,
    ) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading {:?}", path.file_name().unwrap_or(path.as_os_str()));

        let file = File::open(path).map_err(|source| Error::OpenFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file, format, mode)
    }
}

impl<R: Read + Seek> Ptrac<R> {
    /// Build a reader over any seekable byte stream
    ///
    /// The generic seam exists for in-memory sources; file-backed use goes
    /// through [Ptrac::from_file].
    pub fn from_reader(inner: R, format: Format, mode: FilterMode) -> Result<Self> {
        Ok(Self {
            reader: Reader::new(inner, format, mode)?,
        })
    }

    /// The parsed header
    pub fn header(&self) -> &Header {
        &self.reader.header
    }

    /// Decode the next history off the stream
    ///
    /// Returns `Ok(None)` once the file is exhausted. A file that ends
    /// mid-history yields the partial history first and `None` afterwards.
    pub fn read_history(&mut self) -> Result<Option<History>> {
        self.reader.read_history()
    }

    /// Decode up to `number` consecutive histories
    ///
    /// Stops early at end of file; an empty vector means the stream is
    /// exhausted.
    pub fn read_histories(&mut self, number: u32) -> Result<Vec<History>> {
        self.reader.read_histories(number)
    }
}
