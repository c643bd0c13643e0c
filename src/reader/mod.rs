//! Internal readers for the two legacy encodings
//!
//! The header is parsed once, per encoding, when the reader is built. After
//! that the body stream is decoded through [Source], which hides the only
//! differences that remain between the encodings: how a scalar is pulled off
//! the stream, and whether each line of data sits inside a fortran record.

mod ascii;
mod binary;
mod history;

use std::io::{Read, Seek};

use crate::core::{FilterMode, Header};
use crate::error::{Error, Result};
use crate::ptrac::Format;

pub(crate) use ascii::AsciiSource;
pub(crate) use binary::BinarySource;

/// Scalar source over the file body, one variant per encoding
pub(crate) enum Source<R: Read + Seek> {
    Ascii(AsciiSource<R>),
    Binary(BinarySource<R>),
}

impl<R: Read + Seek> Source<R> {
    /// Open the framing for one line of data (binary only)
    fn open_record(&mut self) -> Result<()> {
        match self {
            Source::Ascii(_) => Ok(()),
            Source::Binary(src) => src.open_record().map(|_| ()),
        }
    }

    /// Close the framing for one line of data (binary only)
    fn close_record(&mut self) -> Result<()> {
        match self {
            Source::Ascii(_) => Ok(()),
            Source::Binary(src) => src.close_record(),
        }
    }

    fn read_i64(&mut self) -> Result<i64> {
        match self {
            Source::Ascii(src) => src.token_i64(),
            Source::Binary(src) => src.read_i64(),
        }
    }

    fn read_f64(&mut self) -> Result<f64> {
        match self {
            Source::Ascii(src) => src.token_f64(),
            Source::Binary(src) => src.read_f64(),
        }
    }

    /// Realign on a line boundary once a history is complete (text only)
    fn finish_history(&mut self) {
        if let Source::Ascii(src) = self {
            src.skip_rest_of_line();
        }
    }

    /// Whether the stream sits at a clean end-of-file boundary
    fn is_exhausted(&mut self) -> Result<bool> {
        match self {
            Source::Ascii(src) => Ok(!src.has_more_tokens()?),
            Source::Binary(src) => src.at_eof(),
        }
    }
}

/// Stateful reader holding the parsed header and the body cursor
pub(crate) struct Reader<R: Read + Seek> {
    pub(crate) header: Header,
    source: Source<R>,
    /// Set once the stream has delivered its last history
    done: bool,
}

impl<R: Read + Seek> Reader<R> {
    /// Build a reader and eagerly parse the header
    ///
    /// Any end-of-file inside the header is fatal and surfaces as
    /// [Error::Truncated].
    pub(crate) fn new(inner: R, format: Format, mode: FilterMode) -> Result<Self> {
        match format {
            Format::Ascii => {
                let mut src = AsciiSource::new(inner);
                let header = ascii::parse_header(&mut src, mode).map_err(Error::fatal_eof)?;
                Ok(Self {
                    header,
                    source: Source::Ascii(src),
                    done: false,
                })
            }
            Format::Binary => {
                let mut src = BinarySource::new(inner)?;
                let header = binary::parse_header(&mut src, mode).map_err(Error::fatal_eof)?;
                Ok(Self {
                    header,
                    source: Source::Binary(src),
                    done: false,
                })
            }
            Format::Hdf5 => Err(Error::UnsupportedFormat(format)),
        }
    }
}
