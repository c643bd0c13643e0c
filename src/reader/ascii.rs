//! Token source and header parsing for the text encoding

// standard library
use std::io::{BufRead, BufReader, Lines, Read};

// crate modules
use crate::core::{
    carve_keyword_groups, FieldId, FilterClass, FilterIndicators, FilterMode, Header, LineTag,
};
use crate::error::{Error, Result};
use crate::parsers;

// external crates
use log::{debug, warn};

/// Whitespace-delimited scalar source over a text PTRAC file
///
/// Values are pulled token by token across line boundaries, the way a
/// fortran list-directed read behaves, while line-granular operations stay
/// available for the pieces of the header that are defined per line.
pub(crate) struct AsciiSource<R: Read> {
    lines: Lines<BufReader<R>>,
    line: String,
    pos: usize,
}

impl<R: Read> AsciiSource<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            lines: BufReader::new(inner).lines(),
            line: String::new(),
            pos: 0,
        }
    }

    /// Advance to the next line, saving it to the cache and returning a ref
    pub(crate) fn next_line(&mut self) -> Result<&str> {
        self.line = self.lines.next().ok_or(Error::UnexpectedEof)??;
        self.pos = 0;
        Ok(self.line.as_str())
    }

    fn rest(&self) -> &str {
        &self.line[self.pos..]
    }

    /// Drop whatever remains of the current line
    pub(crate) fn skip_rest_of_line(&mut self) {
        self.pos = self.line.len();
    }

    /// Whether another token can be produced without hitting end of file
    pub(crate) fn has_more_tokens(&mut self) -> Result<bool> {
        loop {
            if !self.rest().trim_start().is_empty() {
                return Ok(true);
            }
            match self.next_line() {
                Ok(_) => continue,
                Err(e) if e.is_eof() => return Ok(false),
                Err(e) => return Err(e),
            }
        }
    }

    /// Next token as a float, crossing line boundaries as needed
    pub(crate) fn token_f64(&mut self) -> Result<f64> {
        if !self.has_more_tokens()? {
            return Err(Error::UnexpectedEof);
        }
        let rest = &self.line[self.pos..];
        let (remaining, value) =
            parsers::token_f64(rest).map_err(|_| Error::MalformedToken(first_word(rest)))?;
        self.pos += rest.len() - remaining.len();
        Ok(value)
    }

    /// Next token as a signed integer, crossing line boundaries as needed
    pub(crate) fn token_i64(&mut self) -> Result<i64> {
        if !self.has_more_tokens()? {
            return Err(Error::UnexpectedEof);
        }
        let rest = &self.line[self.pos..];
        let (remaining, value) =
            parsers::token_i64(rest).map_err(|_| Error::MalformedToken(first_word(rest)))?;
        self.pos += rest.len() - remaining.len();
        Ok(value)
    }
}

fn first_word(i: &str) -> String {
    i.split_whitespace().next().unwrap_or_default().to_string()
}

/// Parse the text-encoded header
pub(crate) fn parse_header<R: Read>(src: &mut AsciiSource<R>, mode: FilterMode) -> Result<Header> {
    debug!("---------------------------");
    debug!(" Parsing PTRAC header (asc)");
    debug!("---------------------------");

    // version, with the rest of its line discarded
    let version = src.token_i64()?;
    if version != -1 {
        return Err(Error::UnsupportedVersion(version));
    }
    src.skip_rest_of_line();

    // code banner, left blank by some output settings
    let banner = src.next_line()?.to_string();
    let (code, code_version, load_date, id_timestamp) = parse_banner(&banner);
    debug!("Code        = {code:?}");
    debug!("Version     = {code_version:?}");
    debug!("Load date   = {load_date:?}");
    debug!("Run         = {id_timestamp:?}");

    // problem title
    let comment = src.next_line()?.trim().to_string();
    debug!("Comment     = {comment:?}");

    // keyword entries: one line of ten values, a second when three or more
    // keywords were active
    let nkw = src.token_f64()?.max(0.0) as usize;
    let mut slots = Vec::with_capacity(19);
    for _ in 1..10 {
        slots.push(src.token_f64()?);
    }
    if nkw >= 3 {
        for _ in 0..10 {
            slots.push(src.token_f64()?);
        }
    }
    debug!("n keywords  = {nkw}");
    debug!("Keywords    = {slots:?}");

    let filter_class = classify(mode, &slots);
    debug!("Filter      = {filter_class:?}");

    // filtered variants pad the header with a line of ten parameter values
    let skip_extra_line = match filter_class {
        FilterClass::EventOrTypeOrFilter => true,
        // the mcnp6.3 writer also pads tally-only headers
        FilterClass::TallyOnly => code == "mcnp6" && nkw < 3,
        FilterClass::FilterAllCombined | FilterClass::Unfiltered => false,
    };
    if skip_extra_line {
        debug!("Skipping filter parameter line");
        for _ in 0..10 {
            src.token_f64()?;
        }
    }

    // the numbers line: value count for the NPS line and each event list,
    // then the particle type, precision flag, and seven unused slots
    let mut counts = [0usize; 11];
    for slot in counts.iter_mut() {
        *slot = src.token_i64()?.max(0) as usize;
    }
    let particle_kind = src.token_i64()?;
    let precision_flag = src.token_i64()?;
    for _ in 0..7 {
        src.token_i64()?;
    }
    debug!("Counts      = {counts:?}");
    debug!("Particle    = {particle_kind}");
    debug!("Precision   = {precision_flag}");

    // data-type descriptor: the field identifiers behind each count
    let mut header = Header {
        version,
        code,
        code_version,
        load_date,
        id_timestamp,
        comment,
        keyword_entries: carve_keyword_groups(&slots, nkw),
        filter_class,
        counts,
        ..Default::default()
    };
    for tag in LineTag::ALL {
        for _ in 0..header.count(tag) {
            let raw = src.token_i64()?;
            if FieldId::from_raw(raw).is_none() {
                warn!("unknown field id {raw} declared for {tag:?}");
            }
            header.push_field(tag, raw);
        }
    }

    header.inject_tally_fields();
    debug!("Header read successful");
    Ok(header)
}

/// Resolve the caller's filter override against the keyword inference
fn classify(mode: FilterMode, slots: &[f64]) -> FilterClass {
    match mode {
        FilterMode::Unfiltered => FilterClass::Unfiltered,
        FilterMode::Auto | FilterMode::Filtered => {
            let inferred = FilterIndicators::from_keyword_slots(slots).classify();
            if mode == FilterMode::Filtered && inferred == FilterClass::Unfiltered {
                // forced filtered with nothing to infer a tally from
                FilterClass::EventOrTypeOrFilter
            } else {
                inferred
            }
        }
    }
}

/// Split the banner line into its code identification fields
///
/// A blank banner is valid (the third `prdmp` entry suppresses it) and
/// leaves all four fields empty.
fn parse_banner(line: &str) -> (String, String, String, String) {
    if line.trim().is_empty() {
        return Default::default();
    }

    let mut tokens = line.split_whitespace();
    let code = tokens.next().unwrap_or_default().to_string();
    let code_version = tokens.next().unwrap_or_default().to_string();
    let load_date = tokens.next().unwrap_or_default().to_string();
    // run date and time are two tokens joined back together
    let date = tokens.next().unwrap_or_default();
    let time = tokens.next().unwrap_or_default();
    let id_timestamp = format!("{date} {time}").trim().to_string();

    (code, code_version, load_date, id_timestamp)
}

#[cfg(test)]
mod source_tests {
    use super::*;

    #[test]
    fn tokens_cross_line_boundaries() {
        let mut src = AsciiSource::new("  1 2\n\n  3.5 4\n".as_bytes());
        assert_eq!(src.token_i64().unwrap(), 1);
        assert_eq!(src.token_i64().unwrap(), 2);
        assert_eq!(src.token_f64().unwrap(), 3.5);
        assert_eq!(src.token_i64().unwrap(), 4);
        assert!(src.token_i64().unwrap_err().is_eof());
    }

    #[test]
    fn skipped_lines_are_not_read() {
        let mut src = AsciiSource::new("1 999 999\n2\n".as_bytes());
        assert_eq!(src.token_i64().unwrap(), 1);
        src.skip_rest_of_line();
        assert_eq!(src.token_i64().unwrap(), 2);
    }

    #[test]
    fn malformed_tokens_are_reported() {
        let mut src = AsciiSource::new("  not-a-number".as_bytes());
        assert!(matches!(
            src.token_f64(),
            Err(Error::MalformedToken(word)) if word == "not-a-number"
        ));
    }

    #[test]
    fn exhaustion_is_visible_without_consuming() {
        let mut src = AsciiSource::new(" 7 \n   \n".as_bytes());
        assert!(src.has_more_tokens().unwrap());
        assert_eq!(src.token_i64().unwrap(), 7);
        assert!(!src.has_more_tokens().unwrap());
    }
}
