//! Record framing and header parsing for the sequential-binary encoding
//!
//! A fortran unformatted file is a sequence of records, each bracketed by a
//! 32-bit payload byte count: `[u32 n][n bytes][u32 n]`. The two counts must
//! agree. Native byte ordering is assumed throughout, matching the fortran
//! default on the machines these files come from.

// standard library
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

// crate modules
use crate::core::{
    carve_keyword_groups, complete_group_count, FieldId, FilterClass, FilterMode, Header, LineTag,
};
use crate::error::{Error, Result};

// external crates
use bincode::deserialize;
use log::{debug, warn};
use serde::Deserialize;

/// Record-framed scalar source over a binary PTRAC file
pub(crate) struct BinarySource<R: Read + Seek> {
    handle: BufReader<R>,
    file_length: u64,
    /// Lead byte count of the record currently open
    record: Option<u32>,
}

impl<R: Read + Seek> BinarySource<R> {
    pub(crate) fn new(inner: R) -> Result<Self> {
        let mut handle = BufReader::new(inner);
        let file_length = handle.seek(SeekFrom::End(0))?;
        handle.rewind()?;
        Ok(Self {
            handle,
            file_length,
            record: None,
        })
    }

    pub(crate) fn file_length(&self) -> u64 {
        self.file_length
    }

    /// True once the last byte has been consumed
    pub(crate) fn at_eof(&mut self) -> Result<bool> {
        Ok(self.handle.fill_buf()?.is_empty())
    }

    /// Read the leading byte count of the next record
    pub(crate) fn open_record(&mut self) -> Result<u32> {
        let lead = self.read_u32()?;
        self.record = Some(lead);
        Ok(lead)
    }

    /// Read the trailing byte count and check it against the leading one
    pub(crate) fn close_record(&mut self) -> Result<()> {
        debug_assert!(self.record.is_some(), "close_record without open_record");
        let lead = self.record.take().unwrap_or_default();
        let trail = self.read_u32()?;
        if lead != trail {
            return Err(Error::RecordMismatch { lead, trail });
        }
        Ok(())
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buffer = [0u8; 4];
        self.handle.read_exact(&mut buffer)?;
        Ok(u32::from_ne_bytes(buffer))
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32> {
        let mut buffer = [0u8; 4];
        self.handle.read_exact(&mut buffer)?;
        Ok(i32::from_ne_bytes(buffer))
    }

    pub(crate) fn read_i64(&mut self) -> Result<i64> {
        let mut buffer = [0u8; 8];
        self.handle.read_exact(&mut buffer)?;
        Ok(i64::from_ne_bytes(buffer))
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64> {
        let mut buffer = [0u8; 8];
        self.handle.read_exact(&mut buffer)?;
        Ok(f64::from_ne_bytes(buffer))
    }

    /// Read a fixed-width ASCII field
    fn read_string(&mut self, width: usize) -> Result<String> {
        let mut buffer = vec![0u8; width];
        self.handle.read_exact(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Read one ten-double block, the unit the keyword records come in
    fn read_doubles(&mut self) -> Result<[f64; 10]> {
        let mut buffer = [0u8; 80];
        self.handle.read_exact(&mut buffer)?;
        Ok(deserialize(&buffer)?)
    }

    /// Deserialise the fixed-shape numbers record
    fn read_numbers(&mut self) -> Result<NumbersRecord> {
        let mut buffer = [0u8; NumbersRecord::BYTE_LENGTH];
        self.handle.read_exact(&mut buffer)?;
        Ok(deserialize(&buffer)?)
    }
}

/// The fixed 120-byte numbers record
///
/// One value count for the NPS line and each of the ten event lists, plus
/// the source particle type and the real precision flag. The seven trailing
/// slots are reserved and ignored.
#[derive(Debug, Deserialize)]
struct NumbersRecord {
    nps: i32,
    src1: i64,
    src2: i64,
    bnk1: i64,
    bnk2: i64,
    sur1: i64,
    sur2: i64,
    col1: i64,
    col2: i64,
    ter1: i64,
    ter2: i64,
    particle_kind: i32,
    precision_flag: i32,
    _unused: [i32; 7],
}

impl NumbersRecord {
    const BYTE_LENGTH: usize = 120;

    fn counts(&self) -> [usize; 11] {
        [
            self.nps.max(0) as usize,
            self.src1.max(0) as usize,
            self.src2.max(0) as usize,
            self.bnk1.max(0) as usize,
            self.bnk2.max(0) as usize,
            self.sur1.max(0) as usize,
            self.sur2.max(0) as usize,
            self.col1.max(0) as usize,
            self.col2.max(0) as usize,
            self.ter1.max(0) as usize,
            self.ter2.max(0) as usize,
        ]
    }
}

/// Parse the binary-encoded header
pub(crate) fn parse_header<R: Read + Seek>(
    src: &mut BinarySource<R>,
    mode: FilterMode,
) -> Result<Header> {
    debug!("---------------------------");
    debug!(" Parsing PTRAC header (bin)");
    debug!("---------------------------");

    // version record: a single i32, sanity-checked against the file size
    // because nothing else confirms the file is framed at all
    let lead = src.open_record()?;
    if u64::from(lead) >= src.file_length() || lead as usize != std::mem::size_of::<i32>() {
        return Err(Error::BadRecordLength {
            length: lead,
            file_length: src.file_length(),
        });
    }
    let version = i64::from(src.read_i32()?);
    src.close_record()?;
    if version != -1 {
        return Err(Error::UnsupportedVersion(version));
    }

    // code identification record: four fixed-width fields
    src.open_record()?;
    let code = src.read_string(8)?;
    let code_version = src.read_string(5)?;
    let load_date = src.read_string(8)?;
    let id_timestamp = src.read_string(19)?.trim().to_string();
    src.close_record()?;
    debug!("Code        = {code:?}");
    debug!("Version     = {code_version:?}");
    debug!("Load date   = {load_date:?}");
    debug!("Run         = {id_timestamp:?}");

    // problem title record, 80 bytes historically and 128 in newer files
    let lead = src.open_record()?;
    if lead != 80 && lead != 128 {
        return Err(Error::UnexpectedCommentLength(lead));
    }
    let comment = src.read_string(lead as usize)?;
    src.close_record()?;
    debug!("Comment     = {:?}", comment.trim());

    // keyword entries: ten doubles per record, the first slot of the first
    // record holding the group count; groups straddle record boundaries, so
    // records are pulled until the stream carves into enough groups
    let mut slots: Vec<f64> = Vec::new();
    let mut nkw = 0usize;
    let mut first_record = true;
    loop {
        src.open_record()?;
        let buffer = src.read_doubles()?;
        if first_record {
            nkw = buffer[0].max(0.0) as usize;
            slots.extend(&buffer[1..]);
            first_record = false;
        } else {
            slots.extend(&buffer);
        }
        src.close_record()?;

        if complete_group_count(&slots) >= nkw {
            break;
        }
    }
    debug!("n keywords  = {nkw}");
    debug!("Keywords    = {slots:?}");

    // numbers record
    src.open_record()?;
    let numbers = src.read_numbers()?;
    src.close_record()?;
    debug!("Counts      = {:?}", numbers.counts());
    debug!("Particle    = {}", numbers.particle_kind);
    debug!("Precision   = {}", numbers.precision_flag);

    // Keyword-value inference misfires on well formed unfiltered binary
    // files, so nothing is inferred here: the file is taken as unfiltered
    // unless the caller says otherwise.
    let filter_class = match mode {
        FilterMode::Filtered => FilterClass::EventOrTypeOrFilter,
        FilterMode::Auto | FilterMode::Unfiltered => FilterClass::Unfiltered,
    };
    debug!("Filter      = {filter_class:?}");

    if filter_class != FilterClass::Unfiltered {
        // skip the extra record of ten filter parameters
        debug!("Skipping filter parameter record");
        src.open_record()?;
        src.read_doubles()?;
        src.close_record()?;
    }

    // data-type descriptor: one record holding every list back to back,
    // i64 identifiers for the NPS line and i32 for the event lists
    let mut header = Header {
        version,
        code,
        code_version,
        load_date,
        id_timestamp,
        comment,
        keyword_entries: carve_keyword_groups(&slots, nkw),
        filter_class,
        counts: numbers.counts(),
        ..Default::default()
    };
    src.open_record()?;
    for tag in LineTag::ALL {
        for _ in 0..header.count(tag) {
            let raw = match tag {
                LineTag::Nps => src.read_i64()?,
                _ => i64::from(src.read_i32()?),
            };
            if FieldId::from_raw(raw).is_none() {
                warn!("unknown field id {raw} declared for {tag:?}");
            }
            header.push_field(tag, raw);
        }
    }
    src.close_record()?;

    header.inject_tally_fields();
    debug!("Header read successful");
    Ok(header)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    /// Frame a payload with its fortran bookends
    pub(crate) fn record(payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(payload.len() + 8);
        bytes.extend_from_slice(&(payload.len() as u32).to_ne_bytes());
        bytes.extend_from_slice(payload);
        bytes.extend_from_slice(&(payload.len() as u32).to_ne_bytes());
        bytes
    }

    fn doubles(values: [f64; 10]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    fn numbers_payload(counts: [i64; 11]) -> Vec<u8> {
        let mut payload = Vec::with_capacity(120);
        payload.extend_from_slice(&(counts[0] as i32).to_ne_bytes());
        for count in &counts[1..] {
            payload.extend_from_slice(&count.to_ne_bytes());
        }
        // particle type, precision flag, seven reserved slots
        payload.extend_from_slice(&1i32.to_ne_bytes());
        payload.extend_from_slice(&1i32.to_ne_bytes());
        for _ in 0..7 {
            payload.extend_from_slice(&0i32.to_ne_bytes());
        }
        payload
    }

    /// A minimal well formed unfiltered header stream
    pub(crate) fn minimal_header_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(record(&(-1i32).to_ne_bytes()));

        let mut ident = Vec::new();
        ident.extend_from_slice(b"mcnp6   ");
        ident.extend_from_slice(b"6.2  ");
        ident.extend_from_slice(b"05/08/13");
        ident.extend_from_slice(b"11/02/23 10:30:15  ");
        bytes.extend(record(&ident));

        bytes.extend(record(&[b' '; 80]));

        // one keyword group: (2.0, [5.0, 0.0])
        bytes.extend(record(&doubles([
            1.0, 2.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ])));

        bytes.extend(record(&numbers_payload([2, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0])));

        // data types: nps [1, 2] as i64, src1 [10, 22, 7] as i32
        let mut types = Vec::new();
        types.extend_from_slice(&1i64.to_ne_bytes());
        types.extend_from_slice(&2i64.to_ne_bytes());
        for id in [10i32, 22, 7] {
            types.extend_from_slice(&id.to_ne_bytes());
        }
        bytes.extend(record(&types));

        bytes
    }

    #[test]
    fn record_bookends_must_agree() {
        let mut bytes = record(&(-1i32).to_ne_bytes());
        // corrupt the trailing count
        let trail = bytes.len() - 4;
        bytes[trail..].copy_from_slice(&9u32.to_ne_bytes());

        let mut src = BinarySource::new(Cursor::new(bytes)).unwrap();
        src.open_record().unwrap();
        src.read_i32().unwrap();
        assert!(matches!(
            src.close_record(),
            Err(Error::RecordMismatch { lead: 4, trail: 9 })
        ));
    }

    #[test]
    fn absurd_version_record_is_rejected() {
        // claims a 64k payload in a 12-byte file
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&65536u32.to_ne_bytes());
        bytes.extend_from_slice(&(-1i32).to_ne_bytes());
        bytes.extend_from_slice(&65536u32.to_ne_bytes());

        let mut src = BinarySource::new(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            parse_header(&mut src, FilterMode::Auto),
            Err(Error::BadRecordLength { length: 65536, .. })
        ));
    }

    #[test]
    fn version_record_must_be_one_integer_wide() {
        let mut bytes = record(&[0u8; 8]);
        bytes.extend(record(&[0u8; 40]));

        let mut src = BinarySource::new(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            parse_header(&mut src, FilterMode::Auto),
            Err(Error::BadRecordLength { length: 8, .. })
        ));
    }

    #[test]
    fn wrong_version_is_fatal() {
        let mut bytes = record(&7i32.to_ne_bytes());
        bytes.extend(record(&[0u8; 40]));

        let mut src = BinarySource::new(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            parse_header(&mut src, FilterMode::Auto),
            Err(Error::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn comment_record_length_is_checked() {
        let mut bytes = record(&(-1i32).to_ne_bytes());
        bytes.extend(record(&[b'x'; 40]));
        bytes.extend(record(&[b' '; 64]));

        let mut src = BinarySource::new(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            parse_header(&mut src, FilterMode::Auto),
            Err(Error::UnexpectedCommentLength(64))
        ));
    }

    #[test]
    fn minimal_header_parses() {
        let mut src = BinarySource::new(Cursor::new(minimal_header_bytes())).unwrap();
        let header = parse_header(&mut src, FilterMode::Auto).unwrap();

        assert_eq!(header.version, -1);
        assert_eq!(header.code, "mcnp6   ");
        assert_eq!(header.code_version, "6.2  ");
        assert_eq!(header.id_timestamp, "11/02/23 10:30:15");
        assert_eq!(header.filter_class, FilterClass::Unfiltered);
        assert_eq!(header.keyword_entries.len(), 1);
        assert_eq!(header.keyword_entries[0].id, 2);
        assert_eq!(header.keyword_entries[0].values, [5.0, 0.0]);
        assert_eq!(header.fields(LineTag::Nps), [1, 2]);
        assert_eq!(header.fields(LineTag::Src1), [10, 22, 7]);
        assert!(src.at_eof().unwrap());
    }

    #[test]
    fn keyword_groups_straddle_records() {
        // nkw = 2 with the second group running into a second record:
        // group one is (8, [...8 values...]), leaving the stream one slot
        // short of carving two groups until the next record arrives
        let mut bytes = Vec::new();
        bytes.extend(record(&(-1i32).to_ne_bytes()));

        let mut ident = Vec::new();
        ident.extend_from_slice(b"mcnp6   ");
        ident.extend_from_slice(b"6.2  ");
        ident.extend_from_slice(b"05/08/13");
        ident.extend_from_slice(b"11/02/23 10:30:15  ");
        bytes.extend(record(&ident));
        bytes.extend(record(&[b' '; 80]));

        bytes.extend(record(&doubles([
            2.0, 8.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0,
        ])));
        bytes.extend(record(&doubles([
            3.0, 9.0, 9.0, 9.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ])));

        bytes.extend(record(&numbers_payload([2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])));

        let mut types = Vec::new();
        types.extend_from_slice(&1i64.to_ne_bytes());
        types.extend_from_slice(&2i64.to_ne_bytes());
        bytes.extend(record(&types));

        let mut src = BinarySource::new(Cursor::new(bytes)).unwrap();
        let header = parse_header(&mut src, FilterMode::Auto).unwrap();

        assert_eq!(header.keyword_entries.len(), 2);
        assert_eq!(
            header.keyword_entries[0].values,
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]
        );
        assert_eq!(header.keyword_entries[1].values, [9.0, 9.0, 9.0]);
    }

    #[test]
    fn filtered_override_skips_the_parameter_record() {
        let mut bytes = Vec::new();
        bytes.extend(record(&(-1i32).to_ne_bytes()));

        let mut ident = Vec::new();
        ident.extend_from_slice(b"mcnp6   ");
        ident.extend_from_slice(b"6.2  ");
        ident.extend_from_slice(b"05/08/13");
        ident.extend_from_slice(b"11/02/23 10:30:15  ");
        bytes.extend(record(&ident));
        bytes.extend(record(&[b' '; 80]));
        bytes.extend(record(&doubles([
            1.0, 2.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ])));
        bytes.extend(record(&numbers_payload([2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])));

        // the extra filter parameters record
        bytes.extend(record(&doubles([0.0; 10])));

        let mut types = Vec::new();
        types.extend_from_slice(&1i64.to_ne_bytes());
        types.extend_from_slice(&2i64.to_ne_bytes());
        bytes.extend(record(&types));

        let mut src = BinarySource::new(Cursor::new(bytes)).unwrap();
        let header = parse_header(&mut src, FilterMode::Filtered).unwrap();

        assert_eq!(header.filter_class, FilterClass::EventOrTypeOrFilter);
        // the binary path never injects tally fields
        assert_eq!(header.fields(LineTag::Nps), [1, 2]);
        assert!(src.at_eof().unwrap());
    }
}
