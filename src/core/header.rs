//! The self-describing PTRAC header

use log::debug;
use serde::Serialize;

use crate::core::field::FieldId;
use crate::core::filter::FilterClass;

/// The eleven line kinds described by the data-type descriptor
///
/// Every event class owns two consecutive lists; both are read, in order,
/// when an event of that class is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    /// Per-history NPS line
    Nps,
    /// Source event, first list
    Src1,
    /// Source event, second list
    Src2,
    /// Bank event, first list
    Bnk1,
    /// Bank event, second list
    Bnk2,
    /// Surface crossing, first list
    Sur1,
    /// Surface crossing, second list
    Sur2,
    /// Collision, first list
    Col1,
    /// Collision, second list
    Col2,
    /// Termination, first list
    Ter1,
    /// Termination, second list
    Ter2,
}

impl LineTag {
    /// Fixed on-disk order of the data-type descriptor
    pub const ALL: [LineTag; 11] = [
        LineTag::Nps,
        LineTag::Src1,
        LineTag::Src2,
        LineTag::Bnk1,
        LineTag::Bnk2,
        LineTag::Sur1,
        LineTag::Sur2,
        LineTag::Col1,
        LineTag::Col2,
        LineTag::Ter1,
        LineTag::Ter2,
    ];
}

/// One group from the file's echo of the active `PTRAC` card options
///
/// The keyword block is a flat stream of doubles carved into
/// `(id, values...)` groups, each group announcing its own value count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordEntry {
    /// Leading group value, the entry count for this keyword
    pub id: i64,
    /// The keyword parameter values
    pub values: Vec<f64>,
}

/// Parsed PTRAC header
///
/// Built once when the file is opened and read-only from then on. The
/// `counts` and `layout` tables drive every read in the file body: for each
/// [LineTag] they give how many values sit on lines of that kind and which
/// [FieldId] each value carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    /// Format version, `-1` for the supported family
    pub version: i64,
    /// Name of the code that wrote the file, e.g. "mcnp6"
    pub code: String,
    /// Code version, e.g. "6.2"
    pub code_version: String,
    /// Date the code was built
    pub load_date: String,
    /// Date and time the problem was run
    pub id_timestamp: String,
    /// Problem title line
    pub comment: String,
    /// Carved keyword-entry groups
    pub keyword_entries: Vec<KeywordEntry>,
    /// Which filtering keyword family produced the file
    pub filter_class: FilterClass,

    /// Number of values on each line kind
    pub(crate) counts: [usize; 11],
    /// Field identifiers for each line kind, in read order
    pub(crate) layout: [Vec<i64>; 11],
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: -1,
            code: String::new(),
            code_version: String::new(),
            load_date: String::new(),
            id_timestamp: String::new(),
            comment: String::new(),
            keyword_entries: Vec::new(),
            filter_class: FilterClass::default(),
            counts: [0; 11],
            layout: std::array::from_fn(|_| Vec::new()),
        }
    }
}

impl Header {
    /// Number of values on lines of the given kind
    pub fn count(&self, tag: LineTag) -> usize {
        self.counts[tag as usize]
    }

    /// Field identifiers for lines of the given kind, in read order
    pub fn fields(&self, tag: LineTag) -> &[i64] {
        &self.layout[tag as usize]
    }

    pub(crate) fn push_field(&mut self, tag: LineTag, raw: i64) {
        self.layout[tag as usize].push(raw);
    }

    /// Add the undeclared tally slots to the NPS layout
    ///
    /// Tally-filtered files write a tally number and score on every NPS line
    /// without listing either in the data-type descriptor. Unless the
    /// descriptor already carries the tally identifier, the pair goes in
    /// directly after the first-event slot.
    pub(crate) fn inject_tally_fields(&mut self) {
        if !self.filter_class.injects_tally() {
            return;
        }

        let nps = &mut self.layout[LineTag::Nps as usize];
        if nps.contains(&FieldId::Tally.raw()) {
            return;
        }

        if let Some(position) = nps
            .iter()
            .position(|&raw| raw == FieldId::FirstEventType.raw())
        {
            nps.insert(position + 1, FieldId::Tally.raw());
            nps.insert(position + 2, FieldId::Value.raw());
            self.counts[LineTag::Nps as usize] += 2;
            debug!("NPS layout gains tally fields: {:?}", nps);
        }
    }
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Header {{")?;
        writeln!(f, "    code: {} {}", self.code.trim(), self.code_version.trim())?;
        writeln!(f, "    run: {}", self.id_timestamp)?;
        writeln!(f, "    comment: {}", self.comment.trim())?;
        writeln!(f, "    filter: {:?}", self.filter_class)?;
        for tag in LineTag::ALL {
            writeln!(f, "    {tag:?}: {:?}", self.fields(tag))?;
        }
        write!(f, "}}")
    }
}

/// Number of groups that can be carved from the keyword stream
///
/// Each group spends one slot on its own length. Groups whose declared
/// length runs past the end of the stream still count, mirroring the way
/// the writer pads its final record.
pub(crate) fn complete_group_count(slots: &[f64]) -> usize {
    let mut groups = 0;
    let mut index = 0;
    while index < slots.len() {
        groups += 1;
        // negative lengths saturate to zero rather than wrapping
        index += slots[index].max(0.0) as usize + 1;
    }
    groups
}

/// Carve the flattened keyword stream into its first `nkw` groups
pub(crate) fn carve_keyword_groups(slots: &[f64], nkw: usize) -> Vec<KeywordEntry> {
    let mut entries = Vec::with_capacity(nkw);
    let mut index = 0;
    while entries.len() < nkw && index < slots.len() {
        let declared = slots[index].max(0.0) as usize;
        let start = index + 1;
        let end = (start + declared).min(slots.len());
        entries.push(KeywordEntry {
            id: slots[index] as i64,
            values: slots[start..end].to_vec(),
        });
        index = start + declared;
    }
    entries
}
