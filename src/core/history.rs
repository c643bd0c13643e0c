//! History and event data structures, plus the next-event codec

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::field::FieldId;
use crate::core::header::LineTag;

/// End-of-history sentinel in the next-event slot
pub const LST: i64 = 9000;

/// The primary event classes recorded in a PTRAC body
///
/// Next-event codes are written as `sign * (primary + subtype)` with the
/// primary a multiple of 1000. The subtype sub-classifies banked secondaries
/// and is meaningless for every other class, so only [EventKind::Bank]
/// carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    /// Creation at the source (1000)
    Source,
    /// A banked secondary entering transport (2000 + subtype)
    Bank {
        /// Bank sub-classification in `[0, 999]`
        subtype: i32,
    },
    /// Surface crossing (3000)
    Surface,
    /// Collision (4000)
    Collision,
    /// Termination (5000)
    Termination,
}

impl EventKind {
    /// Primary event code, one of 1000/2000/3000/4000/5000
    pub fn code(&self) -> i64 {
        match self {
            EventKind::Source => 1000,
            EventKind::Bank { .. } => 2000,
            EventKind::Surface => 3000,
            EventKind::Collision => 4000,
            EventKind::Termination => 5000,
        }
    }

    /// The pair of data-type lists describing this event kind, in read order
    pub(crate) fn line_tags(&self) -> (LineTag, LineTag) {
        match self {
            EventKind::Source => (LineTag::Src1, LineTag::Src2),
            EventKind::Bank { .. } => (LineTag::Bnk1, LineTag::Bnk2),
            EventKind::Surface => (LineTag::Sur1, LineTag::Sur2),
            EventKind::Collision => (LineTag::Col1, LineTag::Col2),
            EventKind::Termination => (LineTag::Ter1, LineTag::Ter2),
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let tag = match self {
            EventKind::Source => "src",
            EventKind::Bank { .. } => "bnk",
            EventKind::Surface => "sur",
            EventKind::Collision => "col",
            EventKind::Termination => "ter",
        };
        write!(f, "{tag}")
    }
}

/// Decoded form of a next-event code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextEvent {
    /// Another event of the given kind follows
    Event(EventKind),
    /// The history chain is complete
    EndOfHistory,
}

/// Decompose a next-event code into its event kind
///
/// Covers both the `FIRST_EVENT_TYPE` slot on the NPS line and the
/// `NEXT_EVENT_TYPE` slot on event lines, which share a layout of
/// `sign * (primary + subtype)`. The sign is discarded. The sentinel is
/// compared before decomposition, so only an exact `9000` ends a history.
///
/// Returns `None` for codes outside the known families.
///
/// ```rust
/// # use ptrac::{decode_next_event, EventKind, NextEvent};
/// assert_eq!(
///     decode_next_event(-2009),
///     Some(NextEvent::Event(EventKind::Bank { subtype: 9 }))
/// );
/// assert_eq!(decode_next_event(9000), Some(NextEvent::EndOfHistory));
/// ```
pub fn decode_next_event(code: i64) -> Option<NextEvent> {
    if code == LST {
        return Some(NextEvent::EndOfHistory);
    }

    let magnitude = code.abs();
    let subtype = (magnitude % 1000) as i32;
    let kind = match magnitude - i64::from(subtype) {
        1000 => EventKind::Source,
        2000 => EventKind::Bank { subtype },
        3000 => EventKind::Surface,
        4000 => EventKind::Collision,
        5000 => EventKind::Termination,
        _ => return None,
    };

    Some(NextEvent::Event(kind))
}

/// Values read from the per-history NPS line
///
/// Only `nps` is always present; the optional fields mirror the NPS-line
/// layout declared by the header, including the tally pair injected for
/// filtered files.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Nps {
    /// Source particle index
    pub nps: i64,
    /// Cell number, when declared on the NPS line
    pub cell: Option<i64>,
    /// Surface number, when declared on the NPS line
    pub surface: Option<i64>,
    /// Tally number, for tally-filtered files
    pub tally: Option<i64>,
    /// Tally score, for tally-filtered files
    pub value: Option<f64>,
}

/// A single recorded event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Discriminated event class
    pub kind: EventKind,
    /// Recorded quantities keyed by field identifier
    pub data: BTreeMap<FieldId, f64>,
}

impl Event {
    pub(crate) fn new(kind: EventKind) -> Self {
        Self {
            kind,
            data: BTreeMap::new(),
        }
    }

    /// Value of a recorded quantity, if the layout included it
    ///
    /// ```rust
    /// # use ptrac::{Event, EventKind, FieldId};
    /// # let mut event = Event { kind: EventKind::Source, data: Default::default() };
    /// # event.data.insert(FieldId::Energy, 14.1);
    /// assert_eq!(event.get(FieldId::Energy), Some(14.1));
    /// assert_eq!(event.get(FieldId::Time), None);
    /// ```
    pub fn get(&self, field: FieldId) -> Option<f64> {
        self.data.get(&field).copied()
    }

    /// Whether the layout recorded a value for this field
    pub fn has(&self, field: FieldId) -> bool {
        self.data.contains_key(&field)
    }

    /// Primary event code of this event
    pub fn code(&self) -> i64 {
        self.kind.code()
    }

    /// Bank sub-classification, zero for anything that is not a bank event
    pub fn bank_subtype(&self) -> i32 {
        match self.kind {
            EventKind::Bank { subtype } => subtype,
            _ => 0,
        }
    }
}

/// The full recorded life of one source particle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct History {
    /// Per-history NPS line values
    pub nps: Nps,
    /// Events in the order they were recorded
    pub events: Vec<Event>,
}

impl History {
    /// Number of events recorded for this history
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True for a history with no decoded events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event at `index`, if there is one
    pub fn get_event(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_codes_decode() {
        for (code, kind) in [
            (1000, EventKind::Source),
            (3000, EventKind::Surface),
            (4000, EventKind::Collision),
            (5000, EventKind::Termination),
        ] {
            assert_eq!(decode_next_event(code), Some(NextEvent::Event(kind)));
        }
    }

    #[test]
    fn bank_codes_carry_their_subtype() {
        assert_eq!(
            decode_next_event(2019),
            Some(NextEvent::Event(EventKind::Bank { subtype: 19 }))
        );
        assert_eq!(
            decode_next_event(2000),
            Some(NextEvent::Event(EventKind::Bank { subtype: 0 }))
        );
    }

    #[test]
    fn sign_is_discarded() {
        assert_eq!(
            decode_next_event(-4000),
            Some(NextEvent::Event(EventKind::Collision))
        );
        assert_eq!(
            decode_next_event(-2500),
            Some(NextEvent::Event(EventKind::Bank { subtype: 500 }))
        );
    }

    #[test]
    fn sentinel_ends_the_chain() {
        assert_eq!(decode_next_event(9000), Some(NextEvent::EndOfHistory));
        // a negative sentinel is not a terminator, and 9000 is no event family
        assert_eq!(decode_next_event(-9000), None);
    }

    #[test]
    fn out_of_family_codes_are_rejected() {
        assert_eq!(decode_next_event(0), None);
        assert_eq!(decode_next_event(999), None);
        assert_eq!(decode_next_event(6000), None);
        assert_eq!(decode_next_event(12345), None);
    }

    #[test]
    fn subtype_is_zero_outside_bank_events() {
        let event = Event::new(EventKind::Termination);
        assert_eq!(event.bank_subtype(), 0);
        let event = Event::new(EventKind::Bank { subtype: 14 });
        assert_eq!(event.bank_subtype(), 14);
    }
}
