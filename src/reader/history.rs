//! The history decoder shared by both encodings
//!
//! Everything here is driven by the header layout tables: the NPS line is a
//! run of integers (plus one double for a tally score), and each event is a
//! run of doubles whose meaning comes from the data-type lists of its event
//! kind. The chain is stitched together by the next-event slot on each line.

use std::io::{Read, Seek};

use log::trace;

use crate::core::{
    decode_next_event, Event, FieldId, History, LineTag, NextEvent, LST,
};
use crate::error::{Error, Result};

use super::{Reader, Source};

impl<R: Read + Seek> Reader<R> {
    /// Decode the next history off the stream
    ///
    /// `Ok(None)` signals a clean end of file at a history boundary. A
    /// stream that dies mid-history yields the partial history and the
    /// reader reports end-of-stream from then on.
    pub(crate) fn read_history(&mut self) -> Result<Option<History>> {
        if self.done || self.source.is_exhausted()? {
            self.done = true;
            return Ok(None);
        }

        let Self {
            header,
            source,
            done,
        } = self;

        let mut history = History::default();
        match decode_into(source, header, &mut history) {
            Ok(()) => {
                trace!(
                    "history {} decoded with {} events",
                    history.nps.nps,
                    history.len()
                );
                Ok(Some(history))
            }
            // a death mid-history hands back whatever was read
            Err(e) if e.is_eof() => {
                *done = true;
                Ok(Some(history))
            }
            Err(e) => Err(e),
        }
    }

    /// Read up to `number` consecutive histories
    ///
    /// Stops early at end of file; an empty vector means the stream is
    /// exhausted.
    pub(crate) fn read_histories(&mut self, number: u32) -> Result<Vec<History>> {
        let mut histories = Vec::new();
        for _ in 0..number {
            match self.read_history()? {
                Some(history) => {
                    histories.push(history);
                    if self.done {
                        break;
                    }
                }
                None => break,
            }
        }
        Ok(histories)
    }
}

/// Decode one history into `history`, which accumulates partial state
fn decode_into<R: Read + Seek>(
    source: &mut Source<R>,
    header: &crate::core::Header,
    history: &mut History,
) -> Result<()> {
    // the next-event code is staged as a double for both the first-event
    // slot and the per-event slot, matching the on-disk representation
    let mut next_event = LST as f64;

    // NPS line: integers except for the tally score
    source.open_record()?;
    for &raw in header.fields(LineTag::Nps) {
        if raw == FieldId::Value.raw() {
            history.nps.value = Some(source.read_f64()?);
            continue;
        }

        let value = source.read_i64()?;
        match FieldId::from_raw(raw) {
            Some(FieldId::Nps) => history.nps.nps = value,
            Some(FieldId::FirstEventType) => next_event = value as f64,
            Some(FieldId::NpsCell) => history.nps.cell = Some(value),
            Some(FieldId::NpsSurface) => history.nps.surface = Some(value),
            Some(FieldId::Tally) => history.nps.tally = Some(value),
            // anything else is consumed and dropped
            _ => {}
        }
    }
    source.close_record()?;

    // event chain, terminated by the sentinel code
    loop {
        let kind = match decode_next_event(next_event as i64) {
            Some(NextEvent::EndOfHistory) => break,
            Some(NextEvent::Event(kind)) => kind,
            // an out-of-family code (e.g. a truncated magnitude landing on
            // 9000) ends the chain rather than spinning on a layout that
            // can never advance
            None => break,
        };

        let (first, second) = kind.line_tags();
        if header.count(first) + header.count(second) == 0 {
            // without a next-event slot the chain could never advance
            return Err(Error::EmptyEventLayout(kind));
        }

        let mut event = Event::new(kind);
        source.open_record()?;
        for &raw in header
            .fields(first)
            .iter()
            .chain(header.fields(second))
        {
            let value = source.read_f64()?;
            match FieldId::from_raw(raw) {
                Some(FieldId::NextEventType) => next_event = value,
                Some(id) if id.is_event_datum() => {
                    event.data.insert(id, value);
                }
                // unknown and NPS-line identifiers consume their slot only
                _ => {}
            }
        }
        source.close_record()?;

        history.events.push(event);
    }

    source.finish_history();
    Ok(())
}
