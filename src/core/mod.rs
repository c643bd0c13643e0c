// Modules under core, split into files for convenience
mod field;
mod filter;
mod header;
mod history;

// Re-exports of the key public data structures
pub use field::FieldId;
pub use filter::{FilterClass, FilterMode};
pub use header::{Header, KeywordEntry, LineTag};
pub use history::{decode_next_event, Event, EventKind, History, NextEvent, Nps, LST};

// Internal helpers shared by the readers
pub(crate) use filter::FilterIndicators;
pub(crate) use header::{carve_keyword_groups, complete_group_count};
