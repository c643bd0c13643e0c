//! Module for reading MCNP PTRAC particle track files
//!
//! A PTRAC file records the full life of every sampled source particle:
//! creation at the source, banked secondaries, surface crossings, collisions,
//! and termination. The file opens with a self-describing header that
//! declares which data fields appear on each event kind and in what order;
//! the body is a dense stream of histories whose layout is driven entirely by
//! that header.
//!
//! Both legacy encodings are supported:
//!
//! | Format            | Description                                      |
//! | ----------------- | ------------------------------------------------ |
//! | [Format::Ascii]   | whitespace-delimited text, line oriented         |
//! | [Format::Binary]  | fortran sequential records with 32-bit bookends  |
//!
//! Files written under the `event=`, `type=`, `filter=`, or `tally=` keywords
//! change both the header shape and the per-history layout. The variant is
//! inferred from the keyword entries for text files ([FilterClass]); binary
//! files carry no reliable signal and default to unfiltered unless the caller
//! overrides ([FilterMode]).
//!
//! # Quickstart example
//!
//! ```rust, no_run
//! # use ptrac::{Ptrac, Format, FieldId};
//! // Open the file and parse the header
//! let mut ptrac = Ptrac::from_file("/path/to/ptrac", Format::Ascii).unwrap();
//!
//! // Pull histories in batches until the file is exhausted
//! loop {
//!     let batch = ptrac.read_histories(1000).unwrap();
//!     if batch.is_empty() {
//!         break;
//!     }
//!     for history in &batch {
//!         for event in &history.events {
//!             if let Some(energy) = event.get(FieldId::Energy) {
//!                 println!("{} at {energy} MeV", event.kind);
//!             }
//!         }
//!     }
//! }
//! ```

// Split into subfiles for development, but anything important is re-exported
mod core;
mod error;
mod parsers;
mod ptrac;
mod reader;

// flatten public API and inline the documentation
#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use ptrac::{Format, Ptrac};

#[doc(inline)]
pub use crate::core::*;
