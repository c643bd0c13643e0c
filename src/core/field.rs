//! Field identifiers declared by the data-type descriptor

use serde::Serialize;

/// Identifier for a single data slot on an NPS or event line
///
/// The header's data-type descriptor lists these small integers in the order
/// the corresponding values appear on each line kind. Identifiers 1 to 6 only
/// ever describe the per-history NPS line, [FieldId::NextEventType] chains
/// one event to the next, and the rest name the physical quantities recorded
/// for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum FieldId {
    /// Source particle index
    Nps = 1,
    /// Event type of the first event in a history
    FirstEventType = 2,
    /// Cell number on the NPS line
    NpsCell = 3,
    /// Surface number on the NPS line
    NpsSurface = 4,
    /// Tally number for filtered files
    Tally = 5,
    /// Tally score for filtered files
    Value = 6,
    /// Event type of the next event in the chain
    NextEventType = 7,
    /// Number of nodes in track from source
    Node = 10,
    /// Source type
    Nsr = 11,
    /// ZZAAA of the interaction nuclide
    Zaid = 12,
    /// Reaction type (MT)
    Rxn = 13,
    /// Surface number crossed
    Surface = 14,
    /// Angle with the surface normal (degrees)
    Angle = 15,
    /// Termination type
    TerminationType = 16,
    /// Branch number for the history
    Branch = 17,
    /// Particle type
    Particle = 18,
    /// Cell number
    Cell = 19,
    /// Material number
    Material = 20,
    /// Number of collisions per track
    CollisionNumber = 21,
    /// X coordinate of the particle position (cm)
    X = 22,
    /// Y coordinate of the particle position (cm)
    Y = 23,
    /// Z coordinate of the particle position (cm)
    Z = 24,
    /// X direction cosine
    U = 25,
    /// Y direction cosine
    V = 26,
    /// Z direction cosine
    W = 27,
    /// Particle energy (MeV)
    Energy = 28,
    /// Particle weight
    Weight = 29,
    /// Time of the event (shakes)
    Time = 30,
}

impl FieldId {
    /// Identifier as written in the data-type descriptor
    pub fn raw(self) -> i64 {
        self as i64
    }

    /// Map a raw descriptor value back to a known identifier
    pub fn from_raw(raw: i64) -> Option<Self> {
        let id = match raw {
            1 => Self::Nps,
            2 => Self::FirstEventType,
            3 => Self::NpsCell,
            4 => Self::NpsSurface,
            5 => Self::Tally,
            6 => Self::Value,
            7 => Self::NextEventType,
            10 => Self::Node,
            11 => Self::Nsr,
            12 => Self::Zaid,
            13 => Self::Rxn,
            14 => Self::Surface,
            15 => Self::Angle,
            16 => Self::TerminationType,
            17 => Self::Branch,
            18 => Self::Particle,
            19 => Self::Cell,
            20 => Self::Material,
            21 => Self::CollisionNumber,
            22 => Self::X,
            23 => Self::Y,
            24 => Self::Z,
            25 => Self::U,
            26 => Self::V,
            27 => Self::W,
            28 => Self::Energy,
            29 => Self::Weight,
            30 => Self::Time,
            _ => return None,
        };
        Some(id)
    }

    /// Identifiers that carry a recorded quantity on an event line
    ///
    /// NPS-line identifiers can appear in event layouts of malformed files;
    /// they are consumed but never stored against an event.
    pub(crate) fn is_event_datum(self) -> bool {
        self.raw() >= Self::Node.raw()
    }
}
