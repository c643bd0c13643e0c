//! Classification of filtered PTRAC variants
//!
//! Files written with the `event=`, `type=`, `filter=`, or `tally=` keywords
//! carry an extra filter-parameters record in the header, and the tally
//! variants put two undeclared slots on every NPS line. Neither difference is
//! announced anywhere in the file, so the variant has to be inferred from the
//! keyword-entry values.

use serde::Serialize;

/// Which filtering keyword family produced the file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum FilterClass {
    /// No filtering keyword was active
    #[default]
    Unfiltered,
    /// `event=`, `type=`, or `filter=` without a tally
    EventOrTypeOrFilter,
    /// `tally=` alone
    TallyOnly,
    /// `filter=` combined with a tally
    FilterAllCombined,
}

impl FilterClass {
    /// Classes whose NPS lines carry the undeclared tally and score slots
    pub fn injects_tally(&self) -> bool {
        matches!(self, FilterClass::TallyOnly | FilterClass::FilterAllCombined)
    }
}

/// Caller control over filtered-variant handling
///
/// The keyword-value inference is reliable for the text encoding only. The
/// binary header carries the same keyword records, but every known
/// discriminating signal also occurs in well formed unfiltered files, so
/// [FilterMode::Auto] treats binary input as unfiltered. Callers who know a
/// binary file was written with a filtering keyword must say so explicitly
/// with [FilterMode::Filtered].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// Infer the class from the keyword entries (text), unfiltered (binary)
    #[default]
    Auto,
    /// Treat the file as unfiltered regardless of its keyword entries
    Unfiltered,
    /// Treat the file as filtered: skip the filter-parameters record
    Filtered,
}

/// The keyword-entry slots that discriminate the filtered variants
///
/// Slot positions are fixed by the writer: the second value spikes past 100
/// when `event=` is active, the fourth is nonzero for a tally, the fifth is
/// positive for `type=`, and a combined `filter=`+tally run marks the tenth
/// slot negative on its second keyword line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FilterIndicators {
    /// Event-filter indicator, slot 1
    pub event_count: f64,
    /// Tally indicator, slot 3
    pub tally_marker: f64,
    /// Type-filter indicator, slot 4
    pub type_marker: f64,
    /// Combined-variant tally indicator, slot 9 when present
    pub combined_tally_marker: Option<f64>,
}

impl FilterIndicators {
    /// Pick the discriminating slots out of the flattened keyword values
    ///
    /// `slots` is the keyword stream with the leading group count already
    /// removed. Missing slots read as zero, which classifies as unfiltered.
    pub fn from_keyword_slots(slots: &[f64]) -> Self {
        Self {
            event_count: slots.get(1).copied().unwrap_or(0.0),
            tally_marker: slots.get(3).copied().unwrap_or(0.0),
            type_marker: slots.get(4).copied().unwrap_or(0.0),
            combined_tally_marker: slots.get(9).copied(),
        }
    }

    /// Classify the file from the indicator slots
    pub fn classify(&self) -> FilterClass {
        let has_event_or_filter = self.event_count > 100.0 || self.type_marker > 0.0;
        let has_tally = self.tally_marker != 0.0
            || self.combined_tally_marker.is_some_and(|marker| marker < 0.0);

        match (has_tally, has_event_or_filter) {
            (true, true) => FilterClass::FilterAllCombined,
            (true, false) => FilterClass::TallyOnly,
            (false, true) => FilterClass::EventOrTypeOrFilter,
            (false, false) => FilterClass::Unfiltered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(slots: &[f64]) -> FilterClass {
        FilterIndicators::from_keyword_slots(slots).classify()
    }

    #[test]
    fn plain_keyword_entries_are_unfiltered() {
        assert_eq!(classify(&[2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]), FilterClass::Unfiltered);
        // an empty slot list must not classify as filtered
        assert_eq!(classify(&[]), FilterClass::Unfiltered);
    }

    #[test]
    fn event_filters_spike_the_second_slot() {
        assert_eq!(
            classify(&[1.0, 3000.0, 0.0, 0.0, 0.0, 1.0, 5.0, 0.0, 0.0]),
            FilterClass::EventOrTypeOrFilter
        );
    }

    #[test]
    fn type_filters_mark_the_fifth_slot() {
        assert_eq!(
            classify(&[1.0, 8.0, 1.0, 0.0, 9.0, 0.0, 0.0, 0.0, 0.0]),
            FilterClass::EventOrTypeOrFilter
        );
    }

    #[test]
    fn tally_filters_mark_the_fourth_slot() {
        // the tally slot is negative in practice, but any nonzero counts
        assert_eq!(
            classify(&[1.0, 8.0, 1.0, -2.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            FilterClass::TallyOnly
        );
        assert_eq!(
            classify(&[1.0, 8.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            FilterClass::TallyOnly
        );
    }

    #[test]
    fn combined_filters_need_both_signals() {
        assert_eq!(
            classify(&[1.0, 8.0, 1.0, -2.0, 2.0, 9.0, 0.0, 0.0, 0.0]),
            FilterClass::FilterAllCombined
        );
    }

    #[test]
    fn second_keyword_line_can_carry_the_tally_signal() {
        // ten or more slots with a negative tenth marks the combined tally
        let mut slots = vec![1.0, 3000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        slots.push(-1.0);
        assert_eq!(classify(&slots), FilterClass::FilterAllCombined);

        // nine slots only: the same values stay event-only
        assert_eq!(
            classify(&[1.0, 3000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            FilterClass::EventOrTypeOrFilter
        );
    }

    #[test]
    fn injection_applies_to_tally_classes_only() {
        assert!(FilterClass::TallyOnly.injects_tally());
        assert!(FilterClass::FilterAllCombined.injects_tally());
        assert!(!FilterClass::Unfiltered.injects_tally());
        assert!(!FilterClass::EventOrTypeOrFilter.injects_tally());
    }
}
