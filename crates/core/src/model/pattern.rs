use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{PatternId, StitchId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PatternError {
    #[error("entry stitch count must be > 0")]
    ZeroCount,

    #[error("entry repeat count must be > 0")]
    ZeroEntryRepeat,

    #[error("group repeat count must be > 0")]
    ZeroGroupRepeat,

    #[error("stitch abbreviation cannot be empty")]
    EmptyAbbreviation,
}

//
// ─── STITCH ────────────────────────────────────────────────────────────────────
//

/// Catalog entry describing one stitch type (e.g. `sc` / "single crochet").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stitch {
    id: StitchId,
    abbreviation: String,
    name: String,
}

impl Stitch {
    /// # Errors
    ///
    /// Returns `PatternError::EmptyAbbreviation` if the abbreviation is blank.
    pub fn new(
        id: StitchId,
        abbreviation: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, PatternError> {
        let abbreviation = abbreviation.into().trim().to_string();
        if abbreviation.is_empty() {
            return Err(PatternError::EmptyAbbreviation);
        }
        Ok(Self {
            id,
            abbreviation,
            name: name.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> StitchId {
        self.id
    }

    #[must_use]
    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

//
// ─── ENTRY ─────────────────────────────────────────────────────────────────────
//

/// One instruction inside a group, e.g. "6 sc" or "inc ×6".
///
/// `count` is the number of stitches worked per repeat and `repeat_count` is
/// how many times that run is worked before moving to the next entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    stitch: StitchId,
    count: u32,
    repeat_count: u32,
}

impl Entry {
    /// # Errors
    ///
    /// Returns `PatternError::ZeroCount` or `PatternError::ZeroEntryRepeat` when
    /// either multiplicity is zero.
    pub fn new(stitch: StitchId, count: u32, repeat_count: u32) -> Result<Self, PatternError> {
        if count == 0 {
            return Err(PatternError::ZeroCount);
        }
        if repeat_count == 0 {
            return Err(PatternError::ZeroEntryRepeat);
        }
        Ok(Self {
            stitch,
            count,
            repeat_count,
        })
    }

    #[must_use]
    pub fn stitch(&self) -> StitchId {
        self.stitch
    }

    /// Stitches per repeat.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    /// All stitches this entry contributes to one pass of its group.
    #[must_use]
    pub fn total_units(&self) -> u64 {
        u64::from(self.count) * u64::from(self.repeat_count)
    }
}

//
// ─── GROUP ─────────────────────────────────────────────────────────────────────
//

/// A repeatable block of entries, typically one round or row.
///
/// A group may have no entries at all; navigation passes over such groups
/// without ever resting inside them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    label: String,
    repeat_count: u32,
    entries: Vec<Entry>,
}

impl Group {
    /// # Errors
    ///
    /// Returns `PatternError::ZeroGroupRepeat` if `repeat_count` is zero.
    pub fn new(
        label: impl Into<String>,
        repeat_count: u32,
        entries: Vec<Entry>,
    ) -> Result<Self, PatternError> {
        if repeat_count == 0 {
            return Err(PatternError::ZeroGroupRepeat);
        }
        Ok(Self {
            label: label.into(),
            repeat_count,
            entries,
        })
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stitches in one pass over the entries.
    #[must_use]
    pub fn single_iteration_units(&self) -> u64 {
        self.entries
            .iter()
            .map(Entry::total_units)
            .fold(0, u64::saturating_add)
    }

    /// Saturates at `u64::MAX` for patterns too large to count.
    #[must_use]
    pub fn total_units(&self) -> u64 {
        self.single_iteration_units()
            .saturating_mul(u64::from(self.repeat_count))
    }
}

//
// ─── PATTERN ───────────────────────────────────────────────────────────────────
//

/// Read-only structure traversed by the navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    id: PatternId,
    name: String,
    groups: Vec<Group>,
    stitches: HashMap<StitchId, Stitch>,
}

impl Pattern {
    #[must_use]
    pub fn new(id: PatternId, name: impl Into<String>, groups: Vec<Group>) -> Self {
        Self {
            id,
            name: name.into(),
            groups,
            stitches: HashMap::new(),
        }
    }

    /// Register stitch definitions used to label entries.
    #[must_use]
    pub fn with_stitches(mut self, stitches: impl IntoIterator<Item = Stitch>) -> Self {
        self.stitches
            .extend(stitches.into_iter().map(|stitch| (stitch.id(), stitch)));
        self
    }

    #[must_use]
    pub fn id(&self) -> PatternId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    #[must_use]
    pub fn stitch(&self, id: StitchId) -> Option<&Stitch> {
        self.stitches.get(&id)
    }

    /// Abbreviation for the stitch, if the catalog knows it.
    #[must_use]
    pub fn stitch_label(&self, id: StitchId) -> Option<&str> {
        self.stitch(id).map(Stitch::abbreviation)
    }

    #[must_use]
    pub fn total_units(&self) -> u64 {
        self.groups
            .iter()
            .map(Group::total_units)
            .fold(0, u64::saturating_add)
    }

    /// Index of the first group at or after `from` that has entries.
    #[must_use]
    pub fn next_non_empty_group(&self, from: usize) -> Option<usize> {
        self.groups
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, group)| !group.is_empty())
            .map(|(index, _)| index)
    }

    /// Index of the last group strictly before `before` that has entries.
    #[must_use]
    pub fn prev_non_empty_group(&self, before: usize) -> Option<usize> {
        self.groups
            .iter()
            .take(before)
            .rposition(|group| !group.is_empty())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn sc() -> StitchId {
        StitchId::new(1)
    }

    #[test]
    fn entry_rejects_zero_multiplicities() {
        assert_eq!(Entry::new(sc(), 0, 1).unwrap_err(), PatternError::ZeroCount);
        assert_eq!(
            Entry::new(sc(), 1, 0).unwrap_err(),
            PatternError::ZeroEntryRepeat
        );
    }

    #[test]
    fn group_rejects_zero_repeat() {
        let err = Group::new("Rnd 1", 0, Vec::new()).unwrap_err();
        assert_eq!(err, PatternError::ZeroGroupRepeat);
    }

    #[test]
    fn stitch_requires_abbreviation() {
        let err = Stitch::new(sc(), "  ", "single crochet").unwrap_err();
        assert_eq!(err, PatternError::EmptyAbbreviation);
    }

    #[test]
    fn totals_multiply_through_every_level() {
        let group = Group::new(
            "Rnd 2",
            3,
            vec![
                Entry::new(sc(), 2, 1).unwrap(),
                Entry::new(StitchId::new(2), 1, 4).unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(group.single_iteration_units(), 6);
        assert_eq!(group.total_units(), 18);

        let pattern = Pattern::new(
            PatternId::new(1),
            "Ball",
            vec![group, Group::new("Note", 1, Vec::new()).unwrap()],
        );
        assert_eq!(pattern.total_units(), 18);
    }

    #[test]
    fn oversized_totals_saturate() {
        let huge = Entry::new(sc(), u32::MAX, u32::MAX).unwrap();
        assert_eq!(huge.total_units(), u64::from(u32::MAX) * u64::from(u32::MAX));

        let group = Group::new("Rnd 1", 3, vec![huge, huge]).unwrap();
        assert_eq!(group.single_iteration_units(), u64::MAX);
        assert_eq!(group.total_units(), u64::MAX);

        let pattern = Pattern::new(PatternId::new(1), "Blanket", vec![group.clone(), group]);
        assert_eq!(pattern.total_units(), u64::MAX);
    }

    #[test]
    fn non_empty_group_scans_skip_empty_groups() {
        let full = Group::new("full", 1, vec![Entry::new(sc(), 1, 1).unwrap()]).unwrap();
        let empty = Group::new("empty", 1, Vec::new()).unwrap();
        let pattern = Pattern::new(
            PatternId::new(1),
            "p",
            vec![empty.clone(), full.clone(), empty, full],
        );

        assert_eq!(pattern.next_non_empty_group(0), Some(1));
        assert_eq!(pattern.next_non_empty_group(2), Some(3));
        assert_eq!(pattern.next_non_empty_group(4), None);
        assert_eq!(pattern.prev_non_empty_group(3), Some(1));
        assert_eq!(pattern.prev_non_empty_group(1), None);
    }

    #[test]
    fn stitch_labels_come_from_catalog() {
        let pattern = Pattern::new(PatternId::new(1), "p", Vec::new())
            .with_stitches([Stitch::new(sc(), "sc", "single crochet").unwrap()]);
        assert_eq!(pattern.stitch_label(sc()), Some("sc"));
        assert_eq!(pattern.stitch_label(StitchId::new(9)), None);
    }
}
