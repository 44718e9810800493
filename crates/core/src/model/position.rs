use serde::{Deserialize, Serialize};

use crate::model::pattern::Pattern;
use crate::navigator::NavigationError;

/// Five-level cursor identifying the stitch a user is currently on.
///
/// Reads like a mixed-radix odometer, outermost digit first:
/// group, group repeat, entry, entry repeat, stitch within the repeat.
/// All-zero is the start of the pattern. `group_index == groups.len()` is the
/// past-the-end sentinel reached once every stitch has been worked; the other
/// fields carry no meaning there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub group_index: usize,
    pub group_repeat: u32,
    pub entry_index: usize,
    pub entry_repeat: u32,
    pub unit_count: u32,
}

impl Position {
    #[must_use]
    pub fn new(
        group_index: usize,
        group_repeat: u32,
        entry_index: usize,
        entry_repeat: u32,
        unit_count: u32,
    ) -> Self {
        Self {
            group_index,
            group_repeat,
            entry_index,
            entry_repeat,
            unit_count,
        }
    }

    /// The all-zero cursor: nothing worked yet.
    #[must_use]
    pub fn start() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_start(&self) -> bool {
        *self == Self::start()
    }

    /// True once the cursor has moved past the last group.
    #[must_use]
    pub fn is_past_end(&self, pattern: &Pattern) -> bool {
        self.group_index >= pattern.groups().len()
    }

    /// Verify the cursor addresses a real stitch of `pattern`.
    ///
    /// The past-the-end sentinel is accepted, and so is the all-zero start
    /// when the pattern opens with empty groups. Any other cursor inside an
    /// empty group is stale.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError` naming the first field that falls outside
    /// the bounds set by the pattern, or `NavigationError::EmptyGroup` for a
    /// stale cursor inside an empty group.
    pub fn check(&self, pattern: &Pattern) -> Result<(), NavigationError> {
        let groups = pattern.groups();
        if self.group_index > groups.len() {
            return Err(NavigationError::GroupOutOfRange {
                index: self.group_index,
                len: groups.len(),
            });
        }
        let Some(group) = groups.get(self.group_index) else {
            return Ok(());
        };
        if group.is_empty() {
            return if self.is_start() {
                Ok(())
            } else {
                Err(NavigationError::EmptyGroup {
                    group: self.group_index,
                })
            };
        }
        if self.group_repeat >= group.repeat_count() {
            return Err(NavigationError::CounterOutOfRange {
                field: "group_repeat",
                value: self.group_repeat,
                bound: group.repeat_count(),
            });
        }
        let Some(entry) = group.entries().get(self.entry_index) else {
            return Err(NavigationError::EntryOutOfRange {
                group: self.group_index,
                index: self.entry_index,
                len: group.entries().len(),
            });
        };
        if self.entry_repeat >= entry.repeat_count() {
            return Err(NavigationError::CounterOutOfRange {
                field: "entry_repeat",
                value: self.entry_repeat,
                bound: entry.repeat_count(),
            });
        }
        if self.unit_count >= entry.count() {
            return Err(NavigationError::CounterOutOfRange {
                field: "unit_count",
                value: self.unit_count,
                bound: entry.count(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entry, Group, PatternId, StitchId};

    fn pattern() -> Pattern {
        let entry = Entry::new(StitchId::new(1), 3, 2).unwrap();
        Pattern::new(
            PatternId::new(1),
            "p",
            vec![
                Group::new("a", 2, vec![entry]).unwrap(),
                Group::new("b", 1, Vec::new()).unwrap(),
            ],
        )
    }

    #[test]
    fn start_is_all_zero() {
        assert!(Position::start().is_start());
        assert!(!Position::new(0, 0, 0, 0, 1).is_start());
    }

    #[test]
    fn check_accepts_in_range_cursor_and_sentinel() {
        let pattern = pattern();
        assert!(Position::new(0, 1, 0, 1, 2).check(&pattern).is_ok());
        assert!(Position::new(2, 0, 0, 0, 0).check(&pattern).is_ok());
        assert!(Position::new(2, 0, 0, 0, 0).is_past_end(&pattern));
    }

    #[test]
    fn check_accepts_start_in_leading_empty_group() {
        let entry = Entry::new(StitchId::new(1), 2, 1).unwrap();
        let pattern = Pattern::new(
            PatternId::new(1),
            "p",
            vec![
                Group::new("notes", 1, Vec::new()).unwrap(),
                Group::new("a", 1, vec![entry]).unwrap(),
            ],
        );
        assert!(Position::start().check(&pattern).is_ok());
    }

    #[test]
    fn check_rejects_stale_cursor_inside_empty_group() {
        let pattern = pattern();
        assert_eq!(
            Position::new(1, 0, 0, 0, 0).check(&pattern),
            Err(NavigationError::EmptyGroup { group: 1 })
        );
        assert_eq!(
            Position::new(1, 0, 7, 4, 2).check(&pattern),
            Err(NavigationError::EmptyGroup { group: 1 })
        );
    }

    #[test]
    fn check_names_the_offending_field() {
        let pattern = pattern();
        assert_eq!(
            Position::new(3, 0, 0, 0, 0).check(&pattern),
            Err(NavigationError::GroupOutOfRange { index: 3, len: 2 })
        );
        assert_eq!(
            Position::new(0, 0, 1, 0, 0).check(&pattern),
            Err(NavigationError::EntryOutOfRange {
                group: 0,
                index: 1,
                len: 1
            })
        );
        assert_eq!(
            Position::new(0, 0, 0, 0, 3).check(&pattern),
            Err(NavigationError::CounterOutOfRange {
                field: "unit_count",
                value: 3,
                bound: 3
            })
        );
        assert!(matches!(
            Position::new(0, 2, 0, 0, 0).check(&pattern),
            Err(NavigationError::CounterOutOfRange {
                field: "group_repeat",
                ..
            })
        ));
    }

    #[test]
    fn serializes_as_plain_fields() {
        let json = serde_json::to_value(Position::new(1, 2, 3, 4, 5)).unwrap();
        assert_eq!(json["group_index"], 1);
        assert_eq!(json["unit_count"], 5);
    }
}
