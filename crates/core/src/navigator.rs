//! Stepping a [`Position`] one stitch at a time through a [`Pattern`].
//!
//! Forward movement is carry propagation over the five cursor levels: the
//! innermost counter is incremented and every counter that reaches its bound
//! is reset while the next one out is incremented. Backward movement is the
//! mirrored borrow, where each level that is re-entered takes the last valid
//! value of its own target group or entry.
//!
//! The functions here never touch lifecycle status; `step_forward` only
//! reports that the pattern is exhausted and the caller decides what that
//! means for the session.

use thiserror::Error;

use crate::model::{Group, Pattern, Position};

/// A cursor that does not fit the pattern it is being moved through.
///
/// This is a caller bug (stale position, pattern edited underneath a
/// session), never a normal boundary condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NavigationError {
    #[error("group index {index} out of range ({len} groups)")]
    GroupOutOfRange { index: usize, len: usize },

    #[error("entry index {index} out of range ({len} entries in group {group})")]
    EntryOutOfRange {
        group: usize,
        index: usize,
        len: usize,
    },

    #[error("{field} {value} out of range (bound {bound})")]
    CounterOutOfRange {
        field: &'static str,
        value: u32,
        bound: u32,
    },

    #[error("cursor rests inside empty group {group}")]
    EmptyGroup { group: usize },
}

/// Advance by exactly one stitch.
///
/// Returns `Ok(true)` when no stitches remain, including when the position
/// was already past the end. The start cursor in a leading empty group is
/// first moved to the next group with entries, then advanced.
///
/// # Errors
///
/// Returns `NavigationError` if `position` does not fit `pattern`.
pub fn step_forward(position: &mut Position, pattern: &Pattern) -> Result<bool, NavigationError> {
    position.check(pattern)?;
    if !settle(position, pattern) {
        return Ok(true);
    }
    Ok(!carry(position, pattern))
}

/// Retreat by exactly one stitch.
///
/// Returns `Ok(false)` and leaves the cursor untouched when there is nothing
/// before it. From the past-the-end sentinel this moves onto the final stitch.
///
/// # Errors
///
/// Returns `NavigationError` if `position` does not fit `pattern`.
pub fn step_backward(position: &mut Position, pattern: &Pattern) -> Result<bool, NavigationError> {
    position.check(pattern)?;
    if position.is_start() {
        return Ok(false);
    }
    Ok(retreat(position, pattern))
}

/// The position one stitch ahead, or `None` if `position` is on the last
/// stitch or already past the end.
///
/// # Errors
///
/// Returns `NavigationError` if `position` does not fit `pattern`.
pub fn peek_forward(
    position: &Position,
    pattern: &Pattern,
) -> Result<Option<Position>, NavigationError> {
    let mut next = *position;
    let exhausted = step_forward(&mut next, pattern)?;
    Ok((!exhausted).then_some(next))
}

/// The position one stitch back, or `None` at the start.
///
/// # Errors
///
/// Returns `NavigationError` if `position` does not fit `pattern`.
pub fn peek_backward(
    position: &Position,
    pattern: &Pattern,
) -> Result<Option<Position>, NavigationError> {
    let mut prev = *position;
    let moved = step_backward(&mut prev, pattern)?;
    Ok(moved.then_some(prev))
}

/// Cursor on the final stitch of `pattern`, or `None` if it has no stitches.
#[must_use]
pub fn last_position(pattern: &Pattern) -> Option<Position> {
    let mut position = past_end(pattern);
    retreat(&mut position, pattern).then_some(position)
}

/// The cursor as navigation sees it: a position resting in an empty group is
/// moved forward to the first stitch of the next group with entries, or to
/// the past-the-end sentinel if there is none.
#[must_use]
pub fn settled(position: &Position, pattern: &Pattern) -> Position {
    let mut settled = *position;
    settle(&mut settled, pattern);
    settled
}

fn past_end(pattern: &Pattern) -> Position {
    Position {
        group_index: pattern.groups().len(),
        ..Position::start()
    }
}

/// Move onto the first stitch of the first non-empty group at or after
/// `from`. Returns false (cursor past the end) if there is none.
fn enter_group(position: &mut Position, pattern: &Pattern, from: usize) -> bool {
    match pattern.next_non_empty_group(from) {
        Some(group_index) => {
            *position = Position {
                group_index,
                ..Position::start()
            };
            true
        }
        None => {
            *position = past_end(pattern);
            false
        }
    }
}

/// Returns true if the cursor now rests on a stitch.
fn settle(position: &mut Position, pattern: &Pattern) -> bool {
    let current = position.group_index;
    match pattern.groups().get(current) {
        None => false,
        Some(group) if group.is_empty() => enter_group(position, pattern, current),
        Some(_) => true,
    }
}

/// Consume the stitch under a settled cursor. Returns false once the last
/// stitch of the pattern has been consumed.
fn carry(position: &mut Position, pattern: &Pattern) -> bool {
    let group = &pattern.groups()[position.group_index];
    let entry = &group.entries()[position.entry_index];

    position.unit_count += 1;
    if position.unit_count < entry.count() {
        return true;
    }
    position.unit_count = 0;

    position.entry_repeat += 1;
    if position.entry_repeat < entry.repeat_count() {
        return true;
    }
    position.entry_repeat = 0;

    position.entry_index += 1;
    if position.entry_index < group.entries().len() {
        return true;
    }
    position.entry_index = 0;

    position.group_repeat += 1;
    if position.group_repeat < group.repeat_count() {
        return true;
    }

    let next = position.group_index + 1;
    enter_group(position, pattern, next)
}

/// Step back one stitch from a cursor that is not at the start.
fn retreat(position: &mut Position, pattern: &Pattern) -> bool {
    let moved = borrow(position, pattern);
    if moved && is_first_stitch(position, pattern) {
        *position = Position::start();
    }
    moved
}

fn borrow(position: &mut Position, pattern: &Pattern) -> bool {
    let current = pattern
        .groups()
        .get(position.group_index)
        .filter(|group| !group.is_empty());

    if let Some(group) = current {
        let entries = group.entries();

        if position.unit_count > 0 {
            position.unit_count -= 1;
            return true;
        }

        if position.entry_repeat > 0 {
            position.entry_repeat -= 1;
            position.unit_count = entries[position.entry_index].count() - 1;
            return true;
        }

        if position.entry_index > 0 {
            position.entry_index -= 1;
            let entry = &entries[position.entry_index];
            position.entry_repeat = entry.repeat_count() - 1;
            position.unit_count = entry.count() - 1;
            return true;
        }

        if position.group_repeat > 0 {
            position.group_repeat -= 1;
            enter_last_entry(position, group);
            return true;
        }
    }

    let Some(group_index) = pattern.prev_non_empty_group(position.group_index) else {
        return false;
    };
    let group = &pattern.groups()[group_index];
    position.group_index = group_index;
    position.group_repeat = group.repeat_count() - 1;
    enter_last_entry(position, group);
    true
}

fn enter_last_entry(position: &mut Position, group: &Group) {
    if let Some(entry) = group.entries().last() {
        position.entry_index = group.entries().len() - 1;
        position.entry_repeat = entry.repeat_count() - 1;
        position.unit_count = entry.count() - 1;
    }
}

/// First stitch of the pattern, with only empty groups before it. The
/// all-zero cursor is the canonical spelling of that spot.
fn is_first_stitch(position: &Position, pattern: &Pattern) -> bool {
    position.group_repeat == 0
        && position.entry_index == 0
        && position.entry_repeat == 0
        && position.unit_count == 0
        && pattern.prev_non_empty_group(position.group_index).is_none()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
