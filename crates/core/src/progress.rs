//! Read-only progress accounting for a position within a pattern.

use std::cmp::Ordering;

use serde::Serialize;

use crate::model::{Entry, Group, Pattern, Position, StitchId};
use crate::navigator::{self, NavigationError};

/// Where a group stands relative to the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Completed,
    Current,
    Upcoming,
}

/// Per-group slice of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupProgress {
    pub index: usize,
    pub label: String,
    pub status: GroupStatus,
    pub completed_units: u64,
    pub total_units: u64,
    pub repeat_count: u32,
    /// 1-based repeat being worked; only set on the current group.
    pub current_repeat: Option<u32>,
}

/// Display identity of a single stitch. Ordinals are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitRef {
    pub group_index: usize,
    pub group_label: String,
    pub group_repeat: u32,
    pub entry_index: usize,
    pub stitch: StitchId,
    pub label: Option<String>,
    pub repeat_number: u32,
    pub unit_number: u32,
}

/// Everything a UI needs to show how far through a pattern the user is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub total_units: u64,
    pub completed_units: u64,
    pub remaining_units: u64,
    pub percentage: f64,
    pub is_complete: bool,
    pub current: Option<UnitRef>,
    pub previous: Option<UnitRef>,
    pub next: Option<UnitRef>,
    pub groups: Vec<GroupProgress>,
}

/// Build a [`ProgressReport`] for `position`.
///
/// # Errors
///
/// Returns `NavigationError` if `position` does not fit `pattern`.
pub fn compute_progress(
    position: &Position,
    pattern: &Pattern,
) -> Result<ProgressReport, NavigationError> {
    position.check(pattern)?;
    let position = navigator::settled(position, pattern);

    let total_units = pattern.total_units();
    let completed_units = completed_units(&position, pattern);

    let previous = navigator::peek_backward(&position, pattern)?;
    let next = navigator::peek_forward(&position, pattern)?;

    let groups = pattern
        .groups()
        .iter()
        .enumerate()
        .map(|(index, group)| group_progress(&position, index, group))
        .collect();

    Ok(ProgressReport {
        total_units,
        completed_units,
        remaining_units: total_units.saturating_sub(completed_units),
        percentage: percentage(completed_units, total_units),
        is_complete: position.is_past_end(pattern),
        current: unit_ref(&position, pattern),
        previous: previous.and_then(|p| unit_ref(&p, pattern)),
        next: next.and_then(|p| unit_ref(&p, pattern)),
        groups,
    })
}

/// Stitches worked before `position`.
#[must_use]
pub fn completed_units(position: &Position, pattern: &Pattern) -> u64 {
    pattern
        .groups()
        .iter()
        .enumerate()
        .map(|(index, group)| completed_in_group(position, index, group))
        .fold(0, u64::saturating_add)
}

fn completed_in_group(position: &Position, index: usize, group: &Group) -> u64 {
    match index.cmp(&position.group_index) {
        Ordering::Less => group.total_units(),
        Ordering::Greater => 0,
        Ordering::Equal => {
            let repeats_done = group
                .single_iteration_units()
                .saturating_mul(u64::from(position.group_repeat));
            let entries_done = group
                .entries()
                .iter()
                .take(position.entry_index)
                .map(Entry::total_units)
                .fold(0, u64::saturating_add);
            let in_entry = group.entries().get(position.entry_index).map_or(0, |entry| {
                (u64::from(entry.count()) * u64::from(position.entry_repeat))
                    .saturating_add(u64::from(position.unit_count))
            });
            repeats_done
                .saturating_add(entries_done)
                .saturating_add(in_entry)
        }
    }
}

fn group_progress(position: &Position, index: usize, group: &Group) -> GroupProgress {
    let status = match index.cmp(&position.group_index) {
        Ordering::Less => GroupStatus::Completed,
        Ordering::Equal => GroupStatus::Current,
        Ordering::Greater => GroupStatus::Upcoming,
    };
    GroupProgress {
        index,
        label: group.label().to_string(),
        status,
        completed_units: completed_in_group(position, index, group),
        total_units: group.total_units(),
        repeat_count: group.repeat_count(),
        current_repeat: (status == GroupStatus::Current).then_some(position.group_repeat + 1),
    }
}

fn unit_ref(position: &Position, pattern: &Pattern) -> Option<UnitRef> {
    let group = pattern.groups().get(position.group_index)?;
    let entry = group.entries().get(position.entry_index)?;
    Some(UnitRef {
        group_index: position.group_index,
        group_label: group.label().to_string(),
        group_repeat: position.group_repeat + 1,
        entry_index: position.entry_index,
        stitch: entry.stitch(),
        label: pattern.stitch_label(entry.stitch()).map(str::to_string),
        repeat_number: position.entry_repeat + 1,
        unit_number: position.unit_count + 1,
    })
}

#[allow(clippy::cast_precision_loss)]
fn percentage(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
