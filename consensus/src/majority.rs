//! Majority hash selection.

use tally_ledger::HashVoteEntry;

/// The entry with the highest count.
///
/// Ties go to the entry seen first in the block. Returns `None` only for an
/// empty slice.
pub fn select_majority(entries: &[HashVoteEntry]) -> Option<&HashVoteEntry> {
    let mut best: Option<&HashVoteEntry> = None;
    for entry in entries {
        match best {
            Some(b) if entry.count() <= b.count() => {}
            _ => best = Some(entry),
        }
    }
    best
}
