//! Collection progress aggregation
//!
//! Groups the catalog by pack and reports how much of each pack (and of the
//! whole catalog) the user owns. Ownership is derived: a card is owned when
//! it is not in the missing set.

use std::collections::HashSet;

use crate::catalog::Card;

/// Name of the aggregate row covering the whole catalog
pub const ALL_PACKS: &str = "All Packs";

/// Completion of a single pack (or of the whole catalog)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackProgress {
    pub pack: String,
    pub total: usize,
    pub owned: usize,
    /// Whole percent, floored; exactly 100 only at full completion
    pub percentage: u8,
}

fn percentage(owned: usize, total: usize) -> u8 {
    // Floor would report 99% with every card owned when total doesn't divide
    // evenly, so completion is pinned to exactly 100
    if owned == total {
        100
    } else {
        (owned * 100 / total) as u8
    }
}

/// Per-pack completion plus an [`ALL_PACKS`] overall row, sorted descending
/// by percentage. Packs with no cards produce no row; an empty catalog
/// produces no rows at all.
pub fn pack_progress(catalog: &[Card], my_missing: &HashSet<String>) -> Vec<PackProgress> {
    let mut packs: Vec<(String, usize, usize)> = Vec::new();
    let mut total = 0usize;
    let mut owned = 0usize;

    for card in catalog {
        let entry = match packs.iter_mut().find(|(name, _, _)| *name == card.pack) {
            Some(entry) => entry,
            None => {
                packs.push((card.pack.clone(), 0, 0));
                packs.last_mut().unwrap()
            }
        };

        entry.1 += 1;
        total += 1;
        if !my_missing.contains(&card.id) {
            entry.2 += 1;
            owned += 1;
        }
    }

    let mut rows: Vec<PackProgress> = packs
        .into_iter()
        .map(|(pack, total, owned)| PackProgress {
            pack,
            total,
            owned,
            percentage: percentage(owned, total),
        })
        .collect();

    if total > 0 {
        rows.push(PackProgress {
            pack: ALL_PACKS.to_string(),
            total,
            owned,
            percentage: percentage(owned, total),
        });
    }

    rows.sort_by(|a, b| b.percentage.cmp(&a.percentage));
    rows
}

/// The overall row out of a [`pack_progress`] result
pub fn overall(rows: &[PackProgress]) -> Option<&PackProgress> {
    rows.iter().find(|row| row.pack == ALL_PACKS)
}
