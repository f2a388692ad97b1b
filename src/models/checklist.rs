//! Packing checklist and its consolidation

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One thing to pack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub name: String,
    pub quantity: u32,
    #[serde(default)]
    pub applicable_dates: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

/// Everything to pack for the trip
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackingChecklist {
    pub items: Vec<ChecklistItem>,
}

fn merge_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl PackingChecklist {
    /// Merge entries that name the same item and repair zero quantities
    ///
    /// Names compare case-insensitively; the first spelling wins. Quantities
    /// add up when the entries cover different dates; entries sharing a date
    /// describe the same pieces, so the larger quantity is kept. Sums
    /// saturate at `u32::MAX`. Date sets union, distinct notes are joined
    /// with "; ", and an item stays optional only if every merged entry was
    /// optional. Applying this twice gives the same checklist as applying it
    /// once.
    #[must_use]
    pub fn consolidate(self) -> Self {
        let mut merged: Vec<ChecklistItem> = Vec::with_capacity(self.items.len());

        for mut item in self.items {
            item.name = item.name.trim().to_string();
            if item.name.is_empty() {
                continue;
            }
            let key = merge_key(&item.name);
            match merged.iter_mut().find(|existing| merge_key(&existing.name) == key) {
                Some(existing) => {
                    let overlapping = !existing.applicable_dates.is_disjoint(&item.applicable_dates);
                    existing.quantity = if overlapping {
                        existing.quantity.max(item.quantity)
                    } else {
                        existing.quantity.saturating_add(item.quantity)
                    };
                    existing.applicable_dates.extend(item.applicable_dates);
                    existing.optional &= item.optional;
                    existing.notes = join_notes(existing.notes.take(), item.notes);
                }
                None => merged.push(item),
            }
        }

        for item in &mut merged {
            if item.quantity == 0 {
                item.quantity = u32::try_from(item.applicable_dates.len()).unwrap_or(1).max(1);
            }
        }

        Self { items: merged }
    }

    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |total, item| total.saturating_add(item.quantity))
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ChecklistItem> {
        let key = merge_key(name);
        self.items.iter().find(|item| merge_key(&item.name) == key)
    }
}

fn join_notes(left: Option<String>, right: Option<String>) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for note in [left, right].into_iter().flatten() {
        for part in note.split("; ") {
            let part = part.trim();
            if !part.is_empty() && !parts.iter().any(|p| p == part) {
                parts.push(part.to_string());
            }
        }
    }
    if parts.is_empty() { None } else { Some(parts.join("; ")) }
}
