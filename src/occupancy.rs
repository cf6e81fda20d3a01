use crate::data::{Catalog, Day, Grid, SlotIndex};
use itertools::Itertools;
use std::collections::{BTreeSet, HashMap};

/// Slots each teacher already holds, per day, within one section's grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyIndex {
    claimed: HashMap<String, HashMap<Day, BTreeSet<SlotIndex>>>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        OccupancyIndex::default()
    }

    /// Rebuilds the index from a finished grid.
    pub fn from_grid(grid: &Grid, catalog: &Catalog) -> Self {
        let by_teacher = grid
            .occupied()
            .filter_map(|(day, slot, p)| {
                catalog
                    .teacher_of(p.subject)
                    .map(|teacher| (teacher.to_string(), (day, slot)))
            })
            .into_group_map();

        let mut index = OccupancyIndex::new();
        for (teacher, slots) in by_teacher {
            for (day, slot) in slots {
                index.claim(&teacher, day, slot);
            }
        }
        index
    }

    pub fn is_free(&self, teacher: &str, day: Day, slot: SlotIndex) -> bool {
        !self
            .claimed
            .get(teacher)
            .and_then(|days| days.get(&day))
            .is_some_and(|slots| slots.contains(&slot))
    }

    /// Returns false if the teacher already held that slot.
    pub fn claim(&mut self, teacher: &str, day: Day, slot: SlotIndex) -> bool {
        self.claimed
            .entry(teacher.to_string())
            .or_default()
            .entry(day)
            .or_default()
            .insert(slot)
    }

    pub fn load(&self, teacher: &str) -> usize {
        self.claimed
            .get(teacher)
            .map(|days| days.values().map(BTreeSet::len).sum())
            .unwrap_or(0)
    }
}
