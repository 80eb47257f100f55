//! In-memory model of parents and their ordered children.
//!
//! `Layout` applies the same plans the Postgres store applies, which makes it
//! the reference model for property tests. The density checks at the bottom
//! work on raw stored values and back the `taskboard audit` command.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use thiserror::Error;

use crate::error::Result;
use crate::position::{next_position, plan_move, plan_removal, MovePlan, Position, RangeShift, Slot};

/// Why a parent's stored positions are not exactly `1..=N`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityViolation {
    /// A value below 1 (or above the column range)
    #[error("position {value} is out of range")]
    OutOfRange { value: i64 },

    /// Two children share a position
    #[error("position {position} is used more than once")]
    Duplicate { position: i64 },

    /// A position is skipped
    #[error("position {missing} is missing")]
    Gap { missing: i64 },
}

/// Check that `positions` is a permutation of `1..=N`.
///
/// Reports the first violation in ascending position order.
pub fn check_dense(positions: impl IntoIterator<Item = i64>) -> std::result::Result<(), DensityViolation> {
    let mut sorted: Vec<i64> = positions.into_iter().collect();
    sorted.sort_unstable();

    let mut expected = 1i64;
    for value in sorted {
        if Position::new(value).is_err() {
            return Err(DensityViolation::OutOfRange { value });
        }
        if value < expected {
            return Err(DensityViolation::Duplicate { position: value });
        }
        if value > expected {
            return Err(DensityViolation::Gap { missing: expected });
        }
        expected += 1;
    }
    Ok(())
}

/// Renumber `entries` to `1..=N`, keeping their current relative order.
///
/// Ties (duplicates) keep the order in which they were supplied. Only entries
/// whose position actually changes are returned.
pub fn compact<I: Copy>(entries: &[(I, i64)]) -> Vec<(I, Position)> {
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by_key(|&idx| entries[idx].1);

    order
        .into_iter()
        .zip(1u32..)
        .filter(|&(idx, rank)| entries[idx].1 != i64::from(rank))
        .map(|(idx, rank)| (entries[idx].0, Position(rank)))
        .collect()
}

/// Parents holding ordered children.
#[derive(Debug, Clone)]
pub struct Layout<P, I> {
    parents: BTreeMap<P, BTreeMap<I, Position>>,
    homes: HashMap<I, P>,
}

impl<P, I> Default for Layout<P, I>
where
    P: Copy + Ord,
    I: Copy + Ord + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P, I> Layout<P, I>
where
    P: Copy + Ord,
    I: Copy + Ord + Hash,
{
    pub fn new() -> Self {
        Self {
            parents: BTreeMap::new(),
            homes: HashMap::new(),
        }
    }

    /// Register an empty parent.
    pub fn add_parent(&mut self, parent: P) {
        self.parents.entry(parent).or_default();
    }

    pub fn parents(&self) -> impl Iterator<Item = P> + '_ {
        self.parents.keys().copied()
    }

    /// Number of children in `parent`.
    pub fn len(&self, parent: P) -> u32 {
        self.parents
            .get(&parent)
            .map_or(0, |children| children.len() as u32)
    }

    pub fn slot_of(&self, item: I) -> Option<Slot<P>> {
        let parent = *self.homes.get(&item)?;
        let position = *self.parents.get(&parent)?.get(&item)?;
        Some(Slot::new(parent, position))
    }

    /// Append `item` after the last child of `parent`.
    pub fn append(&mut self, parent: P, item: I) -> Result<Position> {
        let children = self.parents.entry(parent).or_default();
        let position = next_position(children.values().max().copied())?;
        children.insert(item, position);
        self.homes.insert(item, parent);
        Ok(position)
    }

    /// Place `item` at `slot` without touching siblings. Used when loading
    /// stored rows, which may not be dense.
    pub fn place(&mut self, item: I, slot: Slot<P>) {
        if let Some(old) = self.homes.insert(item, slot.parent) {
            if let Some(children) = self.parents.get_mut(&old) {
                children.remove(&item);
            }
        }
        self.parents
            .entry(slot.parent)
            .or_default()
            .insert(item, slot.position);
    }

    /// Plan moving `item` to `requested` in `to_parent`, without applying it.
    pub fn plan(&self, item: I, to_parent: P, requested: Position) -> Option<MovePlan<P>> {
        let from = self.slot_of(item)?;
        Some(plan_move(from, to_parent, requested, self.len(to_parent)))
    }

    /// Apply a plan produced for `item`.
    pub fn apply(&mut self, item: I, plan: &MovePlan<P>) {
        for shift in &plan.shifts {
            self.shift(shift, Some(item));
        }
        self.place(item, plan.to);
    }

    /// Plan and apply a move. `None` when `item` is unknown.
    pub fn move_item(&mut self, item: I, to_parent: P, requested: Position) -> Option<MovePlan<P>> {
        let plan = self.plan(item, to_parent, requested)?;
        self.apply(item, &plan);
        Some(plan)
    }

    /// Remove `item` and close the gap it leaves.
    pub fn remove(&mut self, item: I) -> Option<Slot<P>> {
        let slot = self.slot_of(item)?;
        self.homes.remove(&item);
        if let Some(children) = self.parents.get_mut(&slot.parent) {
            children.remove(&item);
        }
        self.shift(&plan_removal(slot), None);
        Some(slot)
    }

    /// Children of `parent` in position order.
    pub fn order(&self, parent: P) -> Vec<I> {
        let mut children: Vec<(I, Position)> = self
            .parents
            .get(&parent)
            .map(|children| children.iter().map(|(item, pos)| (*item, *pos)).collect())
            .unwrap_or_default();
        children.sort_by_key(|&(item, position)| (position, item));
        children.into_iter().map(|(item, _)| item).collect()
    }

    /// Check one parent for gaps or duplicates.
    pub fn check(&self, parent: P) -> std::result::Result<(), DensityViolation> {
        let positions = self
            .parents
            .get(&parent)
            .into_iter()
            .flat_map(|children| children.values())
            .map(|position| i64::from(position.get()));
        check_dense(positions)
    }

    /// Every parent that is not dense.
    pub fn violations(&self) -> Vec<(P, DensityViolation)> {
        self.parents
            .keys()
            .filter_map(|&parent| self.check(parent).err().map(|violation| (parent, violation)))
            .collect()
    }

    fn shift(&mut self, shift: &RangeShift<P>, skip: Option<I>) {
        if let Some(children) = self.parents.get_mut(&shift.parent) {
            for (item, position) in children.iter_mut() {
                if Some(*item) != skip {
                    *position = shift.apply(*position);
                }
            }
        }
    }
}
