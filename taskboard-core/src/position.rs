//! Dense 1-based ordering of children inside a parent.
//!
//! Every parent (a board for lists, a list for cards) keeps its children at
//! positions `1..=N`. The planners in this module decide which sibling ranges
//! shift, and by how much, so the sequence stays dense across appends, moves
//! and removals. They never touch storage: the Postgres store applies plans
//! with bulk `UPDATE`s, [`crate::layout::Layout`] applies them in memory.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, Result};

/// Rank of a child within its parent. Always `>= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Position(pub(crate) u32);

impl Position {
    /// First slot of every parent.
    pub const FIRST: Position = Position(1);

    /// Largest storable position (positions live in `INTEGER` columns).
    pub const MAX: u32 = i32::MAX as u32;

    /// Largest position as a move target. Planning clamps it to the append
    /// slot, so it means "after every existing child".
    pub const LAST: Position = Position(Self::MAX);

    /// Validate a raw position.
    ///
    /// ```
    /// use taskboard_core::Position;
    ///
    /// assert_eq!(Position::new(3).unwrap().get(), 3);
    /// assert!(Position::new(0).is_err());
    /// assert!(Position::new(-2).is_err());
    /// ```
    pub fn new(value: i64) -> Result<Self> {
        if value < 1 || value > i64::from(Self::MAX) {
            return Err(CoreError::invalid_position(value));
        }
        Ok(Self(value as u32))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Value as bound into SQL.
    pub fn as_i32(self) -> i32 {
        self.0 as i32
    }

    /// The slot right after this one.
    pub fn next(self) -> Result<Self> {
        if self.0 >= Self::MAX {
            return Err(CoreError::PositionOverflow { last: self });
        }
        Ok(Self(self.0 + 1))
    }

    fn offset(self, delta: i32) -> Self {
        Self(self.0.saturating_add_signed(delta).clamp(1, Self::MAX))
    }
}

impl TryFrom<i32> for Position {
    type Error = CoreError;

    fn try_from(value: i32) -> Result<Self> {
        Self::new(i64::from(value))
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Position::new(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an item sits: its parent and its rank within that parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot<P> {
    pub parent: P,
    pub position: Position,
}

impl<P> Slot<P> {
    pub fn new(parent: P, position: Position) -> Self {
        Self { parent, position }
    }
}

/// Inclusive range of positions. An open `end` runs to the tail of the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRange {
    pub start: Position,
    pub end: Option<Position>,
}

impl PositionRange {
    /// `start..` (through the last child).
    pub fn from(start: Position) -> Self {
        Self { start, end: None }
    }

    /// `start..=end`, or `None` when the range is empty.
    pub fn between(start: Position, end: Position) -> Option<Self> {
        (start <= end).then_some(Self {
            start,
            end: Some(end),
        })
    }

    pub fn contains(&self, position: Position) -> bool {
        position >= self.start && self.end.map_or(true, |end| position <= end)
    }
}

impl fmt::Display for PositionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "[{}, {}]", self.start, end),
            None => write!(f, "[{}, ..)", self.start),
        }
    }
}

/// Bulk adjustment of every sibling in `parent` whose position lies in `range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeShift<P> {
    pub parent: P,
    pub range: PositionRange,
    pub delta: i32,
}

impl<P> RangeShift<P> {
    /// Open a slot: every sibling in `range` moves one step towards the tail.
    pub fn increment(parent: P, range: PositionRange) -> Self {
        Self {
            parent,
            range,
            delta: 1,
        }
    }

    /// Close a slot: every sibling in `range` moves one step towards the head.
    pub fn decrement(parent: P, range: PositionRange) -> Self {
        Self {
            parent,
            range,
            delta: -1,
        }
    }

    /// Position of a sibling after the shift.
    pub fn apply(&self, position: Position) -> Position {
        if self.range.contains(position) {
            position.offset(self.delta)
        } else {
            position
        }
    }
}

/// Result of planning a move: sibling shifts plus the item's final slot.
///
/// Shifts are listed in the order they must be applied, and none of them
/// covers the moving item's own source slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan<P> {
    pub from: Slot<P>,
    pub to: Slot<P>,
    pub shifts: Vec<RangeShift<P>>,
}

impl<P: Copy + Eq> MovePlan<P> {
    /// True when the item stays where it is and nothing else moves.
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.shifts.is_empty()
    }

    /// True when the item changes parent.
    pub fn is_reparent(&self) -> bool {
        self.from.parent != self.to.parent
    }

    /// Parents touched by this plan, source first. Contains one entry for a
    /// move inside a single parent.
    pub fn parents(&self) -> Vec<P> {
        if self.is_reparent() {
            vec![self.from.parent, self.to.parent]
        } else {
            vec![self.from.parent]
        }
    }
}

/// Plan moving the item at `from` to `requested` inside `to_parent`.
///
/// `destination_len` is the number of children currently in `to_parent`,
/// counting the moving item when it already lives there.
///
/// The requested position is clamped to the append slot: `N` inside the same
/// parent, `N + 1` in another one. Appending never shifts a destination
/// sibling.
///
/// ```
/// use taskboard_core::{plan_move, Position, Slot};
///
/// // c4 moves to the second slot of its own four-card list.
/// let plan = plan_move(Slot::new('L', Position::new(4).unwrap()), 'L', Position::new(2).unwrap(), 4);
/// assert_eq!(plan.to.position.get(), 2);
/// assert_eq!(plan.shifts.len(), 1);
/// assert_eq!(plan.shifts[0].delta, 1);
/// ```
pub fn plan_move<P: Copy + Eq>(
    from: Slot<P>,
    to_parent: P,
    requested: Position,
    destination_len: u32,
) -> MovePlan<P> {
    let old = from.position;

    if from.parent == to_parent {
        let append_slot = destination_len.max(old.get());
        let target = Position(requested.get().min(append_slot));

        let shifts = if target > old {
            // Vacated slot is filled by the ones in between.
            PositionRange::between(Position(old.get() + 1), target)
                .map(|range| RangeShift::decrement(to_parent, range))
                .into_iter()
                .collect()
        } else if target < old {
            PositionRange::between(target, Position(old.get() - 1))
                .map(|range| RangeShift::increment(to_parent, range))
                .into_iter()
                .collect()
        } else {
            Vec::new()
        };

        return MovePlan {
            from,
            to: Slot::new(to_parent, target),
            shifts,
        };
    }

    let append_slot = destination_len.saturating_add(1).min(Position::MAX);
    let target = Position(requested.get().min(append_slot));

    let mut shifts = vec![RangeShift::decrement(
        from.parent,
        PositionRange::from(old.offset(1)),
    )];
    if target.get() <= destination_len {
        shifts.push(RangeShift::increment(to_parent, PositionRange::from(target)));
    }

    MovePlan {
        from,
        to: Slot::new(to_parent, target),
        shifts,
    }
}

/// Position for a child appended after the current maximum, `1` if empty.
pub fn next_position(max: Option<Position>) -> Result<Position> {
    match max {
        Some(last) => last.next(),
        None => Ok(Position::FIRST),
    }
}

/// Shift that closes the gap left when the child at `slot` is removed.
pub fn plan_removal<P>(slot: Slot<P>) -> RangeShift<P> {
    RangeShift::decrement(slot.parent, PositionRange::from(slot.position.offset(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(value: i64) -> Position {
        Position::new(value).unwrap()
    }

    #[test]
    fn rejects_non_positive_positions() {
        assert!(matches!(
            Position::new(0),
            Err(CoreError::InvalidPosition { value: 0, .. })
        ));
        assert!(Position::new(-5).is_err());
        assert!(Position::new(i64::from(Position::MAX) + 1).is_err());
        assert!(Position::new(i64::from(Position::MAX)).is_ok());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Position = serde_json::from_str("4").unwrap();
        assert_eq!(ok, pos(4));
        assert!(serde_json::from_str::<Position>("0").is_err());
        assert!(serde_json::from_str::<Position>("-1").is_err());
    }

    #[test]
    fn same_parent_forward_closes_vacated_slot() {
        let plan = plan_move(Slot::new(1, pos(2)), 1, pos(4), 5);
        assert_eq!(plan.to, Slot::new(1, pos(4)));
        assert_eq!(
            plan.shifts,
            vec![RangeShift::decrement(
                1,
                PositionRange::between(pos(3), pos(4)).unwrap()
            )]
        );
    }

    #[test]
    fn same_parent_backward_opens_slot() {
        let plan = plan_move(Slot::new(1, pos(4)), 1, pos(2), 4);
        assert_eq!(
            plan.shifts,
            vec![RangeShift::increment(
                1,
                PositionRange::between(pos(2), pos(3)).unwrap()
            )]
        );
    }

    #[test]
    fn same_slot_is_noop() {
        let plan = plan_move(Slot::new(1, pos(3)), 1, pos(3), 4);
        assert!(plan.is_noop());
        assert!(!plan.is_reparent());
    }

    #[test]
    fn same_parent_clamps_to_last_slot() {
        let plan = plan_move(Slot::new(1, pos(1)), 1, pos(40), 3);
        assert_eq!(plan.to.position, pos(3));
        assert_eq!(
            plan.shifts,
            vec![RangeShift::decrement(
                1,
                PositionRange::between(pos(2), pos(3)).unwrap()
            )]
        );
    }

    #[test]
    fn cross_parent_shifts_both_sides() {
        let plan = plan_move(Slot::new('A', pos(1)), 'B', pos(2), 3);
        assert!(plan.is_reparent());
        assert_eq!(plan.parents(), vec!['A', 'B']);
        assert_eq!(
            plan.shifts,
            vec![
                RangeShift::decrement('A', PositionRange::from(pos(2))),
                RangeShift::increment('B', PositionRange::from(pos(2))),
            ]
        );
    }

    #[test]
    fn cross_parent_append_leaves_destination_alone() {
        let plan = plan_move(Slot::new('A', pos(2)), 'B', pos(4), 3);
        assert_eq!(plan.to, Slot::new('B', pos(4)));
        assert!(plan.shifts.iter().all(|s| s.parent == 'A'));
    }

    #[test]
    fn cross_parent_clamps_past_append_slot() {
        let plan = plan_move(Slot::new('A', pos(1)), 'B', pos(99), 3);
        assert_eq!(plan.to.position, pos(4));
        assert!(plan.shifts.iter().all(|s| s.parent == 'A'));

        let empty = plan_move(Slot::new('A', pos(1)), 'B', pos(7), 0);
        assert_eq!(empty.to.position, Position::FIRST);
    }

    #[test]
    fn range_shift_apply() {
        let shift = RangeShift::increment(0, PositionRange::between(pos(2), pos(3)).unwrap());
        assert_eq!(shift.apply(pos(1)), pos(1));
        assert_eq!(shift.apply(pos(2)), pos(3));
        assert_eq!(shift.apply(pos(3)), pos(4));
        assert_eq!(shift.apply(pos(4)), pos(4));
    }

    #[test]
    fn empty_range_is_none() {
        assert!(PositionRange::between(pos(3), pos(2)).is_none());
        assert_eq!(PositionRange::from(pos(5)).to_string(), "[5, ..)");
    }

    #[test]
    fn next_position_appends() {
        assert_eq!(next_position(None).unwrap(), Position::FIRST);
        assert_eq!(next_position(Some(pos(9))).unwrap(), pos(10));
        assert!(matches!(
            next_position(Some(pos(i64::from(Position::MAX)))),
            Err(CoreError::PositionOverflow { .. })
        ));
    }

    #[test]
    fn removal_closes_tail() {
        let shift = plan_removal(Slot::new(7, pos(2)));
        assert_eq!(shift.parent, 7);
        assert_eq!(shift.delta, -1);
        assert_eq!(shift.range, PositionRange::from(pos(3)));
    }
}
