use proptest::prelude::*;
use taskboard_core::{Layout, Position};

const LISTS: u8 = 4;

#[derive(Debug, Clone)]
enum Op {
    Append { list: u8 },
    Move { pick: usize, list: u8, position: i64 },
    Remove { pick: usize },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..LISTS).prop_map(|list| Op::Append { list }),
        4 => (any::<usize>(), 0..LISTS, 1i64..12)
            .prop_map(|(pick, list, position)| Op::Move { pick, list, position }),
        1 => any::<usize>().prop_map(|pick| Op::Remove { pick }),
    ]
}

/// Build a layout with `sizes[i]` cards in list `i`, cards numbered from 0.
fn seeded(sizes: &[u8]) -> (Layout<u8, u32>, Vec<u32>) {
    let mut layout = Layout::new();
    let mut items = Vec::new();
    let mut next = 0u32;
    for (list, &size) in sizes.iter().enumerate() {
        layout.add_parent(list as u8);
        for _ in 0..size {
            layout.append(list as u8, next).unwrap();
            items.push(next);
            next += 1;
        }
    }
    (layout, items)
}

fn snapshot(layout: &Layout<u8, u32>) -> Vec<Vec<u32>> {
    (0..LISTS).map(|list| layout.order(list)).collect()
}

proptest! {
    /// Property: every list stays dense after any sequence of operations
    #[test]
    fn prop_sequences_stay_dense(ops in prop::collection::vec(arb_op(), 0..80)) {
        let (mut layout, mut items) = seeded(&[0; LISTS as usize]);
        let mut next = 0u32;

        for op in ops {
            match op {
                Op::Append { list } => {
                    layout.append(list, next).unwrap();
                    items.push(next);
                    next += 1;
                }
                Op::Move { pick, list, position } if !items.is_empty() => {
                    let item = items[pick % items.len()];
                    layout.move_item(item, list, Position::new(position).unwrap()).unwrap();
                }
                Op::Remove { pick } if !items.is_empty() => {
                    let item = items.swap_remove(pick % items.len());
                    layout.remove(item).unwrap();
                }
                _ => {}
            }
            prop_assert!(layout.violations().is_empty(), "violations: {:?}", layout.violations());
        }

        let total: u32 = (0..LISTS).map(|list| layout.len(list)).sum();
        prop_assert_eq!(total as usize, items.len());
    }

    /// Property: moving an item onto its own slot changes nothing
    #[test]
    fn prop_move_to_own_slot_is_noop(sizes in prop::collection::vec(1u8..8, LISTS as usize), pick in any::<usize>()) {
        let (mut layout, items) = seeded(&sizes);
        let item = items[pick % items.len()];
        let slot = layout.slot_of(item).unwrap();
        let before = snapshot(&layout);

        let plan = layout.move_item(item, slot.parent, slot.position).unwrap();

        prop_assert!(plan.is_noop());
        prop_assert_eq!(snapshot(&layout), before);
    }

    /// Property: A -> B -> A restores every position in both lists
    #[test]
    fn prop_round_trip_restores_layout(
        sizes in prop::collection::vec(1u8..8, LISTS as usize),
        pick in any::<usize>(),
        to_list in 0..LISTS,
        to_position in 1i64..10,
    ) {
        let (mut layout, items) = seeded(&sizes);
        let item = items[pick % items.len()];
        let home = layout.slot_of(item).unwrap();
        let before = snapshot(&layout);

        layout.move_item(item, to_list, Position::new(to_position).unwrap()).unwrap();
        layout.move_item(item, home.parent, home.position).unwrap();

        prop_assert_eq!(layout.slot_of(item).unwrap(), home);
        prop_assert_eq!(snapshot(&layout), before);
    }

    /// Property: appending into another list never shifts its children
    #[test]
    fn prop_append_keeps_destination(sizes in prop::collection::vec(1u8..8, LISTS as usize), pick in any::<usize>()) {
        let (mut layout, items) = seeded(&sizes);
        let item = items[pick % items.len()];
        let source = layout.slot_of(item).unwrap().parent;
        let destination = (source + 1) % LISTS;
        let untouched: Vec<_> = layout
            .order(destination)
            .into_iter()
            .map(|other| (other, layout.slot_of(other).unwrap()))
            .collect();

        let append = Position::new(i64::from(layout.len(destination)) + 1).unwrap();
        let plan = layout.move_item(item, destination, append).unwrap();

        prop_assert!(plan.shifts.iter().all(|shift| shift.parent != destination));
        for (other, slot) in untouched {
            prop_assert_eq!(layout.slot_of(other).unwrap(), slot);
        }
        prop_assert_eq!(layout.order(destination).last().copied(), Some(item));
    }
}

#[test]
fn scenario_reorder_inside_list() {
    let (mut layout, _) = seeded(&[4]);
    // cards 0..=3 are c1..c4
    layout.move_item(3, 0, Position::new(2).unwrap()).unwrap();
    assert_eq!(layout.order(0), vec![0, 3, 1, 2]);
}

#[test]
fn scenario_move_between_lists() {
    // A = [a1, a2] (0, 1), B = [b1, b2, b3] (2, 3, 4)
    let (mut layout, _) = seeded(&[2, 3]);
    layout.move_item(0, 1, Position::new(2).unwrap()).unwrap();

    assert_eq!(layout.order(0), vec![1]);
    assert_eq!(layout.order(1), vec![2, 0, 3, 4]);
    assert_eq!(layout.slot_of(1).unwrap().position, Position::FIRST);
    assert!(layout.violations().is_empty());
}
