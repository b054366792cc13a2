//! Reordering of a link set.
//!
//! A reorder is an array move: the dragged link is removed from its old index
//! and reinserted at the new one. Only links inside the inclusive range
//! between the two indices change position, so that range is all a caller
//! needs to persist.

use std::cmp::Ordering;
use std::ops::RangeInclusive;

use thiserror::Error;
use uuid::Uuid;

use crate::link::{LinkEntity, PositionUpdate};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReorderError {
    #[error("index {index} is out of bounds for a list of {len} links")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("link {0} is not part of this list")]
    UnknownLink(Uuid),
}

/// The outcome of moving one link inside an ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reorder {
    /// The full list in its new order, with positions reassigned in `range`.
    pub order: Vec<LinkEntity>,
    /// Indices of `order` whose position was reassigned.
    pub range: RangeInclusive<usize>,
    /// One update per link in `range`, in list order.
    pub updates: Vec<PositionUpdate>,
}

impl Reorder {
    pub fn is_noop(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Display order: by position, then oldest first.
pub fn display_order(a: &LinkEntity, b: &LinkEntity) -> Ordering {
    a.position
        .cmp(&b.position)
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Sort links the way they are displayed.
pub fn sort_by_position(links: &mut [LinkEntity]) {
    links.sort_by(display_order);
}

pub fn index_of(links: &[LinkEntity], id: Uuid) -> Result<usize, ReorderError> {
    links
        .iter()
        .position(|link| link.id == id)
        .ok_or(ReorderError::UnknownLink(id))
}

/// The inclusive range of indices touched by moving `old_index` to `new_index`.
pub fn changed_range(old_index: usize, new_index: usize) -> RangeInclusive<usize> {
    old_index.min(new_index)..=old_index.max(new_index)
}

/// Remove the item at `old_index` and reinsert it at `new_index`.
pub fn move_item<T>(
    items: &mut Vec<T>,
    old_index: usize,
    new_index: usize,
) -> Result<(), ReorderError> {
    let len = items.len();
    for index in [old_index, new_index] {
        if index >= len {
            return Err(ReorderError::IndexOutOfBounds { index, len });
        }
    }

    let item = items.remove(old_index);
    items.insert(new_index, item);
    Ok(())
}

/// Move a link and compute the position updates of the changed range.
///
/// `links` must be sorted by position. The links in the range are given the
/// position values the range held before the move, in ascending order. On a
/// dense list that is simply their index; on a list with gaps left by deletes
/// it keeps every position unique and every link outside the range in order.
pub fn reorder(
    links: &[LinkEntity],
    old_index: usize,
    new_index: usize,
) -> Result<Reorder, ReorderError> {
    let mut order = links.to_vec();
    move_item(&mut order, old_index, new_index)?;

    let range = changed_range(old_index, new_index);
    if old_index == new_index {
        return Ok(Reorder {
            order,
            range,
            updates: Vec::new(),
        });
    }

    let mut slots: Vec<i32> = links[range.clone()].iter().map(|l| l.position).collect();
    slots.sort_unstable();

    let updates = order[range.clone()]
        .iter_mut()
        .zip(slots)
        .map(|(link, position)| {
            link.position = position;
            PositionUpdate {
                id: link.id,
                position,
            }
        })
        .collect();

    Ok(Reorder {
        order,
        range,
        updates,
    })
}
