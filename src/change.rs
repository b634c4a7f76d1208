use alloc::vec::Vec;
use core::ops::RangeInclusive;

use crate::ItemPath;

/// A section-level mutation. Ranges are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SectionChange {
    Insert { start: usize, end: usize },
    Remove { start: usize, end: usize },
    Replace { start: usize, end: usize },
    Move { from: usize, to: usize },
    Refresh { section: usize },
}

/// An item-level mutation confined to one section (or, for `Move`, two). Ranges are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemChange {
    Insert {
        section: usize,
        start: usize,
        end: usize,
    },
    Remove {
        section: usize,
        start: usize,
        end: usize,
    },
    Replace {
        section: usize,
        start: usize,
        end: usize,
    },
    Move {
        from: ItemPath,
        to: ItemPath,
    },
    Refresh {
        section: usize,
        item: usize,
    },
}

/// A mutation of the hierarchical model, as published by a [`crate::SectionSource`].
///
/// By the time a change is delivered the source has already applied it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SourceChange {
    Reset,
    Section(SectionChange),
    Item(ItemChange),
}

/// The `(start_section, start_item, end_section, end_item)` view of a [`SourceChange`].
///
/// Section-level changes carry `-1` as both item indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangeBounds {
    pub start_section: isize,
    pub start_item: isize,
    pub end_section: isize,
    pub end_item: isize,
}

impl ChangeBounds {
    fn sections(start: usize, end: usize) -> Self {
        Self {
            start_section: start as isize,
            start_item: -1,
            end_section: end as isize,
            end_item: -1,
        }
    }

    fn items(start: ItemPath, end: ItemPath) -> Self {
        Self {
            start_section: start.section as isize,
            start_item: start.item as isize,
            end_section: end.section as isize,
            end_item: end.item as isize,
        }
    }
}

impl SourceChange {
    pub fn insert_sections(start: usize, end: usize) -> Self {
        Self::Section(SectionChange::Insert { start, end })
    }

    pub fn remove_sections(start: usize, end: usize) -> Self {
        Self::Section(SectionChange::Remove { start, end })
    }

    pub fn replace_sections(start: usize, end: usize) -> Self {
        Self::Section(SectionChange::Replace { start, end })
    }

    pub fn move_section(from: usize, to: usize) -> Self {
        Self::Section(SectionChange::Move { from, to })
    }

    pub fn refresh_section(section: usize) -> Self {
        Self::Section(SectionChange::Refresh { section })
    }

    pub fn insert_items(section: usize, start: usize, end: usize) -> Self {
        Self::Item(ItemChange::Insert {
            section,
            start,
            end,
        })
    }

    pub fn remove_items(section: usize, start: usize, end: usize) -> Self {
        Self::Item(ItemChange::Remove {
            section,
            start,
            end,
        })
    }

    pub fn replace_items(section: usize, start: usize, end: usize) -> Self {
        Self::Item(ItemChange::Replace {
            section,
            start,
            end,
        })
    }

    pub fn move_item(from: ItemPath, to: ItemPath) -> Self {
        Self::Item(ItemChange::Move { from, to })
    }

    pub fn refresh_item(section: usize, item: usize) -> Self {
        Self::Item(ItemChange::Refresh { section, item })
    }

    /// `true` for everything that is not an item-level change (`Reset` included).
    pub fn is_section_change(&self) -> bool {
        !matches!(self, Self::Item(_))
    }

    /// Returns `None` for `Reset`, which has no bounds.
    pub fn bounds(&self) -> Option<ChangeBounds> {
        let bounds = match *self {
            Self::Reset => return None,
            Self::Section(change) => match change {
                SectionChange::Insert { start, end }
                | SectionChange::Remove { start, end }
                | SectionChange::Replace { start, end } => ChangeBounds::sections(start, end),
                SectionChange::Move { from, to } => ChangeBounds::sections(from, to),
                SectionChange::Refresh { section } => ChangeBounds::sections(section, section),
            },
            Self::Item(change) => match change {
                ItemChange::Insert {
                    section,
                    start,
                    end,
                }
                | ItemChange::Remove {
                    section,
                    start,
                    end,
                }
                | ItemChange::Replace {
                    section,
                    start,
                    end,
                } => {
                    ChangeBounds::items(ItemPath::new(section, start), ItemPath::new(section, end))
                }
                ItemChange::Move { from, to } => ChangeBounds::items(from, to),
                ItemChange::Refresh { section, item } => {
                    let path = ItemPath::new(section, item);
                    ChangeBounds::items(path, path)
                }
            },
        };
        Some(bounds)
    }
}

/// A mutation of the flat index space. Ranges are inclusive.
///
/// `MoveItem` follows the usual list-diff convention: the slot at `from` is taken out and
/// reinserted so that it ends up at `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlatChange {
    Reset,
    InsertItem(usize),
    InsertItemRange { start: usize, end: usize },
    RemoveItem(usize),
    RemoveItemRange { start: usize, end: usize },
    ReplaceItem(usize),
    ReplaceItemRange { start: usize, end: usize },
    MoveItem { from: usize, to: usize },
    RefreshItem(usize),
}

impl FlatChange {
    pub fn insert(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "FlatChange::insert: start > end");
        if start == end {
            Self::InsertItem(start)
        } else {
            Self::InsertItemRange { start, end }
        }
    }

    pub fn remove(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "FlatChange::remove: start > end");
        if start == end {
            Self::RemoveItem(start)
        } else {
            Self::RemoveItemRange { start, end }
        }
    }

    pub fn replace(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "FlatChange::replace: start > end");
        if start == end {
            Self::ReplaceItem(start)
        } else {
            Self::ReplaceItemRange { start, end }
        }
    }

    /// The flat indices this change touches. `None` for `Reset` and `MoveItem`.
    pub fn range(&self) -> Option<RangeInclusive<usize>> {
        match *self {
            Self::Reset | Self::MoveItem { .. } => None,
            Self::InsertItem(i)
            | Self::RemoveItem(i)
            | Self::ReplaceItem(i)
            | Self::RefreshItem(i) => Some(i..=i),
            Self::InsertItemRange { start, end }
            | Self::RemoveItemRange { start, end }
            | Self::ReplaceItemRange { start, end } => Some(start..=end),
        }
    }
}

/// An ordered batch of changes published in one notification.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangeSet<C> {
    changes: Vec<C>,
}

pub type SourceChangeSet = ChangeSet<SourceChange>;
pub type FlatChangeSet = ChangeSet<FlatChange>;

impl<C> ChangeSet<C> {
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    pub fn single(change: C) -> Self {
        Self {
            changes: alloc::vec![change],
        }
    }

    pub fn push(&mut self, change: C) {
        self.changes.push(change);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, C> {
        self.changes.iter()
    }

    pub fn as_slice(&self) -> &[C] {
        &self.changes
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }
}

impl SourceChangeSet {
    pub fn is_reset(&self) -> bool {
        self.changes.iter().any(|c| matches!(c, SourceChange::Reset))
    }
}

impl FlatChangeSet {
    pub fn is_reset(&self) -> bool {
        self.changes.iter().any(|c| matches!(c, FlatChange::Reset))
    }
}

impl<C> From<C> for ChangeSet<C> {
    fn from(change: C) -> Self {
        Self::single(change)
    }
}

impl<C> FromIterator<C> for ChangeSet<C> {
    fn from_iter<T: IntoIterator<Item = C>>(iter: T) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}

impl<C> IntoIterator for ChangeSet<C> {
    type Item = C;
    type IntoIter = alloc::vec::IntoIter<C>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl<'a, C> IntoIterator for &'a ChangeSet<C> {
    type Item = &'a C;
    type IntoIter = core::slice::Iter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}
