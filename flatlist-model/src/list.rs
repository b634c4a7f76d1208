use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::ops::Range;

use flatlist::{
    ItemPath, Listeners, SectionSource, SourceChange, SourceChangeSet, Subscription,
};

use crate::ModelError;

/// One section of a [`SectionedList`]: the section's own value plus its items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Section<S, T> {
    pub value: S,
    pub items: Vec<T>,
}

impl<S, T> Section<S, T> {
    pub fn new(value: S, items: Vec<T>) -> Self {
        Self { value, items }
    }
}

/// An observable, in-memory sectioned model.
///
/// Every mutator applies the change, releases its internal borrow, then publishes the matching
/// [`SourceChange`], so listeners can read the list (or mutate it again) from their callback.
/// Out-of-range mutations return a [`ModelError`] and publish nothing.
pub struct SectionedList<S, T> {
    sections: RefCell<Vec<Section<S, T>>>,
    listeners: Listeners<SourceChangeSet>,
}

impl<S: 'static, T: 'static> SectionedList<S, T> {
    pub fn new() -> Self {
        Self::from_sections(Vec::new())
    }

    pub fn from_sections(sections: Vec<Section<S, T>>) -> Self {
        Self {
            sections: RefCell::new(sections),
            listeners: Listeners::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.sections.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.borrow().is_empty()
    }

    /// Total number of items across all sections.
    pub fn total_items(&self) -> usize {
        self.sections.borrow().iter().map(|s| s.items.len()).sum()
    }

    /// Runs `f` against the current sections.
    pub fn with_sections<R>(&self, f: impl FnOnce(&[Section<S, T>]) -> R) -> R {
        f(&self.sections.borrow())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn publish(&self, change: SourceChange) {
        mtrace!(?change, "publish");
        self.listeners.emit(&SourceChangeSet::single(change));
    }

    fn check_section(sections: &[Section<S, T>], section: usize) -> Result<(), ModelError> {
        if section < sections.len() {
            Ok(())
        } else {
            Err(ModelError::SectionOutOfRange {
                section,
                count: sections.len(),
            })
        }
    }

    fn check_range(range: &Range<usize>, len: usize) -> Result<(), ModelError> {
        if range.start > range.end || range.end > len {
            return Err(ModelError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        Ok(())
    }

    /// Appends a section and returns its index.
    pub fn push_section(&self, value: S, items: Vec<T>) -> usize {
        let index = {
            let mut sections = self.sections.borrow_mut();
            sections.push(Section::new(value, items));
            sections.len() - 1
        };
        self.publish(SourceChange::insert_sections(index, index));
        index
    }

    /// Inserts `new` before section `at`.
    pub fn insert_sections(&self, at: usize, new: Vec<Section<S, T>>) -> Result<(), ModelError> {
        let count = new.len();
        {
            let mut sections = self.sections.borrow_mut();
            if at > sections.len() {
                return Err(ModelError::SectionOutOfRange {
                    section: at,
                    count: sections.len(),
                });
            }
            if count == 0 {
                return Ok(());
            }
            sections.splice(at..at, new);
        }
        self.publish(SourceChange::insert_sections(at, at + count - 1));
        Ok(())
    }

    pub fn remove_sections(&self, range: Range<usize>) -> Result<Vec<Section<S, T>>, ModelError> {
        let removed: Vec<Section<S, T>> = {
            let mut sections = self.sections.borrow_mut();
            Self::check_range(&range, sections.len())?;
            if range.is_empty() {
                return Ok(Vec::new());
            }
            sections.drain(range.clone()).collect()
        };
        self.publish(SourceChange::remove_sections(range.start, range.end - 1));
        Ok(removed)
    }

    /// Replaces consecutive sections starting at `start` and returns the old ones.
    pub fn replace_sections(
        &self,
        start: usize,
        new: Vec<Section<S, T>>,
    ) -> Result<Vec<Section<S, T>>, ModelError> {
        let count = new.len();
        let old: Vec<Section<S, T>> = {
            let mut sections = self.sections.borrow_mut();
            let range = start..start + count;
            Self::check_range(&range, sections.len())?;
            if count == 0 {
                return Ok(Vec::new());
            }
            sections.splice(range, new).collect()
        };
        self.publish(SourceChange::replace_sections(start, start + count - 1));
        Ok(old)
    }

    pub fn replace_section(
        &self,
        index: usize,
        value: S,
        items: Vec<T>,
    ) -> Result<Section<S, T>, ModelError> {
        let mut old = self.replace_sections(index, alloc::vec![Section::new(value, items)])?;
        old.pop().ok_or(ModelError::SectionOutOfRange {
            section: index,
            count: self.len(),
        })
    }

    /// Moves section `from` so that it ends up at index `to`.
    pub fn move_section(&self, from: usize, to: usize) -> Result<(), ModelError> {
        {
            let mut sections = self.sections.borrow_mut();
            Self::check_section(&sections, from)?;
            Self::check_section(&sections, to)?;
            if from == to {
                return Ok(());
            }
            let section = sections.remove(from);
            sections.insert(to, section);
        }
        self.publish(SourceChange::move_section(from, to));
        Ok(())
    }

    /// Announces that a section's content changed in place.
    pub fn refresh_section(&self, section: usize) -> Result<(), ModelError> {
        Self::check_section(&self.sections.borrow(), section)?;
        self.publish(SourceChange::refresh_section(section));
        Ok(())
    }

    /// Replaces a section's value without touching its items.
    pub fn set_section_value(&self, section: usize, value: S) -> Result<S, ModelError> {
        let old = {
            let mut sections = self.sections.borrow_mut();
            Self::check_section(&sections, section)?;
            core::mem::replace(&mut sections[section].value, value)
        };
        self.publish(SourceChange::refresh_section(section));
        Ok(old)
    }

    pub fn insert_items(&self, section: usize, at: usize, new: Vec<T>) -> Result<(), ModelError> {
        let count = new.len();
        {
            let mut sections = self.sections.borrow_mut();
            Self::check_section(&sections, section)?;
            let items = &mut sections[section].items;
            if at > items.len() {
                return Err(ModelError::ItemOutOfRange {
                    section,
                    item: at,
                    count: items.len(),
                });
            }
            if count == 0 {
                return Ok(());
            }
            items.splice(at..at, new);
        }
        self.publish(SourceChange::insert_items(section, at, at + count - 1));
        Ok(())
    }

    pub fn push_item(&self, section: usize, item: T) -> Result<usize, ModelError> {
        let at = {
            let sections = self.sections.borrow();
            Self::check_section(&sections, section)?;
            sections[section].items.len()
        };
        self.insert_items(section, at, alloc::vec![item])?;
        Ok(at)
    }

    pub fn remove_items(&self, section: usize, range: Range<usize>) -> Result<Vec<T>, ModelError> {
        let removed: Vec<T> = {
            let mut sections = self.sections.borrow_mut();
            Self::check_section(&sections, section)?;
            let items = &mut sections[section].items;
            Self::check_range(&range, items.len())?;
            if range.is_empty() {
                return Ok(Vec::new());
            }
            items.drain(range.clone()).collect()
        };
        self.publish(SourceChange::remove_items(section, range.start, range.end - 1));
        Ok(removed)
    }

    /// Replaces consecutive items starting at `start` and returns the old ones.
    pub fn replace_items(
        &self,
        section: usize,
        start: usize,
        new: Vec<T>,
    ) -> Result<Vec<T>, ModelError> {
        let count = new.len();
        let old: Vec<T> = {
            let mut sections = self.sections.borrow_mut();
            Self::check_section(&sections, section)?;
            let items = &mut sections[section].items;
            let range = start..start + count;
            Self::check_range(&range, items.len())?;
            if count == 0 {
                return Ok(Vec::new());
            }
            items.splice(range, new).collect()
        };
        self.publish(SourceChange::replace_items(section, start, start + count - 1));
        Ok(old)
    }

    /// Moves one item so that it ends up at `to`, possibly in another section.
    pub fn move_item(&self, from: ItemPath, to: ItemPath) -> Result<(), ModelError> {
        {
            let mut sections = self.sections.borrow_mut();
            Self::check_section(&sections, from.section)?;
            Self::check_section(&sections, to.section)?;
            let from_len = sections[from.section].items.len();
            if from.item >= from_len {
                return Err(ModelError::ItemOutOfRange {
                    section: from.section,
                    item: from.item,
                    count: from_len,
                });
            }
            // Destination length once the item has left its old slot.
            let to_len = if from.section == to.section {
                from_len - 1
            } else {
                sections[to.section].items.len()
            };
            if to.item > to_len {
                return Err(ModelError::ItemOutOfRange {
                    section: to.section,
                    item: to.item,
                    count: to_len,
                });
            }
            if from == to {
                return Ok(());
            }
            let item = sections[from.section].items.remove(from.item);
            sections[to.section].items.insert(to.item, item);
        }
        self.publish(SourceChange::move_item(from, to));
        Ok(())
    }

    /// Announces that an item's content changed in place.
    pub fn refresh_item(&self, section: usize, item: usize) -> Result<(), ModelError> {
        {
            let sections = self.sections.borrow();
            Self::check_section(&sections, section)?;
            let count = sections[section].items.len();
            if item >= count {
                return Err(ModelError::ItemOutOfRange {
                    section,
                    item,
                    count,
                });
            }
        }
        self.publish(SourceChange::refresh_item(section, item));
        Ok(())
    }

    /// Replaces everything and publishes a `Reset`.
    pub fn reset(&self, sections: Vec<Section<S, T>>) {
        *self.sections.borrow_mut() = sections;
        self.publish(SourceChange::Reset);
    }

    pub fn clear(&self) {
        self.reset(Vec::new());
    }

    /// Publishes a batch of changes that the caller already applied through
    /// [`SectionedList::edit`].
    ///
    /// A section insert or replace followed by other changes reaches listeners as a single
    /// flat `Reset`, since its sizes can only be read from the final state.
    pub fn publish_all(&self, changes: SourceChangeSet) {
        if changes.is_empty() {
            mwarn!("publish_all called with an empty change set");
            return;
        }
        self.listeners.emit(&changes);
    }

    /// Mutates the sections directly. Pair it with [`SectionedList::publish_all`] to describe
    /// what changed.
    pub fn edit<R>(&self, f: impl FnOnce(&mut Vec<Section<S, T>>) -> R) -> R {
        f(&mut self.sections.borrow_mut())
    }
}

impl<S: Clone + 'static, T: Clone + 'static> SectionedList<S, T> {
    /// A copy of every section.
    pub fn to_sections(&self) -> Vec<Section<S, T>> {
        self.sections.borrow().clone()
    }
}

impl<S: 'static, T: 'static> Default for SectionedList<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: fmt::Debug, T: fmt::Debug> fmt::Debug for SectionedList<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionedList")
            .field("sections", &self.sections.borrow())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl<S: Clone + 'static, T: Clone + 'static> SectionSource for SectionedList<S, T> {
    type Section = S;
    type Item = T;

    fn section_count(&self) -> usize {
        self.len()
    }

    fn item_count(&self, section: usize) -> usize {
        self.sections
            .borrow()
            .get(section)
            .map_or(0, |s| s.items.len())
    }

    fn section(&self, section: usize) -> Option<S> {
        self.sections.borrow().get(section).map(|s| s.value.clone())
    }

    fn item(&self, section: usize, item: usize) -> Option<T> {
        self.sections
            .borrow()
            .get(section)
            .and_then(|s| s.items.get(item).cloned())
    }

    fn subscribe(&self, listener: impl Fn(&SourceChangeSet) + 'static) -> Subscription {
        self.listeners.subscribe(listener)
    }
}
