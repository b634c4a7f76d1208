use alloc::vec::Vec;

use flatlist::{FlatChange, FlatChangeSet, FlatItem, FlattenedAdapter, SectionSource};

use crate::MirrorError;

/// The value a renderer keeps for one flat slot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Slot<S, T> {
    GlobalHeader,
    SectionHeader(S),
    Item(T),
    SectionFooter(S),
    GlobalFooter,
}

impl<S, T> From<FlatItem<S, T>> for Slot<S, T> {
    fn from(item: FlatItem<S, T>) -> Self {
        match item {
            FlatItem::GlobalHeader => Self::GlobalHeader,
            FlatItem::SectionHeader { value, .. } => Self::SectionHeader(value),
            FlatItem::Item { value, .. } => Self::Item(value),
            FlatItem::SectionFooter { value, .. } => Self::SectionFooter(value),
            FlatItem::GlobalFooter => Self::GlobalFooter,
        }
    }
}

/// A renderer-side copy of a flattened list, kept in sync only through flat change sets.
///
/// This is what a recycler view does with its element pool: it never re-reads the whole source,
/// it only moves, drops and (re)binds the slots each change names. Comparing a mirror against
/// [`FlattenedAdapter::snapshot`] is the quickest way to check that a change stream is complete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatMirror<S, T> {
    slots: Vec<Slot<S, T>>,
    resets: usize,
}

impl<S: Clone, T: Clone> FlatMirror<S, T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            resets: 0,
        }
    }

    /// Builds a mirror of the adapter's current state.
    pub fn from_adapter<Src>(adapter: &FlattenedAdapter<Src>) -> Result<Self, MirrorError>
    where
        Src: SectionSource<Section = S, Item = T> + 'static,
    {
        let mut mirror = Self::new();
        mirror.resync(adapter)?;
        Ok(mirror)
    }

    pub fn slots(&self) -> &[Slot<S, T>] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of full re-reads so far, counting the initial one.
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// Re-reads every slot from the adapter.
    pub fn resync<Src>(&mut self, adapter: &FlattenedAdapter<Src>) -> Result<(), MirrorError>
    where
        Src: SectionSource<Section = S, Item = T> + 'static,
    {
        let items = adapter.snapshot()?;
        self.slots = items.into_iter().map(Slot::from).collect();
        self.resets += 1;
        Ok(())
    }

    /// Applies one flat change set that `adapter` published.
    ///
    /// Structural changes are replayed in order. Inserted, replaced and refreshed slots are read
    /// back from the adapter once the whole set is replayed, because the adapter only answers
    /// queries against its final state. On error the mirror is left untouched.
    pub fn apply<Src>(
        &mut self,
        adapter: &FlattenedAdapter<Src>,
        changes: &FlatChangeSet,
    ) -> Result<(), MirrorError>
    where
        Src: SectionSource<Section = S, Item = T> + 'static,
    {
        if changes.is_reset() {
            return self.resync(adapter);
        }

        let mut working: Vec<Option<Slot<S, T>>> =
            self.slots.iter().cloned().map(Some).collect();
        for &change in changes {
            replay(&mut working, change)?;
        }

        let expected = adapter.item_count();
        if working.len() != expected {
            mwarn!(mirror = working.len(), adapter = expected, "mirror drifted");
            return Err(MirrorError::LengthMismatch {
                mirror: working.len(),
                adapter: expected,
            });
        }

        let mut slots = Vec::with_capacity(working.len());
        let mut _rebound = 0usize;
        for (flat_index, slot) in working.into_iter().enumerate() {
            let slot = match slot {
                Some(slot) => slot,
                None => {
                    _rebound += 1;
                    Slot::from(adapter.get_item(flat_index)?)
                }
            };
            slots.push(slot);
        }
        mtrace!(
            changes = changes.len(),
            rebound = _rebound,
            len = slots.len(),
            "mirror applied"
        );
        self.slots = slots;
        Ok(())
    }
}

impl<S: Clone, T: Clone> Default for FlatMirror<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

fn replay<S, T>(
    working: &mut Vec<Option<Slot<S, T>>>,
    change: FlatChange,
) -> Result<(), MirrorError> {
    let len = working.len();
    let out_of_range = || MirrorError::ChangeOutOfRange { change, len };
    match change {
        // Handled by the caller before replaying.
        FlatChange::Reset => {}
        FlatChange::InsertItem(_) | FlatChange::InsertItemRange { .. } => {
            let range = change.range().ok_or_else(out_of_range)?;
            let (start, end) = (*range.start(), *range.end());
            if start > len || start > end {
                return Err(out_of_range());
            }
            working.splice(start..start, (start..=end).map(|_| None));
        }
        FlatChange::RemoveItem(_) | FlatChange::RemoveItemRange { .. } => {
            let range = change.range().ok_or_else(out_of_range)?;
            if *range.end() >= len || range.is_empty() {
                return Err(out_of_range());
            }
            working.drain(range);
        }
        FlatChange::ReplaceItem(_)
        | FlatChange::ReplaceItemRange { .. }
        | FlatChange::RefreshItem(_) => {
            let range = change.range().ok_or_else(out_of_range)?;
            if *range.end() >= len || range.is_empty() {
                return Err(out_of_range());
            }
            for slot in &mut working[range] {
                *slot = None;
            }
        }
        FlatChange::MoveItem { from, to } => {
            if from >= len || to >= len {
                return Err(out_of_range());
            }
            let slot = working.remove(from);
            working.insert(to, slot);
        }
    }
    Ok(())
}
