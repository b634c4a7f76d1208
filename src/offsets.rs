use alloc::vec::Vec;
use core::cmp;
use core::ops::Range;

/// Per-section start offsets, relative to the slot right after the global header.
///
/// `starts[i]` is the number of flat slots taken by sections `0..i` (their headers and
/// footers included). `span` is the number of slots taken by all sections, so the last
/// section's size is `span - starts[last]`.
#[derive(Clone, Debug, Default)]
pub(crate) struct OffsetTable {
    starts: Vec<usize>,
    span: usize,
}

impl OffsetTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of sections reflected by the table.
    pub(crate) fn len(&self) -> usize {
        self.starts.len()
    }

    pub(crate) fn span(&self) -> usize {
        self.span
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.starts.capacity()
    }

    /// Replaces the whole table with sections of the given sizes.
    pub(crate) fn rebuild(&mut self, sizes: impl ExactSizeIterator<Item = usize>) {
        let count = sizes.len();
        self.reserve_for(count);
        self.starts.clear();
        let mut running = 0usize;
        for size in sizes {
            self.starts.push(running);
            running += size;
        }
        self.span = running;
    }

    fn reserve_for(&mut self, count: usize) {
        let cap = self.starts.capacity();
        if cap >= count {
            return;
        }
        let target = cmp::max(count, cmp::max(cap.saturating_mul(2), 4));
        self.starts.reserve_exact(target - self.starts.len());
    }

    pub(crate) fn start(&self, section: usize) -> usize {
        self.starts[section]
    }

    pub(crate) fn end(&self, section: usize) -> usize {
        if section + 1 < self.starts.len() {
            self.starts[section + 1]
        } else {
            self.span
        }
    }

    pub(crate) fn size(&self, section: usize) -> usize {
        self.end(section) - self.start(section)
    }

    /// Relative slots covered by sections `first..=last`.
    pub(crate) fn span_of(&self, first: usize, last: usize) -> Range<usize> {
        self.start(first)..self.end(last)
    }

    /// Inserts sections of the given sizes before `at`, shifting every following section.
    pub(crate) fn insert(&mut self, at: usize, sizes: &[usize]) {
        debug_assert!(at <= self.starts.len(), "OffsetTable::insert out of bounds");
        let base = if at < self.starts.len() {
            self.starts[at]
        } else {
            self.span
        };
        let added: usize = sizes.iter().sum();
        self.reserve_for(self.starts.len() + sizes.len());

        for start in &mut self.starts[at..] {
            *start += added;
        }
        let mut running = base;
        let new_starts = sizes.iter().map(|&size| {
            let start = running;
            running += size;
            start
        });
        self.starts.splice(at..at, new_starts);
        self.span += added;
    }

    /// Removes sections `first..=last`, shifting every following section back.
    ///
    /// Returns the number of slots the removed sections occupied.
    pub(crate) fn remove(&mut self, first: usize, last: usize) -> usize {
        debug_assert!(
            first <= last && last < self.starts.len(),
            "OffsetTable::remove out of bounds"
        );
        let removed = self.span_of(first, last).len();
        self.starts.drain(first..=last);
        for start in &mut self.starts[first..] {
            *start -= removed;
        }
        self.span -= removed;
        removed
    }

    /// Grows `section` by `count` slots.
    pub(crate) fn grow(&mut self, section: usize, count: usize) {
        for start in &mut self.starts[section + 1..] {
            *start += count;
        }
        self.span += count;
    }

    /// Shrinks `section` by `count` slots.
    pub(crate) fn shrink(&mut self, section: usize, count: usize) {
        debug_assert!(self.size(section) >= count, "OffsetTable::shrink underflow");
        for start in &mut self.starts[section + 1..] {
            *start -= count;
        }
        self.span -= count;
    }

    /// Finds the section whose `[start, end)` contains `index` (already adjusted for the
    /// global header). `None` means the index is past every section.
    pub(crate) fn find_section(&self, index: usize) -> Option<usize> {
        if index >= self.span || self.starts.is_empty() {
            return None;
        }
        let mut left = 0usize;
        let mut right = self.starts.len() - 1;
        while left <= right {
            let mid = left + (right - left) / 2;
            let start = self.starts[mid];
            let end = self.end(mid);
            if index < start {
                if mid == 0 {
                    break;
                }
                right = mid - 1;
            } else if index >= end {
                left = mid + 1;
            } else {
                return Some(mid);
            }
        }
        None
    }

    #[cfg(test)]
    pub(crate) fn iter_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.starts.len()).map(|section| self.size(section))
    }
}
