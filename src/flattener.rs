use alloc::vec::Vec;
use core::ops::Range;

use crate::offsets::OffsetTable;
use crate::{
    FlatChange, FlatChangeSet, FlatItem, FlattenError, ItemChange, ItemPath, LayoutInfo, Position,
    PositionInfo, SectionChange, SectionSource, SourceChange, SourceChangeSet,
};

/// A change that does not fit the cached state. Answered with a full reset.
#[derive(Clone, Copy, Debug)]
struct Inconsistent(&'static str);

type Translated = Result<(), Inconsistent>;

/// Maps a sectioned model onto a flat index space and translates hierarchical changes into flat
/// ones.
///
/// The flattener owns the offset table and nothing else: every method that needs live data takes
/// the source as an argument. [`crate::FlattenedAdapter`] wires it to a source's change stream.
///
/// Lookups are `O(1)` (section start) or `O(log sections)` (flat index → position). Changes patch
/// the table in `O(sections)` worst case; item-level changes only touch the sections after the
/// one being edited.
#[derive(Clone, Debug)]
pub struct Flattener {
    layout: LayoutInfo,
    global_header: usize,
    global_footer: usize,
    section_header: usize,
    section_header_footer: usize,
    offsets: OffsetTable,
}

impl Flattener {
    /// Builds the offset table for `source` under `layout`.
    pub fn new<S: SectionSource + ?Sized>(source: &S, layout: LayoutInfo) -> Self {
        let mut flattener = Self {
            layout,
            global_header: 0,
            global_footer: 0,
            section_header: 0,
            section_header_footer: 0,
            offsets: OffsetTable::new(),
        };
        flattener.cache_layout(layout);
        flattener.rebuild_offsets(source);
        fdebug!(
            sections = flattener.section_count(),
            len = flattener.item_count(),
            "Flattener::new"
        );
        flattener
    }

    fn cache_layout(&mut self, layout: LayoutInfo) {
        self.layout = layout;
        self.global_header = layout.global_header_size();
        self.global_footer = layout.global_footer_size();
        self.section_header = layout.section_header_size();
        self.section_header_footer = layout.section_header_footer_size();
    }

    /// The layout the offsets were built for.
    pub fn layout_info(&self) -> LayoutInfo {
        self.layout
    }

    /// Total number of flat slots.
    pub fn item_count(&self) -> usize {
        self.global_header + self.offsets.span() + self.global_footer
    }

    /// Number of sections reflected in the offset table.
    pub fn section_count(&self) -> usize {
        self.offsets.len()
    }

    /// Recomputes every section offset from the live source.
    pub fn rebuild_offsets<S: SectionSource + ?Sized>(&mut self, source: &S) {
        let extra = self.section_header_footer;
        let count = source.section_count();
        self.offsets
            .rebuild((0..count).map(|section| source.item_count(section) + extra));
        ftrace!(sections = count, span = self.offsets.span(), "rebuild_offsets");
    }

    /// Switches to a new layout.
    ///
    /// Returns a flat `Reset` when any existing slot moved, which is always the case when the
    /// flattened length changed.
    pub fn set_layout_info<S: SectionSource + ?Sized>(
        &mut self,
        source: &S,
        layout: LayoutInfo,
    ) -> Option<FlatChange> {
        if self.layout == layout {
            return None;
        }
        let old_len = self.item_count();
        let shifts = self.layout.shifts_positions(&layout, self.offsets.len());
        self.cache_layout(layout);
        self.rebuild_offsets(source);
        let new_len = self.item_count();
        fdebug!(old_len, new_len, ?layout, "set_layout_info");
        (old_len != new_len || (new_len > 0 && shifts)).then_some(FlatChange::Reset)
    }

    /// Resolves a flat index. `None` when out of range.
    pub fn position(&self, flat_index: usize) -> Option<Position> {
        if flat_index >= self.item_count() {
            return None;
        }
        let mut index = flat_index;
        if self.layout.has_global_header {
            if index == 0 {
                return Some(Position::GlobalHeader);
            }
            index -= 1;
        }
        let Some(section) = self.offsets.find_section(index) else {
            return Some(Position::GlobalFooter);
        };
        let mut relative = index - self.offsets.start(section);
        if self.layout.has_section_header {
            if relative == 0 {
                return Some(Position::SectionHeader { section });
            }
            relative -= 1;
        }
        if relative < self.cached_item_count(section) {
            Some(Position::Item {
                section,
                item: relative,
            })
        } else {
            Some(Position::SectionFooter { section })
        }
    }

    /// `Some((section, item))` when `flat_index` is an item; `None` for pseudo items and
    /// out-of-range indices.
    pub fn try_get_section_and_item_index(&self, flat_index: usize) -> Option<(usize, usize)> {
        match self.position(flat_index)? {
            Position::Item { section, item } => Some((section, item)),
            _ => None,
        }
    }

    /// Kind and section of a flat index, with sentinel sections for the global pseudo items.
    pub fn try_get_position_info(&self, flat_index: usize) -> Option<PositionInfo> {
        self.position(flat_index).map(PositionInfo::from)
    }

    /// Resolves a flat index and fetches its value from `source`.
    pub fn get_item<S: SectionSource + ?Sized>(
        &self,
        source: &S,
        flat_index: usize,
    ) -> Result<FlatItem<S::Section, S::Item>, FlattenError> {
        let position = self
            .position(flat_index)
            .ok_or(FlattenError::IndexOutOfRange {
                index: flat_index,
                len: self.item_count(),
            })?;
        let out_of_sync = FlattenError::SourceOutOfSync { position };
        let item = match position {
            Position::GlobalHeader => FlatItem::GlobalHeader,
            Position::GlobalFooter => FlatItem::GlobalFooter,
            Position::SectionHeader { section } => FlatItem::SectionHeader {
                section,
                value: source.section(section).ok_or(out_of_sync)?,
            },
            Position::SectionFooter { section } => FlatItem::SectionFooter {
                section,
                value: source.section(section).ok_or(out_of_sync)?,
            },
            Position::Item { section, item } => FlatItem::Item {
                section,
                item,
                value: source.item(section, item).ok_or(out_of_sync)?,
            },
        };
        Ok(item)
    }

    /// Flat index of a section's first slot (its header, if enabled) from the offset table alone.
    pub fn section_start(&self, section: usize) -> Option<usize> {
        (section < self.offsets.len()).then(|| self.global_header + self.offsets.start(section))
    }

    /// Flat slots occupied by a section, its header and footer included.
    pub fn section_span(&self, section: usize) -> Option<Range<usize>> {
        if section >= self.offsets.len() {
            return None;
        }
        let span = self.offsets.span_of(section, section);
        Some(self.global_header + span.start..self.global_header + span.end)
    }

    /// Flat index of a section's first slot.
    ///
    /// Sections the offset table does not reflect yet (for example while an insert is being
    /// delivered) are located by walking the live source. `None` when `section` does not exist in
    /// the source.
    pub fn flat_index_for_section_start<S: SectionSource + ?Sized>(
        &self,
        source: &S,
        section: usize,
    ) -> Option<usize> {
        if section >= source.section_count() {
            return None;
        }
        if let Some(start) = self.section_start(section) {
            return Some(start);
        }
        let mut offset = self.offsets.span();
        for s in self.offsets.len()..section {
            offset += source.item_count(s) + self.section_header_footer;
        }
        Some(self.global_header + offset)
    }

    /// Flat index of an item. `None` for an invalid section or item.
    pub fn flat_index_for_item<S: SectionSource + ?Sized>(
        &self,
        source: &S,
        section: usize,
        item: usize,
    ) -> Option<usize> {
        let start = self.flat_index_for_section_start(source, section)?;
        let count = if section < self.offsets.len() {
            self.cached_item_count(section)
        } else {
            source.item_count(section)
        };
        (item < count).then(|| start + self.section_header + item)
    }

    /// Every position in flat order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let header = self
            .layout
            .has_global_header
            .then_some(Position::GlobalHeader);
        let footer = self
            .layout
            .has_global_footer
            .then_some(Position::GlobalFooter);
        let sections = (0..self.offsets.len()).flat_map(move |section| {
            let items = self.cached_item_count(section);
            let section_header = self
                .layout
                .has_section_header
                .then_some(Position::SectionHeader { section });
            let section_footer = self
                .layout
                .has_section_footer
                .then_some(Position::SectionFooter { section });
            section_header
                .into_iter()
                .chain((0..items).map(move |item| Position::Item { section, item }))
                .chain(section_footer)
        });
        header.into_iter().chain(sections).chain(footer)
    }

    fn cached_item_count(&self, section: usize) -> usize {
        self.offsets.size(section) - self.section_header_footer
    }

    fn cached_item_flat_index(&self, path: ItemPath) -> usize {
        self.global_header + self.offsets.start(path.section) + self.section_header + path.item
    }

    /// Translates a hierarchical change set (already applied to `source`) into flat changes,
    /// patching the offset table along the way.
    ///
    /// A set containing `Reset` collapses to a single flat `Reset`. So does a set where a section
    /// insert or replace is followed by further changes, since its new sizes can only be read from
    /// the source's final state. A change that contradicts the cached state (for example a source
    /// that skipped a notification) also ends in a rebuild and a single `Reset`; a partial
    /// translation is never returned.
    pub fn apply<S: SectionSource + ?Sized>(
        &mut self,
        source: &S,
        changes: &SourceChangeSet,
    ) -> FlatChangeSet {
        let mut out = FlatChangeSet::new();
        if changes.is_reset() {
            self.reset(source, &mut out);
            return out;
        }
        // Section inserts and replaces size themselves from the live source, which already holds
        // every later change in the set. Only the last change may read it.
        let last = changes.len().saturating_sub(1);
        if changes.iter().take(last).any(reads_live_sizes) {
            fdebug!(changes = changes.len(), "live sizes read mid-set; resetting");
            self.reset(source, &mut out);
            return out;
        }
        for change in changes {
            ftrace!(?change, "translate");
            let translated = match *change {
                SourceChange::Reset => {
                    self.reset(source, &mut out);
                    Ok(())
                }
                SourceChange::Section(change) => self.translate_section(source, change, &mut out),
                SourceChange::Item(change) => self.translate_item(change, &mut out),
            };
            if let Err(Inconsistent(_reason)) = translated {
                fwarn!(?change, reason = _reason, "inconsistent change; resetting");
                self.reset(source, &mut out);
                return out;
            }
        }
        out
    }

    fn reset<S: SectionSource + ?Sized>(&mut self, source: &S, out: &mut FlatChangeSet) {
        self.rebuild_offsets(source);
        out.clear();
        out.push(FlatChange::Reset);
    }

    fn translate_section<S: SectionSource + ?Sized>(
        &mut self,
        source: &S,
        change: SectionChange,
        out: &mut FlatChangeSet,
    ) -> Translated {
        let gh = self.global_header;
        match change {
            SectionChange::Insert { start, end } => {
                if start > end || start > self.offsets.len() || end >= source.section_count() {
                    return Err(Inconsistent("section insert out of range"));
                }
                let sizes = self.live_section_sizes(source, start, end);
                self.offsets.insert(start, &sizes);
                let span = self.offsets.span_of(start, end);
                push_range(out, gh, span, FlatChange::insert);
            }
            SectionChange::Remove { start, end } => {
                if start > end || end >= self.offsets.len() {
                    return Err(Inconsistent("section remove out of range"));
                }
                let span = self.offsets.span_of(start, end);
                self.offsets.remove(start, end);
                push_range(out, gh, span, FlatChange::remove);
            }
            SectionChange::Replace { start, end } => {
                if start > end || end >= self.offsets.len() || end >= source.section_count() {
                    return Err(Inconsistent("section replace out of range"));
                }
                let sizes = self.live_section_sizes(source, start, end);
                let old = self.offsets.span_of(start, end);
                if sizes.iter().copied().eq((start..=end).map(|s| self.offsets.size(s))) {
                    push_range(out, gh, old, FlatChange::replace);
                } else {
                    self.offsets.remove(start, end);
                    self.offsets.insert(start, &sizes);
                    push_range(out, gh, old, FlatChange::remove);
                    let new = self.offsets.span_of(start, end);
                    push_range(out, gh, new, FlatChange::insert);
                }
            }
            SectionChange::Move { from, to } => {
                let len = self.offsets.len();
                if from >= len || to >= len {
                    return Err(Inconsistent("section move out of range"));
                }
                if from == to {
                    return Ok(());
                }
                let size = self.offsets.size(from);
                let removed = self.offsets.span_of(from, from);
                let dest = section_move_destination(&self.offsets, from, to);
                self.offsets.remove(from, from);
                self.offsets.insert(to, &[size]);
                debug_assert_eq!(self.offsets.start(to), dest, "section move destination");
                push_range(out, gh, removed, FlatChange::remove);
                push_range(out, gh, dest..dest + size, FlatChange::insert);
            }
            SectionChange::Refresh { section } => {
                if section >= self.offsets.len() {
                    return Err(Inconsistent("section refresh out of range"));
                }
                let span = self.offsets.span_of(section, section);
                match span.len() {
                    0 => {}
                    1 => out.push(FlatChange::RefreshItem(gh + span.start)),
                    _ => push_range(out, gh, span, FlatChange::replace),
                }
            }
        }
        Ok(())
    }

    fn translate_item(&mut self, change: ItemChange, out: &mut FlatChangeSet) -> Translated {
        match change {
            ItemChange::Insert {
                section,
                start,
                end,
            } => {
                if start > end
                    || section >= self.offsets.len()
                    || start > self.cached_item_count(section)
                {
                    return Err(Inconsistent("item insert out of range"));
                }
                let count = end - start + 1;
                let flat = self.cached_item_flat_index(ItemPath::new(section, start));
                self.offsets.grow(section, count);
                out.push(FlatChange::insert(flat, flat + count - 1));
            }
            ItemChange::Remove {
                section,
                start,
                end,
            } => {
                if start > end
                    || section >= self.offsets.len()
                    || end >= self.cached_item_count(section)
                {
                    return Err(Inconsistent("item remove out of range"));
                }
                let count = end - start + 1;
                let flat = self.cached_item_flat_index(ItemPath::new(section, start));
                self.offsets.shrink(section, count);
                out.push(FlatChange::remove(flat, flat + count - 1));
            }
            ItemChange::Replace {
                section,
                start,
                end,
            } => {
                if start > end
                    || section >= self.offsets.len()
                    || end >= self.cached_item_count(section)
                {
                    return Err(Inconsistent("item replace out of range"));
                }
                let flat = self.cached_item_flat_index(ItemPath::new(section, start));
                out.push(FlatChange::replace(flat, flat + (end - start)));
            }
            ItemChange::Refresh { section, item } => {
                if section >= self.offsets.len() || item >= self.cached_item_count(section) {
                    return Err(Inconsistent("item refresh out of range"));
                }
                let flat = self.cached_item_flat_index(ItemPath::new(section, item));
                out.push(FlatChange::RefreshItem(flat));
            }
            ItemChange::Move { from, to } => {
                let len = self.offsets.len();
                if from.section >= len
                    || to.section >= len
                    || from.item >= self.cached_item_count(from.section)
                {
                    return Err(Inconsistent("item move out of range"));
                }
                let from_flat = self.cached_item_flat_index(from);
                if from.section != to.section {
                    self.offsets.shrink(from.section, 1);
                    self.offsets.grow(to.section, 1);
                }
                if to.item >= self.cached_item_count(to.section) {
                    return Err(Inconsistent("item move destination out of range"));
                }
                let to_flat = self.cached_item_flat_index(to);
                if from_flat != to_flat {
                    out.push(FlatChange::MoveItem {
                        from: from_flat,
                        to: to_flat,
                    });
                }
            }
        }
        Ok(())
    }

    fn live_section_sizes<S: SectionSource + ?Sized>(
        &self,
        source: &S,
        start: usize,
        end: usize,
    ) -> Vec<usize> {
        (start..=end)
            .map(|section| source.item_count(section) + self.section_header_footer)
            .collect()
    }
}

fn reads_live_sizes(change: &SourceChange) -> bool {
    matches!(
        change,
        SourceChange::Section(SectionChange::Insert { .. } | SectionChange::Replace { .. })
    )
}

/// Pushes `make(start, end)` for a non-empty relative span, shifted by the global header.
fn push_range(
    out: &mut FlatChangeSet,
    global_header: usize,
    span: Range<usize>,
    make: fn(usize, usize) -> FlatChange,
) {
    if span.is_empty() {
        return;
    }
    out.push(make(global_header + span.start, global_header + span.end - 1));
}

/// Relative start of section `from` after it is moved to index `to`, computed from the offsets
/// as they were before the move.
///
/// Moving forward, the sections between `from` and `to` slide back by the moved section's size,
/// so it lands at the end of `to`'s old span minus its own size. Moving backward, it lands at
/// `to`'s old start.
pub(crate) fn section_move_destination(offsets: &OffsetTable, from: usize, to: usize) -> usize {
    if from < to {
        offsets.end(to) - offsets.size(from)
    } else {
        offsets.start(to)
    }
}
