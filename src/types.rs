use core::cmp::Ordering;

/// Section index reported for the global header by integer-only callers.
pub const GLOBAL_HEADER_SECTION: isize = isize::MIN;
/// Section index reported for the global footer by integer-only callers.
pub const GLOBAL_FOOTER_SECTION: isize = isize::MAX;
/// Item index reported for headers (section or global).
pub const HEADER_ITEM: isize = isize::MIN;
/// Item index reported for footers (section or global).
pub const FOOTER_ITEM: isize = isize::MAX;

/// What occupies a given flat index.
///
/// Positions order the same way their flat indices do: the global header first, then each
/// section's header, items and footer, then the global footer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Position {
    GlobalHeader,
    SectionHeader { section: usize },
    Item { section: usize, item: usize },
    SectionFooter { section: usize },
    GlobalFooter,
}

impl Position {
    pub fn kind(&self) -> PositionKind {
        match self {
            Self::GlobalHeader => PositionKind::GlobalHeader,
            Self::SectionHeader { .. } => PositionKind::SectionHeader,
            Self::Item { .. } => PositionKind::Item,
            Self::SectionFooter { .. } => PositionKind::SectionFooter,
            Self::GlobalFooter => PositionKind::GlobalFooter,
        }
    }

    /// The owning section, if this position belongs to one.
    pub fn section(&self) -> Option<usize> {
        match *self {
            Self::SectionHeader { section }
            | Self::Item { section, .. }
            | Self::SectionFooter { section } => Some(section),
            Self::GlobalHeader | Self::GlobalFooter => None,
        }
    }

    pub fn item(&self) -> Option<usize> {
        match *self {
            Self::Item { item, .. } => Some(item),
            _ => None,
        }
    }

    pub fn is_item(&self) -> bool {
        matches!(self, Self::Item { .. })
    }

    /// Section index with the global pseudo items mapped to
    /// [`GLOBAL_HEADER_SECTION`] / [`GLOBAL_FOOTER_SECTION`].
    pub fn section_ordinal(&self) -> isize {
        match *self {
            Self::GlobalHeader => GLOBAL_HEADER_SECTION,
            Self::GlobalFooter => GLOBAL_FOOTER_SECTION,
            Self::SectionHeader { section }
            | Self::Item { section, .. }
            | Self::SectionFooter { section } => section as isize,
        }
    }

    /// Item index with headers mapped to [`HEADER_ITEM`] and footers to [`FOOTER_ITEM`].
    pub fn item_ordinal(&self) -> isize {
        match *self {
            Self::GlobalHeader | Self::SectionHeader { .. } => HEADER_ITEM,
            Self::GlobalFooter | Self::SectionFooter { .. } => FOOTER_ITEM,
            Self::Item { item, .. } => item as isize,
        }
    }

    fn sort_key(&self) -> (u8, usize, u8, usize) {
        match *self {
            Self::GlobalHeader => (0, 0, 0, 0),
            Self::SectionHeader { section } => (1, section, 0, 0),
            Self::Item { section, item } => (1, section, 1, item),
            Self::SectionFooter { section } => (1, section, 2, 0),
            Self::GlobalFooter => (2, 0, 0, 0),
        }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The tag of a [`Position`] without its indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PositionKind {
    GlobalHeader,
    SectionHeader,
    Item,
    SectionFooter,
    GlobalFooter,
}

/// A position tag plus its section index, for callers that only deal in integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionInfo {
    pub kind: PositionKind,
    /// [`GLOBAL_HEADER_SECTION`] / [`GLOBAL_FOOTER_SECTION`] for the global pseudo items.
    pub section: isize,
}

impl From<Position> for PositionInfo {
    fn from(position: Position) -> Self {
        Self {
            kind: position.kind(),
            section: position.section_ordinal(),
        }
    }
}

/// A `(section, item)` coordinate in the hierarchical model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemPath {
    pub section: usize,
    pub item: usize,
}

impl ItemPath {
    pub const fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }
}

/// The value behind a flat index, as returned by [`crate::FlattenedAdapter::get_item`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlatItem<S, I> {
    GlobalHeader,
    SectionHeader { section: usize, value: S },
    Item { section: usize, item: usize, value: I },
    SectionFooter { section: usize, value: S },
    GlobalFooter,
}

impl<S, I> FlatItem<S, I> {
    pub fn position(&self) -> Position {
        match *self {
            Self::GlobalHeader => Position::GlobalHeader,
            Self::SectionHeader { section, .. } => Position::SectionHeader { section },
            Self::Item { section, item, .. } => Position::Item { section, item },
            Self::SectionFooter { section, .. } => Position::SectionFooter { section },
            Self::GlobalFooter => Position::GlobalFooter,
        }
    }

    pub fn item_value(&self) -> Option<&I> {
        match self {
            Self::Item { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn section_value(&self) -> Option<&S> {
        match self {
            Self::SectionHeader { value, .. } | Self::SectionFooter { value, .. } => Some(value),
            _ => None,
        }
    }
}
