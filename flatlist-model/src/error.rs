use flatlist::{FlatChange, FlattenError};

/// Errors returned by [`crate::SectionedList`] mutators. A failed mutation changes nothing and
/// publishes nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("section {section} out of range (sections = {count})")]
    SectionOutOfRange { section: usize, count: usize },
    #[error("item {item} of section {section} out of range (items = {count})")]
    ItemOutOfRange {
        section: usize,
        item: usize,
        count: usize,
    },
    #[error("invalid range {start}..{end}")]
    InvalidRange { start: usize, end: usize },
}

/// Errors returned by [`crate::FlatMirror::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MirrorError {
    #[error(transparent)]
    Flatten(#[from] FlattenError),
    #[error("{change:?} does not fit a mirror of {len} slots")]
    ChangeOutOfRange { change: FlatChange, len: usize },
    #[error("mirror has {mirror} slots but the adapter has {adapter}")]
    LengthMismatch { mirror: usize, adapter: usize },
}
