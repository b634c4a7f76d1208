use crate::Position;

/// Errors returned by [`crate::FlattenedAdapter::get_item`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FlattenError {
    /// The caller asked for a flat index outside `0..len`.
    #[error("flat index {index} out of range (len = {len})")]
    IndexOutOfRange { index: usize, len: usize },
    /// The offset table names a position the source cannot produce. This means a change
    /// notification was missed or malformed.
    #[error("source has no value for {position:?}; offsets are out of sync")]
    SourceOutOfSync { position: Position },
}
