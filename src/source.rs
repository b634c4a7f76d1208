use crate::{SourceChangeSet, Subscription};

/// A two-level hierarchical data model: sections, each holding items.
///
/// Implementations must apply a mutation before publishing the matching change set, and must
/// not hold any internal borrow while listeners run: listeners query the source right away.
pub trait SectionSource {
    type Section;
    type Item;

    fn section_count(&self) -> usize;

    fn item_count(&self, section: usize) -> usize;

    fn section(&self, section: usize) -> Option<Self::Section>;

    fn item(&self, section: usize, item: usize) -> Option<Self::Item>;

    /// Registers a listener for hierarchical changes.
    fn subscribe(&self, listener: impl Fn(&SourceChangeSet) + 'static) -> Subscription;
}
