use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::ops::Range;

use crate::{
    FlatChangeSet, FlatItem, FlattenError, Flattener, LayoutInfo, Listeners, Position,
    PositionInfo, SectionSource, SourceChangeSet, Subscription,
};

struct Shared<S> {
    source: Rc<S>,
    flattener: RefCell<Flattener>,
    listeners: Listeners<FlatChangeSet>,
}

impl<S: SectionSource + 'static> Shared<S> {
    fn on_source_changed(&self, changes: &SourceChangeSet) {
        // The flattener borrow ends before listeners run: they query the adapter right away.
        let flat = self
            .flattener
            .borrow_mut()
            .apply(self.source.as_ref(), changes);
        if !flat.is_empty() {
            self.listeners.emit(&flat);
        }
    }
}

/// A [`Flattener`] subscribed to a [`SectionSource`].
///
/// This is the surface a list/grid renderer talks to: it answers flat-index queries against the
/// current state and republishes every source change as a [`FlatChangeSet`]. The offset table is
/// always up to date by the time a flat change set is delivered.
///
/// Dropping the adapter unsubscribes it from the source.
pub struct FlattenedAdapter<S: SectionSource + 'static> {
    shared: Rc<Shared<S>>,
    source_subscription: Subscription,
}

impl<S: SectionSource + 'static> FlattenedAdapter<S> {
    pub fn new(source: Rc<S>, layout: LayoutInfo) -> Self {
        let flattener = Flattener::new(source.as_ref(), layout);
        let shared = Rc::new(Shared {
            source: Rc::clone(&source),
            flattener: RefCell::new(flattener),
            listeners: Listeners::new(),
        });
        let weak: Weak<Shared<S>> = Rc::downgrade(&shared);
        let source_subscription = source.subscribe(move |changes: &SourceChangeSet| {
            if let Some(shared) = weak.upgrade() {
                shared.on_source_changed(changes);
            }
        });
        Self {
            shared,
            source_subscription,
        }
    }

    pub fn source(&self) -> &Rc<S> {
        &self.shared.source
    }

    /// Registers a listener for flat change sets.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe(&self, listener: impl Fn(&FlatChangeSet) + 'static) -> Subscription {
        self.shared.listeners.subscribe(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    /// `true` while the adapter still receives the source's change notifications.
    pub fn is_attached(&self) -> bool {
        self.source_subscription.is_active()
    }

    pub fn layout_info(&self) -> LayoutInfo {
        self.shared.flattener.borrow().layout_info()
    }

    /// Switches to a new layout. Emits a single flat `Reset` when existing slots moved.
    pub fn change_layout_info(&self, layout: LayoutInfo) {
        let change = self
            .shared
            .flattener
            .borrow_mut()
            .set_layout_info(self.shared.source.as_ref(), layout);
        if let Some(change) = change {
            self.shared.listeners.emit(&FlatChangeSet::single(change));
        }
    }

    /// Total number of flat slots.
    pub fn item_count(&self) -> usize {
        self.shared.flattener.borrow().item_count()
    }

    pub fn section_count(&self) -> usize {
        self.shared.flattener.borrow().section_count()
    }

    /// Resolves `flat_index` and fetches its value.
    ///
    /// Asking for an index outside `0..item_count()` is a caller bug and returns
    /// [`FlattenError::IndexOutOfRange`].
    pub fn get_item(
        &self,
        flat_index: usize,
    ) -> Result<FlatItem<S::Section, S::Item>, FlattenError> {
        self.shared
            .flattener
            .borrow()
            .get_item(self.shared.source.as_ref(), flat_index)
    }

    pub fn position(&self, flat_index: usize) -> Option<Position> {
        self.shared.flattener.borrow().position(flat_index)
    }

    pub fn try_get_section_and_item_index(&self, flat_index: usize) -> Option<(usize, usize)> {
        self.shared
            .flattener
            .borrow()
            .try_get_section_and_item_index(flat_index)
    }

    pub fn try_get_position_info(&self, flat_index: usize) -> Option<PositionInfo> {
        self.shared.flattener.borrow().try_get_position_info(flat_index)
    }

    pub fn flat_index_for_section_start(&self, section: usize) -> Option<usize> {
        self.shared
            .flattener
            .borrow()
            .flat_index_for_section_start(self.shared.source.as_ref(), section)
    }

    pub fn flat_index_for_item(&self, section: usize, item: usize) -> Option<usize> {
        self.shared
            .flattener
            .borrow()
            .flat_index_for_item(self.shared.source.as_ref(), section, item)
    }

    pub fn section_span(&self, section: usize) -> Option<Range<usize>> {
        self.shared.flattener.borrow().section_span(section)
    }

    /// Every position in flat order.
    pub fn positions(&self) -> Vec<Position> {
        self.shared.flattener.borrow().positions().collect()
    }

    /// Fetches every slot in flat order.
    pub fn snapshot(&self) -> Result<Vec<FlatItem<S::Section, S::Item>>, FlattenError> {
        let flattener = self.shared.flattener.borrow();
        let source = self.shared.source.as_ref();
        (0..flattener.item_count())
            .map(|flat_index| flattener.get_item(source, flat_index))
            .collect()
    }
}

impl<S: SectionSource + 'static> fmt::Debug for FlattenedAdapter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlattenedAdapter")
            .field("flattener", &self.shared.flattener.borrow())
            .field("listeners", &self.shared.listeners)
            .field("attached", &self.is_attached())
            .finish()
    }
}
