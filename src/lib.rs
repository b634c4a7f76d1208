//! Flattens sectioned data into a single index space for list/grid renderers.
//!
//! A sectioned model (sections holding items, optionally with a header and footer per section
//! and a global header and footer) is mapped onto flat indices `0..len`. The mapping is kept in
//! an incrementally patched offset table, and every hierarchical change published by the model is
//! translated into the equivalent flat change(s).
//!
//! It is UI-agnostic. A renderer is expected to:
//! - provide a [`SectionSource`] (see the `flatlist-model` crate for an in-memory one)
//! - choose a [`LayoutInfo`]
//! - subscribe to a [`FlattenedAdapter`] and apply each [`FlatChangeSet`] to its element pool
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod adapter;
mod change;
mod error;
mod flattener;
mod layout;
mod listeners;
mod offsets;
mod source;
mod types;


pub use adapter::FlattenedAdapter;
pub use change::{
    ChangeBounds, ChangeSet, FlatChange, FlatChangeSet, ItemChange, SectionChange, SourceChange,
    SourceChangeSet,
};
pub use error::FlattenError;
pub use flattener::Flattener;
pub use layout::LayoutInfo;
pub use listeners::{Listener, ListenerKey, Listeners, Subscription};
pub use source::SectionSource;
pub use types::{
    FOOTER_ITEM, FlatItem, GLOBAL_FOOTER_SECTION, GLOBAL_HEADER_SECTION, HEADER_ITEM, ItemPath,
    Position, PositionInfo, PositionKind,
};
