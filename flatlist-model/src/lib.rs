//! In-memory models for the `flatlist` crate.
//!
//! - [`SectionedList`]: an observable `Vec` of sections that implements
//!   [`flatlist::SectionSource`] and publishes a change for every mutation.
//! - [`FlatMirror`]: the renderer side, a slot list kept in sync purely from the flat change
//!   sets a [`flatlist::FlattenedAdapter`] emits.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod error;
mod list;
mod mirror;

#[cfg(test)]
mod tests;

pub use error::{MirrorError, ModelError};
pub use list::{Section, SectionedList};
pub use mirror::{FlatMirror, Slot};
