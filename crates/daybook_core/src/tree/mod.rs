//! Journal browser tree.
//!
//! # Responsibility
//! - Turn flat journal paths into a folder hierarchy ([`builder`]).
//! - Render that hierarchy into interactive elements and route selection to
//!   the journal editor ([`view`]).
//!
//! # Invariants
//! - The tree is rebuilt from scratch on every journal change; only
//!   [`view::TreeViewState`] carries over between rebuilds.

pub mod builder;
pub mod view;
