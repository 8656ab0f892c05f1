//! # Stores and selector hooks
//!
//! A `Store<S>` is a shared state cell plus a registry of listeners. Render
//! units (see `hookstore-core`) subscribe through hooks that return a
//! *slice* of the state and re-render the unit only when that slice changes.
//!
//! ```rust
//! use hookstore::*;
//! use hookstore_core::Runtime;
//!
//! #[derive(Clone, PartialEq)]
//! struct Counters {
//!     a: i32,
//!     b: i32,
//! }
//!
//! let store = create_store(Counters { a: 1, b: 2 });
//! let rt = Runtime::new();
//!
//! let a_view = rt.mount("a", {
//!     let store = store.clone();
//!     move || {
//!         let a = store.use_selector(|s: &Counters| s.a);
//!         log::info!("a = {a}");
//!     }
//! });
//!
//! store.update(|s| Counters { b: 3, ..s.clone() });
//! rt.flush().unwrap();
//! assert_eq!(rt.render_count(a_view), Some(1)); // `a` did not change
//! ```
//!
//! ## Hooks
//!
//! - `use_store()` — the whole state, compared with `PartialEq`.
//! - `use_selector(|s| ..)` — a slice, compared with `PartialEq`.
//! - `use_selector_with(&selector, &equality)` — explicit handles; a handle
//!   swap is detected by identity and takes effect after that render.
//! - `use_store_state()` — `(state, setter)`.
//!
//! On mount a hook registers a listener whose baseline is the slice returned
//! by that render, and unregisters it on unmount. Every later render refreshes
//! the baseline. `set` compares each listener's baseline with its selection of
//! the new state and fires the owning unit's trigger when they differ.
//!
//! ## Configuration
//!
//! `StoreConfig` names the store (for logs and dispatch reports), chooses when
//! baselines advance (`SliceRefresh`), and toggles the catch-up comparison run
//! right after registration.

pub mod config;
pub mod error;
pub mod hooks;
pub mod listener;
pub mod store;

#[cfg(test)]
mod tests;

pub use config::{SliceRefresh, StoreConfig};
pub use error::StoreError;
pub use listener::{EqualityCheck, ListenerKey, Selector};
pub use store::{
    DispatchReport, Setter, Store, Subscription, Update, create_store, create_store_with,
};
