//! # Render units, slots, and effects
//!
//! `hookstore-core` is the small host runtime that stores hook into. It plays
//! the role a UI framework plays for hooks: it owns *render units*, keeps
//! their per-call-site storage alive between renders, runs their effects after
//! each render, and re-renders them on request.
//!
//! - `Runtime` — mounts/unmounts units and flushes the re-render queue.
//! - `remember*` — lifecycle-aware storage bound to a unit.
//! - `mount_effect` / `update_effect` — side-effects with cleanup.
//! - `use_force_update` — a `Trigger` that schedules a re-render.
//!
//! ## Units
//!
//! ```rust
//! use hookstore_core::*;
//!
//! let rt = Runtime::new();
//! let unit = rt.mount("counter", || {
//!     let clicks = remember_state(|| 0);
//!     *clicks.borrow_mut() += 1;
//! });
//! assert_eq!(rt.render_count(unit), Some(1));
//!
//! rt.request_render(unit);
//! assert_eq!(rt.flush().unwrap(), 1);
//! rt.unmount(unit).unwrap();
//! ```
//!
//! - `remember` is order-based: the Nth call in a unit always refers to the
//!   Nth stored value.
//! - `remember_with_key` is key-based and stable across conditional branches.
//!
//! ## Effects and cleanup
//!
//! Effects are queued while a unit renders and run in declaration order once
//! the render function returns (the *commit*):
//!
//! ```rust
//! use hookstore_core::*;
//!
//! let rt = Runtime::new();
//! let unit = rt.mount("logger", || {
//!     mount_effect(|| {
//!         log::info!("mounted");
//!         on_unmount(|| log::info!("unmounted"))
//!     });
//!     update_effect_always(|| log::info!("re-rendered"));
//! });
//! rt.unmount(unit).unwrap();
//! ```
//!
//! - `mount_effect` runs once per mount; its `Dispose` runs once on unmount.
//! - `update_effect(deps, ..)` skips the first render and runs whenever
//!   `deps` changed. Wrap `Rc`s in `ByPtr` to compare by identity.
//! - `update_effect_always` runs after every render but the first.

pub mod effects;
pub mod effects_ext;
pub mod error;
pub mod runtime;
pub mod scope;


pub use effects::*;
pub use effects_ext::*;
pub use error::CoreError;
pub use runtime::*;
pub use scope::*;
