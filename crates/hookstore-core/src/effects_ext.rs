use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::runtime::{is_rendering, remember, schedule_commit};

/// Compares an `Rc` by address, for dependency lists keyed on identity
/// rather than value.
pub struct ByPtr<T: ?Sized>(pub Rc<T>);

impl<T: ?Sized> Clone for ByPtr<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: ?Sized> PartialEq for ByPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> fmt::Debug for ByPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByPtr({:p})", Rc::as_ptr(&self.0))
    }
}

/// Runs after every render where `deps` changed, skipping the first render
/// of this call site.
///
/// Outside a render unit there is no "later render", so this never fires.
pub fn update_effect<K: PartialEq + 'static>(deps: K, effect: impl FnOnce() + 'static) {
    if !is_rendering() {
        return;
    }
    let last = remember(|| RefCell::new(None::<K>));

    let mut last = last.borrow_mut();
    let Some(prev) = last.as_ref() else {
        // first render: record the baseline only
        *last = Some(deps);
        return;
    };
    if *prev != deps {
        *last = Some(deps);
        schedule_commit(effect);
    }
}

/// Runs after every render except the first of this call site.
pub fn update_effect_always(effect: impl FnOnce() + 'static) {
    if !is_rendering() {
        return;
    }
    let mounted = remember(|| Cell::new(false));
    if mounted.replace(true) {
        schedule_commit(effect);
    }
}
