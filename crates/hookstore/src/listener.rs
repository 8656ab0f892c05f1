use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use hookstore_core::ByPtr;
use slotmap::new_key_type;

use crate::config::SliceRefresh;

new_key_type! {
    /// Identity of one listener registration in a store.
    pub struct ListenerKey;
}

/// Maps the full state to the slice one subscriber cares about.
///
/// Cloning shares the function; hooks treat two selectors as "the same"
/// only when they are clones of one another.
pub struct Selector<S, T>(Rc<dyn Fn(&S) -> T>);

impl<S, T> Selector<S, T> {
    pub fn new(f: impl Fn(&S) -> T + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn select(&self, state: &S) -> T {
        (self.0)(state)
    }

    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn handle(&self) -> ByPtr<dyn Fn(&S) -> T> {
        ByPtr(self.0.clone())
    }
}

impl<S: Clone + 'static> Selector<S, S> {
    /// Selects the whole state.
    pub fn whole() -> Self {
        Self::new(S::clone)
    }
}

impl<S, T> Clone for Selector<S, T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S, T> fmt::Debug for Selector<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector({:p})", Rc::as_ptr(&self.0))
    }
}

/// Decides whether two slices are equal enough to skip a re-render.
/// Arguments are `(previous, next)`.
pub struct EqualityCheck<T>(Rc<dyn Fn(&T, &T) -> bool>);

impl<T> EqualityCheck<T> {
    pub fn new(f: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn check(&self, prev: &T, next: &T) -> bool {
        (self.0)(prev, next)
    }

    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn handle(&self) -> ByPtr<dyn Fn(&T, &T) -> bool> {
        ByPtr(self.0.clone())
    }
}

impl<T: PartialEq> EqualityCheck<T> {
    pub fn partial_eq() -> Self {
        Self::new(|prev: &T, next: &T| prev == next)
    }
}

impl<T> Clone for EqualityCheck<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> fmt::Debug for EqualityCheck<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EqualityCheck({:p})", Rc::as_ptr(&self.0))
    }
}

pub(crate) struct Listener<S, T> {
    pub selector: Selector<S, T>,
    pub equality: EqualityCheck<T>,
    pub prev_slice: T,
    trigger: Rc<dyn Fn()>,
    refresh: SliceRefresh,
}

impl<S, T> Listener<S, T> {
    pub fn new(
        selector: Selector<S, T>,
        equality: EqualityCheck<T>,
        prev_slice: T,
        trigger: Rc<dyn Fn()>,
        refresh: SliceRefresh,
    ) -> Self {
        Self {
            selector,
            equality,
            prev_slice,
            trigger,
            refresh,
        }
    }
}

/// Type-erased view of a listener, as held by the store's registry.
pub(crate) trait Notify<S> {
    /// Compares the baseline slice with `state`'s; returns the trigger to
    /// fire when they differ.
    fn check(&self, state: &S) -> Option<Rc<dyn Fn()>>;
}

impl<S, T> Notify<S> for RefCell<Listener<S, T>> {
    fn check(&self, state: &S) -> Option<Rc<dyn Fn()>> {
        let mut listener = self.borrow_mut();
        let next = listener.selector.select(state);
        if listener.equality.check(&listener.prev_slice, &next) {
            return None;
        }
        if listener.refresh == SliceRefresh::OnNotify {
            listener.prev_slice = next;
        }
        Some(listener.trigger.clone())
    }
}
