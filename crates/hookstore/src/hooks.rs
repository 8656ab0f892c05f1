use std::cell::RefCell;
use std::rc::Rc;

use hookstore_core::{
    is_rendering, mount_effect, on_unmount, remember, update_effect, update_effect_always,
    use_force_update,
};

use crate::error::StoreError;
use crate::listener::{EqualityCheck, Listener, ListenerKey, Selector};
use crate::store::{Setter, Store};

/// Per-call-site hook state: the registration made at mount.
struct HookSlot<S, T> {
    listener: RefCell<Option<(ListenerKey, Rc<RefCell<Listener<S, T>>>)>>,
}

impl<S, T> Default for HookSlot<S, T> {
    fn default() -> Self {
        Self {
            listener: RefCell::new(None),
        }
    }
}

impl<S, T> HookSlot<S, T> {
    fn with_listener(&self, f: impl FnOnce(&mut Listener<S, T>)) {
        match &*self.listener.borrow() {
            Some((_, listener)) => f(&mut listener.borrow_mut()),
            None => log::warn!("store hook: update for an unregistered listener skipped"),
        }
    }
}

impl<S: 'static> Store<S> {
    /// Subscribes the rendering unit to the whole state.
    pub fn use_store(&self) -> S
    where
        S: Clone + PartialEq,
    {
        let (selector, equality) = if is_rendering() {
            let handles = remember(|| {
                (
                    Selector::<S, S>::whole(),
                    EqualityCheck::<S>::partial_eq(),
                )
            });
            (handles.0.clone(), handles.1.clone())
        } else {
            (Selector::whole(), EqualityCheck::partial_eq())
        };
        self.use_selector_with(&selector, &equality)
    }

    /// Tuple form: the whole state plus a setter.
    pub fn use_store_state(&self) -> (S, Setter<S>)
    where
        S: Clone + PartialEq,
    {
        (self.use_store(), self.setter())
    }

    /// Subscribes to `selector(state)` with `PartialEq` as the equality check.
    ///
    /// A fresh closure each render counts as a changed selector, and the
    /// stored one is replaced after that render.
    pub fn use_selector<T>(&self, selector: impl Fn(&S) -> T + 'static) -> T
    where
        T: Clone + PartialEq + 'static,
    {
        let equality = if is_rendering() {
            (*remember(EqualityCheck::<T>::partial_eq)).clone()
        } else {
            EqualityCheck::partial_eq()
        };
        self.use_selector_with(&Selector::new(selector), &equality)
    }

    /// Returns the current slice. During a render, also keeps the unit
    /// subscribed so it re-renders when the slice changes under `equality`.
    ///
    /// Outside a render this logs a warning and only reads.
    pub fn use_selector_with<T>(&self, selector: &Selector<S, T>, equality: &EqualityCheck<T>) -> T
    where
        T: Clone + 'static,
    {
        match self.try_use_selector_with(selector, equality) {
            Ok(slice) => slice,
            Err(err) => {
                log::warn!("store '{}': {err}; not subscribing", self.name());
                self.read(|s| selector.select(s))
            }
        }
    }

    /// Like [`Store::use_selector_with`], but fails outside a render.
    pub fn try_use_selector_with<T>(
        &self,
        selector: &Selector<S, T>,
        equality: &EqualityCheck<T>,
    ) -> Result<T, StoreError>
    where
        T: Clone + 'static,
    {
        if !is_rendering() {
            return Err(StoreError::OutsideRender);
        }
        let current = self.read(|s| selector.select(s));
        self.bind_unit(selector, equality, &current);
        Ok(current)
    }

    fn bind_unit<T>(&self, selector: &Selector<S, T>, equality: &EqualityCheck<T>, current: &T)
    where
        T: Clone + 'static,
    {
        let slot = remember(HookSlot::<S, T>::default);
        let trigger = use_force_update();
        let catch_up = self.inner.config.catch_up;

        mount_effect({
            let store = self.clone();
            let slot = slot.clone();
            let selector = selector.clone();
            let equality = equality.clone();
            let current = current.clone();
            let trigger = trigger.clone();
            move || {
                let listener = Rc::new(RefCell::new(Listener::new(
                    selector.clone(),
                    equality.clone(),
                    current.clone(),
                    trigger.clone().into_callback(),
                    store.inner.config.refresh,
                )));
                let key = store.register(listener.clone());
                *slot.listener.borrow_mut() = Some((key, listener));

                if catch_up && store.is_stale(&selector, &equality, &current) {
                    log::debug!("store '{}': catch-up render for {:?}", store.name(), key);
                    trigger.fire();
                }

                on_unmount(move || {
                    slot.listener.borrow_mut().take();
                    if let Err(err) = store.unregister(key) {
                        log::warn!("store '{}': {err}", store.name());
                    }
                })
            }
        });

        update_effect(selector.handle(), {
            let slot = slot.clone();
            let selector = selector.clone();
            move || slot.with_listener(|l| l.selector = selector)
        });

        update_effect(equality.handle(), {
            let store = self.clone();
            let slot = slot.clone();
            let selector = selector.clone();
            let equality = equality.clone();
            let current = current.clone();
            let trigger = trigger.clone();
            move || {
                slot.with_listener(|l| l.equality = equality.clone());
                if catch_up && store.is_stale(&selector, &equality, &current) {
                    trigger.fire();
                }
            }
        });

        update_effect_always({
            let current = current.clone();
            move || slot.with_listener(|l| l.prev_slice = current)
        });
    }
}
