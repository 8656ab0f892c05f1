use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use slotmap::SlotMap;
use smallvec::SmallVec;
use web_time::{Duration, Instant};

use crate::config::{SliceRefresh, StoreConfig};
use crate::error::StoreError;
use crate::listener::{EqualityCheck, Listener, ListenerKey, Notify, Selector};

/// A state transition passed to [`Store::set`].
pub enum Update<S> {
    Replace(S),
    With(Box<dyn FnOnce(&S) -> S>),
}

impl<S> Update<S> {
    pub fn with(f: impl FnOnce(&S) -> S + 'static) -> Self {
        Update::With(Box::new(f))
    }

    fn apply(self, prev: &S) -> S {
        match self {
            Update::Replace(next) => next,
            Update::With(f) => f(prev),
        }
    }
}

impl<S> From<S> for Update<S> {
    fn from(next: S) -> Self {
        Update::Replace(next)
    }
}

/// What one `set` did, handed to dispatch observers.
#[derive(Clone, Debug)]
pub struct DispatchReport {
    pub store: Cow<'static, str>,
    /// Listeners compared against the new state.
    pub listeners: usize,
    /// Listeners whose trigger fired.
    pub triggered: usize,
    pub elapsed: Duration,
}

type Observer = Rc<dyn Fn(&DispatchReport)>;

pub(crate) struct StoreInner<S> {
    pub(crate) config: StoreConfig,
    state: RefCell<S>,
    listeners: RefCell<SlotMap<ListenerKey, Rc<dyn Notify<S>>>>,
    observers: RefCell<Vec<Observer>>,
}

/// Shared state cell plus its listener registry.
///
/// Handles are cheap to clone and all point at the same state.
pub struct Store<S: 'static> {
    pub(crate) inner: Rc<StoreInner<S>>,
}

impl<S: 'static> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Creates a store holding `initial`.
pub fn create_store<S: 'static>(initial: S) -> Store<S> {
    Store::new(initial)
}

/// Creates a store whose state is produced by `init`, called exactly once,
/// right here.
pub fn create_store_with<S: 'static>(init: impl FnOnce() -> S) -> Store<S> {
    Store::new(init())
}

impl<S: 'static> Store<S> {
    pub fn new(initial: S) -> Self {
        Self::with_config(initial, StoreConfig::default())
    }

    pub fn with_config(initial: S, config: StoreConfig) -> Self {
        log::debug!("store '{}': created", config.name);
        Self {
            inner: Rc::new(StoreInner {
                config,
                state: RefCell::new(initial),
                listeners: RefCell::new(SlotMap::with_key()),
                observers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn get(&self) -> S
    where
        S: Clone,
    {
        self.inner.state.borrow().clone()
    }

    /// Reads state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Stores the new state, then notifies every registered listener.
    pub fn set(&self, update: impl Into<Update<S>>) {
        let next = update.into().apply(&self.inner.state.borrow());
        *self.inner.state.borrow_mut() = next;
        self.dispatch();
    }

    pub fn update(&self, f: impl FnOnce(&S) -> S + 'static) {
        self.set(Update::with(f))
    }

    /// In-place variant of [`Store::update`].
    pub fn modify(&self, f: impl FnOnce(&mut S)) {
        f(&mut self.inner.state.borrow_mut());
        self.dispatch();
    }

    pub fn setter(&self) -> Setter<S> {
        Setter {
            store: self.clone(),
        }
    }

    /// Registers a render-free listener. `on_change` runs whenever the
    /// selected slice changes under `equality`.
    ///
    /// There is no render to refresh the baseline from, so it advances at
    /// every notification.
    pub fn subscribe<T: 'static>(
        &self,
        selector: Selector<S, T>,
        equality: EqualityCheck<T>,
        on_change: impl Fn() + 'static,
    ) -> Subscription<S> {
        let current = self.read(|s| selector.select(s));
        let listener = Listener::new(
            selector,
            equality,
            current,
            Rc::new(on_change),
            SliceRefresh::OnNotify,
        );
        let key = self.register(Rc::new(RefCell::new(listener)));
        Subscription {
            store: Rc::downgrade(&self.inner),
            key: Some(key),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub fn is_registered(&self, key: ListenerKey) -> bool {
        self.inner.listeners.borrow().contains_key(key)
    }

    /// Calls `observer` after every dispatch.
    pub fn on_dispatch(&self, observer: impl Fn(&DispatchReport) + 'static) {
        self.inner.observers.borrow_mut().push(Rc::new(observer));
    }

    pub(crate) fn register(&self, listener: Rc<dyn Notify<S>>) -> ListenerKey {
        let key = self.inner.listeners.borrow_mut().insert(listener);
        log::debug!("store '{}': registered {:?}", self.name(), key);
        key
    }

    pub(crate) fn unregister(&self, key: ListenerKey) -> Result<(), StoreError> {
        self.inner
            .listeners
            .borrow_mut()
            .remove(key)
            .ok_or(StoreError::ListenerNotRegistered(key))?;
        log::debug!("store '{}': unregistered {:?}", self.name(), key);
        Ok(())
    }

    /// Whether `selector` over the current state disagrees with `seen`.
    pub(crate) fn is_stale<T>(
        &self,
        selector: &Selector<S, T>,
        equality: &EqualityCheck<T>,
        seen: &T,
    ) -> bool {
        let fresh = self.read(|s| selector.select(s));
        !equality.check(seen, &fresh)
    }

    fn dispatch(&self) {
        let started = Instant::now();

        // Snapshot so listeners may (un)register from their triggers.
        let listeners: SmallVec<[Rc<dyn Notify<S>>; 8]> =
            self.inner.listeners.borrow().values().cloned().collect();
        let triggers: SmallVec<[Rc<dyn Fn()>; 8]> = {
            let state = self.inner.state.borrow();
            listeners.iter().filter_map(|l| l.check(&state)).collect()
        };
        for trigger in &triggers {
            trigger();
        }

        let report = DispatchReport {
            store: self.inner.config.name.clone(),
            listeners: listeners.len(),
            triggered: triggers.len(),
            elapsed: started.elapsed(),
        };
        log::trace!(
            "store '{}': dispatch to {} listener(s), {} triggered",
            report.store,
            report.listeners,
            report.triggered
        );

        let observers: SmallVec<[Observer; 2]> =
            self.inner.observers.borrow().iter().cloned().collect();
        for observer in observers {
            observer(&report);
        }
    }
}

/// Write-only handle to a store.
pub struct Setter<S: 'static> {
    store: Store<S>,
}

impl<S: 'static> Clone for Setter<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: 'static> Setter<S> {
    pub fn set(&self, update: impl Into<Update<S>>) {
        self.store.set(update)
    }

    pub fn update(&self, f: impl FnOnce(&S) -> S + 'static) {
        self.store.update(f)
    }

    pub fn modify(&self, f: impl FnOnce(&mut S)) {
        self.store.modify(f)
    }
}

/// Registration returned by [`Store::subscribe`]. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription<S: 'static> {
    store: Weak<StoreInner<S>>,
    key: Option<ListenerKey>,
}

impl<S: 'static> Subscription<S> {
    pub fn key(&self) -> Option<ListenerKey> {
        self.key
    }

    pub fn unsubscribe(mut self) -> Result<(), StoreError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), StoreError> {
        let Some(key) = self.key.take() else {
            return Ok(());
        };
        // A dropped store has no registry left to clean.
        let Some(inner) = self.store.upgrade() else {
            return Ok(());
        };
        Store { inner }.unregister(key)
    }
}

impl<S: 'static> Drop for Subscription<S> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            log::warn!("subscription: {err}");
        }
    }
}
