use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};

use crate::error::CoreError;
use crate::scope::Scope;

new_key_type! {
    /// Identity of a mounted render unit.
    pub struct UnitId;
}

/// Per-unit hook storage: ordered slots, keyed slots and the effect queue
/// drained at commit.
#[derive(Default)]
pub struct Composer {
    pub slots: Vec<Box<dyn Any>>,
    pub cursor: usize,
    pub keyed_slots: HashMap<String, Box<dyn Any>>,
    pending: Vec<Box<dyn FnOnce()>>,
    committed: bool,
}

impl Composer {
    /// True until the first commit of the owning unit has finished.
    pub fn is_first_render(&self) -> bool {
        !self.committed
    }
}

thread_local! {
    /// Keyed storage for `remember_with_key` calls made outside any unit.
    pub static DETACHED: Rc<RefCell<Composer>> = Rc::new(RefCell::new(Composer::default()));
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

#[derive(Clone)]
struct Frame {
    runtime: Weak<RuntimeInner>,
    unit: UnitId,
    composer: Rc<RefCell<Composer>>,
}

fn current_composer() -> Rc<RefCell<Composer>> {
    FRAMES.with(|f| f.borrow().last().map(|frame| frame.composer.clone()))
        .unwrap_or_else(|| DETACHED.with(|d| d.clone()))
}

/// The unit currently rendering, if any.
pub fn current_unit() -> Option<UnitId> {
    FRAMES.with(|f| f.borrow().last().map(|frame| frame.unit))
}

pub fn is_rendering() -> bool {
    current_unit().is_some()
}

/// True during the first render of the current unit (before its mount
/// effects have committed). Outside a unit this is always true.
pub fn is_first_render() -> bool {
    current_composer().borrow().is_first_render()
}

/// Queues `f` to run once the current render returns. Outside a unit it
/// runs immediately.
pub(crate) fn schedule_commit(f: impl FnOnce() + 'static) {
    if !is_rendering() {
        f();
        return;
    }
    current_composer().borrow_mut().pending.push(Box::new(f));
}

/// Slot-based remember (sequential composition only)
///
/// Outside a render unit there is no render to order slots by, so nothing
/// is stored: every call returns a fresh `init()`.
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    if !is_rendering() {
        log::trace!("remember: no render unit; value is not stored");
        return Rc::new(init());
    }
    let composer = current_composer();
    let cursor = {
        let mut c = composer.borrow_mut();
        let cursor = c.cursor;
        c.cursor += 1;
        if let Some(existing) = c.slots.get(cursor) {
            if let Some(rc) = existing.downcast_ref::<Rc<T>>() {
                return rc.clone();
            }
            log::warn!(
                "remember: slot {} type changed; replacing. \
                 If this is due to conditional hooks, prefer remember_with_key.",
                cursor
            );
        }
        cursor
    };

    // `init` may itself call hooks, so the composer must not be borrowed here.
    let rc: Rc<T> = Rc::new(init());
    let mut c = composer.borrow_mut();
    if cursor < c.slots.len() {
        c.slots[cursor] = Box::new(rc.clone());
    } else {
        c.slots.push(Box::new(rc.clone()));
    }
    rc
}

/// Key-based remember
pub fn remember_with_key<T: 'static>(key: impl Into<String>, init: impl FnOnce() -> T) -> Rc<T> {
    let composer = current_composer();
    let key = key.into();

    if let Some(existing) = composer.borrow().keyed_slots.get(&key) {
        if let Some(rc) = existing.downcast_ref::<Rc<T>>() {
            return rc.clone();
        }
        log::warn!(
            "remember_with_key: key '{}' reused with a different type; replacing.",
            key
        );
    }

    let rc: Rc<T> = Rc::new(init());
    composer
        .borrow_mut()
        .keyed_slots
        .insert(key, Box::new(rc.clone()));
    rc
}

pub fn remember_state<T: 'static>(init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    remember(|| RefCell::new(init()))
}

/// Re-render request handle for one unit.
///
/// Firing after the unit unmounted (or the runtime dropped) is a no-op.
#[derive(Clone)]
pub struct Trigger {
    runtime: Weak<RuntimeInner>,
    unit: Option<UnitId>,
}

impl Trigger {
    pub fn fire(&self) {
        let (Some(unit), Some(inner)) = (self.unit, self.runtime.upgrade()) else {
            log::trace!("trigger: no live unit; ignoring");
            return;
        };
        Runtime { inner }.request_render(unit);
    }

    pub fn unit(&self) -> Option<UnitId> {
        self.unit
    }

    /// Type-erased form for collaborators that only need "schedule a render".
    pub fn into_callback(self) -> Rc<dyn Fn()> {
        Rc::new(move || self.fire())
    }
}

/// Returns a trigger that schedules a re-render of the calling unit.
pub fn use_force_update() -> Trigger {
    FRAMES.with(|f| match f.borrow().last() {
        Some(frame) => Trigger {
            runtime: frame.runtime.clone(),
            unit: Some(frame.unit),
        },
        None => {
            log::warn!("use_force_update called outside a render unit; trigger is inert");
            Trigger {
                runtime: Weak::new(),
                unit: None,
            }
        }
    })
}

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Upper bound on renders in one `flush`, guarding against units that
    /// re-request a render on every pass.
    pub max_renders_per_flush: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_renders_per_flush: 1024,
        }
    }
}

struct Unit {
    name: String,
    render: RefCell<Box<dyn FnMut()>>,
    composer: Rc<RefCell<Composer>>,
    scope: Scope,
    renders: Cell<u64>,
}

struct RuntimeInner {
    config: RuntimeConfig,
    units: RefCell<SlotMap<UnitId, Rc<Unit>>>,
    dirty: RefCell<VecDeque<UnitId>>,
}

/// Owns render units and the queue of units waiting to re-render.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                config,
                units: RefCell::new(SlotMap::with_key()),
                dirty: RefCell::new(VecDeque::new()),
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Inserts a unit and performs its mount (first render plus commit).
    pub fn mount(&self, name: impl Into<String>, render: impl FnMut() + 'static) -> UnitId {
        let unit = Rc::new(Unit {
            name: name.into(),
            render: RefCell::new(Box::new(render)),
            composer: Rc::new(RefCell::new(Composer::default())),
            scope: Scope::new(),
            renders: Cell::new(0),
        });
        let id = self.inner.units.borrow_mut().insert(unit.clone());
        log::debug!("mount: unit '{}' ({:?})", unit.name, id);
        self.render_unit(id, &unit);
        id
    }

    /// Removes a unit and runs its cleanups before returning.
    pub fn unmount(&self, id: UnitId) -> Result<(), CoreError> {
        let unit = self
            .inner
            .units
            .borrow_mut()
            .remove(id)
            .ok_or(CoreError::UnknownUnit(id))?;
        self.inner.dirty.borrow_mut().retain(|queued| *queued != id);
        log::debug!("unmount: unit '{}' ({:?})", unit.name, id);
        unit.scope.clone().dispose();
        Ok(())
    }

    pub fn request_render(&self, id: UnitId) {
        if !self.is_mounted(id) {
            log::trace!("request_render: {:?} is not mounted", id);
            return;
        }
        let mut dirty = self.inner.dirty.borrow_mut();
        if !dirty.contains(&id) {
            log::trace!("request_render: queued {:?}", id);
            dirty.push_back(id);
        }
    }

    /// Re-renders queued units until the queue drains. Returns the number of
    /// renders performed.
    pub fn flush(&self) -> Result<usize, CoreError> {
        let limit = self.inner.config.max_renders_per_flush;
        let mut renders = 0;
        loop {
            let next = self.inner.dirty.borrow_mut().pop_front();
            let Some(id) = next else { break };
            let unit = self.inner.units.borrow().get(id).cloned();
            let Some(unit) = unit else { continue };

            if renders == limit {
                self.inner.dirty.borrow_mut().push_front(id);
                return Err(CoreError::FlushOverflow(limit));
            }
            self.render_unit(id, &unit);
            renders += 1;
        }
        if renders > 0 {
            log::trace!("flush: {} render(s)", renders);
        }
        Ok(renders)
    }

    pub fn is_mounted(&self, id: UnitId) -> bool {
        self.inner.units.borrow().contains_key(id)
    }

    pub fn render_count(&self, id: UnitId) -> Option<u64> {
        self.inner.units.borrow().get(id).map(|u| u.renders.get())
    }

    pub fn unit_count(&self) -> usize {
        self.inner.units.borrow().len()
    }

    /// Units waiting for the next `flush`.
    pub fn pending(&self) -> usize {
        self.inner.dirty.borrow().len()
    }

    fn render_unit(&self, id: UnitId, unit: &Rc<Unit>) {
        struct PopFrame;
        impl Drop for PopFrame {
            fn drop(&mut self) {
                FRAMES.with(|f| {
                    f.borrow_mut().pop();
                });
            }
        }

        unit.composer.borrow_mut().cursor = 0;
        FRAMES.with(|f| {
            f.borrow_mut().push(Frame {
                runtime: Rc::downgrade(&self.inner),
                unit: id,
                composer: unit.composer.clone(),
            })
        });

        {
            let _frame = PopFrame;
            unit.scope.run(|| {
                let mut render = unit.render.borrow_mut();
                (*render)()
            });
        }
        unit.renders.set(unit.renders.get() + 1);
        log::trace!("render: '{}' #{}", unit.name, unit.renders.get());

        // Commit: effects run in declaration order, against the unit's scope.
        let pending = std::mem::take(&mut unit.composer.borrow_mut().pending);
        unit.scope.run(|| {
            for effect in pending {
                effect();
            }
        });
        unit.composer.borrow_mut().committed = true;
    }
}
