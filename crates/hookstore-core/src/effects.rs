use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::runtime::{is_rendering, remember, schedule_commit};
use crate::scope::current_scope;

#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    pub fn noop() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_spent(&self) -> bool {
        self.0.borrow().is_none()
    }
}

/// Helper to build the cleanup returned from a mount effect.
pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}

/// Runs `f` once per mount, after the first render commits. The returned
/// `Dispose` runs when the unit's scope is disposed (unmount).
///
/// Outside a render unit `f` runs immediately and its cleanup is attached to
/// the current scope, if any.
pub fn mount_effect<F>(f: F)
where
    F: FnOnce() -> Dispose + 'static,
{
    if is_rendering() && remember(|| Cell::new(false)).replace(true) {
        return;
    }
    schedule_commit(move || {
        let dispose = f();
        match current_scope() {
            Some(scope) => scope.add_disposer(move || dispose.run()),
            None => log::debug!("mount_effect: no scope; cleanup will not run automatically"),
        }
    });
}
