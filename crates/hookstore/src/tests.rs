use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hookstore_core::Runtime;

use crate::*;

#[derive(Clone, Debug, PartialEq)]
struct Pair {
    a: i32,
    b: i32,
}

fn pair_store() -> Store<Pair> {
    create_store(Pair { a: 1, b: 2 })
}

/// Mounts a unit that subscribes to `select` and records each returned slice.
fn mount_selecting(
    rt: &Runtime,
    store: &Store<Pair>,
    name: &str,
    select: fn(&Pair) -> i32,
) -> (hookstore_core::UnitId, Rc<RefCell<Vec<i32>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let unit = rt.mount(name, {
        let store = store.clone();
        let seen = seen.clone();
        move || seen.borrow_mut().push(store.use_selector(select))
    });
    (unit, seen)
}

fn counting_reports(store: &Store<Pair>) -> Rc<RefCell<Vec<usize>>> {
    let triggered = Rc::new(RefCell::new(Vec::new()));
    store.on_dispatch({
        let triggered = triggered.clone();
        move |report| triggered.borrow_mut().push(report.triggered)
    });
    triggered
}

#[test]
fn test_get_after_set() {
    let store = create_store(0);
    for s in [3, -7, 42, 42] {
        store.set(s);
        assert_eq!(store.get(), s);
    }
}

#[test]
fn test_set_with_updater() {
    let store = create_store(10);
    store.set(Update::with(|prev: &i32| prev * 3));
    assert_eq!(store.get(), 30);

    store.update(|prev| prev - 5);
    assert_eq!(store.get(), 25);

    store.modify(|s| *s += 1);
    assert_eq!(store.get(), 26);

    let setter = store.setter();
    setter.set(1);
    setter.clone().update(|prev| prev + 1);
    assert_eq!(store.read(|s| *s), 2);
}

#[test]
fn test_lazy_initializer_runs_once() {
    let calls = Rc::new(Cell::new(0));
    let store = create_store_with({
        let calls = calls.clone();
        move || {
            calls.set(calls.get() + 1);
            vec![1, 2, 3]
        }
    });
    assert_eq!(calls.get(), 1);

    let rt = Runtime::new();
    for name in ["x", "y"] {
        let store = store.clone();
        rt.mount(name, move || {
            store.use_store();
        });
    }
    store.set(vec![4]);
    rt.flush().unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_disjoint_selectors_rerender_selectively() {
    let store = pair_store();
    let rt = Runtime::new();
    let (a_unit, a_seen) = mount_selecting(&rt, &store, "a", |s| s.a);
    let (b_unit, b_seen) = mount_selecting(&rt, &store, "b", |s| s.b);
    let triggered = counting_reports(&store);

    store.update(|s| Pair { b: 3, ..s.clone() });

    assert_eq!(*triggered.borrow(), vec![1]);
    assert_eq!(store.get(), Pair { a: 1, b: 3 });
    assert_eq!(rt.flush().unwrap(), 1);
    assert_eq!(rt.render_count(a_unit), Some(1));
    assert_eq!(rt.render_count(b_unit), Some(2));
    assert_eq!(*a_seen.borrow(), vec![1]);
    assert_eq!(*b_seen.borrow(), vec![2, 3]);
}

#[test]
fn test_rerenders_iff_slice_changes() {
    let store = pair_store();
    let rt = Runtime::new();
    let (unit, seen) = mount_selecting(&rt, &store, "a", |s| s.a);

    // same slice, different state
    store.set(Pair { a: 1, b: 100 });
    rt.flush().unwrap();
    assert_eq!(rt.render_count(unit), Some(1));

    store.set(Pair { a: 5, b: 100 });
    rt.flush().unwrap();
    assert_eq!(rt.render_count(unit), Some(2));
    assert_eq!(*seen.borrow(), vec![1, 5]);

    // baseline is now the slice of the last render
    store.set(Pair { a: 5, b: 0 });
    rt.flush().unwrap();
    assert_eq!(rt.render_count(unit), Some(2));
}

#[test]
fn test_always_equal_never_rerenders() {
    let store = pair_store();
    let rt = Runtime::new();
    let selector = Selector::new(|s: &Pair| s.a);
    let equality = EqualityCheck::new(|_: &i32, _: &i32| true);

    let unit = rt.mount("stubborn", {
        let store = store.clone();
        move || {
            store.use_selector_with(&selector, &equality);
        }
    });

    for a in 2..6 {
        store.set(Pair { a, b: a });
        rt.flush().unwrap();
    }
    assert_eq!(rt.render_count(unit), Some(1));
}

#[test]
fn test_unmount_removes_listener() {
    let store = pair_store();
    let rt = Runtime::new();
    let (unit, _) = mount_selecting(&rt, &store, "a", |s| s.a);
    assert_eq!(store.listener_count(), 1);

    rt.unmount(unit).unwrap();
    assert_eq!(store.listener_count(), 0);

    let triggered = counting_reports(&store);
    store.set(Pair { a: 9, b: 9 });
    assert_eq!(*triggered.borrow(), vec![0]);
    assert_eq!(rt.flush().unwrap(), 0);
}

#[test]
fn test_catch_up_on_mount() {
    let store = pair_store();
    let rt = Runtime::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    // Mutates the store after reading it but before the mount commits.
    let unit = rt.mount("racy", {
        let store = store.clone();
        let seen = seen.clone();
        let mut first = true;
        move || {
            seen.borrow_mut().push(store.use_selector(|s: &Pair| s.a));
            if std::mem::take(&mut first) {
                store.set(Pair { a: 7, b: 2 });
            }
        }
    });

    assert_eq!(rt.pending(), 1);
    rt.flush().unwrap();
    assert_eq!(rt.render_count(unit), Some(2));
    assert_eq!(*seen.borrow(), vec![1, 7]);
}

#[test]
fn test_catch_up_disabled() {
    let store = Store::with_config(Pair { a: 1, b: 2 }, StoreConfig::default().catch_up(false));
    let rt = Runtime::new();

    rt.mount("racy", {
        let store = store.clone();
        let mut first = true;
        move || {
            store.use_selector(|s: &Pair| s.a);
            if std::mem::take(&mut first) {
                store.set(Pair { a: 7, b: 2 });
            }
        }
    });

    assert_eq!(rt.pending(), 0);
}

#[test]
fn test_equality_swap_takes_effect_after_render() {
    let store = pair_store();
    let rt = Runtime::new();
    let selector = Selector::new(|s: &Pair| s.a);
    let strict = EqualityCheck::<i32>::partial_eq();
    let lenient = EqualityCheck::new(|prev: &i32, next: &i32| (prev - next).abs() < 10);
    let use_lenient = Rc::new(Cell::new(false));
    assert!(strict.same(&strict.clone()));
    assert!(!strict.same(&lenient));

    let unit = rt.mount("swap", {
        let store = store.clone();
        let use_lenient = use_lenient.clone();
        move || {
            let equality = if use_lenient.get() { &lenient } else { &strict };
            store.use_selector_with(&selector, equality);
        }
    });

    use_lenient.set(true);
    rt.request_render(unit);
    rt.flush().unwrap();
    assert_eq!(rt.render_count(unit), Some(2));

    store.set(Pair { a: 5, b: 2 });
    rt.flush().unwrap();
    assert_eq!(rt.render_count(unit), Some(2));

    store.set(Pair { a: 50, b: 2 });
    rt.flush().unwrap();
    assert_eq!(rt.render_count(unit), Some(3));
}

#[test]
fn test_selector_swap_takes_effect_after_render() {
    let store = pair_store();
    let rt = Runtime::new();
    let pick_a = Selector::new(|s: &Pair| s.a);
    let pick_b = Selector::new(|s: &Pair| s.b);
    let equality = EqualityCheck::partial_eq();
    let on_b = Rc::new(Cell::new(false));
    assert!(!pick_a.same(&pick_b));

    let unit = rt.mount("swap", {
        let store = store.clone();
        let on_b = on_b.clone();
        move || {
            let selector = if on_b.get() { &pick_b } else { &pick_a };
            store.use_selector_with(selector, &equality);
        }
    });

    on_b.set(true);
    rt.request_render(unit);
    rt.flush().unwrap();

    // only `a` changes: the listener now watches `b`
    store.set(Pair { a: 40, b: 2 });
    rt.flush().unwrap();
    assert_eq!(rt.render_count(unit), Some(2));

    store.set(Pair { a: 40, b: 3 });
    rt.flush().unwrap();
    assert_eq!(rt.render_count(unit), Some(3));
}

/// Mounts a unit on a lenient equality check that moves to `PartialEq` on its
/// second render, changing `a` right after reading it in that render. The
/// lenient check still owns the listener at dispatch time, so only the
/// post-swap comparison can notice the change.
fn mount_tightening(rt: &Runtime, store: &Store<Pair>) -> hookstore_core::UnitId {
    let selector = Selector::new(|s: &Pair| s.a);
    let lenient = EqualityCheck::new(|prev: &i32, next: &i32| (prev - next).abs() < 10);
    let strict = EqualityCheck::<i32>::partial_eq();
    let pass = Rc::new(Cell::new(0));

    rt.mount("tighten", {
        let store = store.clone();
        move || {
            pass.set(pass.get() + 1);
            let equality = if pass.get() == 1 { &lenient } else { &strict };
            store.use_selector_with(&selector, equality);
            if pass.get() == 2 {
                store.set(Pair { a: 7, b: 2 });
            }
        }
    })
}

#[test]
fn test_equality_swap_catches_up_with_missed_change() {
    let store = pair_store();
    let rt = Runtime::new();
    let unit = mount_tightening(&rt, &store);
    let triggered = counting_reports(&store);

    rt.request_render(unit);
    // second render plus the catch-up render it schedules
    assert_eq!(rt.flush().unwrap(), 2);
    assert_eq!(*triggered.borrow(), vec![0]);
    assert_eq!(rt.render_count(unit), Some(3));
    assert_eq!(rt.pending(), 0);
}

#[test]
fn test_equality_swap_without_catch_up() {
    let store = Store::with_config(Pair { a: 1, b: 2 }, StoreConfig::default().catch_up(false));
    let rt = Runtime::new();
    let unit = mount_tightening(&rt, &store);
    let triggered = counting_reports(&store);

    rt.request_render(unit);
    assert_eq!(rt.flush().unwrap(), 1);
    assert_eq!(*triggered.borrow(), vec![0]);
    assert_eq!(rt.render_count(unit), Some(2));
    assert_eq!(rt.pending(), 0);
}

#[test]
fn test_unit_unmounted_mid_render_skips_listener_updates() {
    let store = pair_store();
    let rt = Runtime::new();
    let own_id = Rc::new(Cell::new(None));

    // On a re-render the unit unmounts itself after calling the hook, so the
    // commit-phase selector and baseline updates find no registration.
    let unit = rt.mount("leaving", {
        let store = store.clone();
        let rt = rt.clone();
        let own_id = own_id.clone();
        move || {
            store.use_selector(|s: &Pair| s.a);
            if let Some(id) = own_id.get() {
                rt.unmount(id).unwrap();
            }
        }
    });
    own_id.set(Some(unit));
    assert_eq!(store.listener_count(), 1);

    rt.request_render(unit);
    assert_eq!(rt.flush().unwrap(), 1);
    assert!(!rt.is_mounted(unit));
    assert_eq!(store.listener_count(), 0);

    let triggered = counting_reports(&store);
    store.set(Pair { a: 9, b: 9 });
    assert_eq!(*triggered.borrow(), vec![0]);
    assert_eq!(rt.flush().unwrap(), 0);
}

#[test]
fn test_refresh_on_render_keeps_last_render_baseline() {
    let store = pair_store();
    let rt = Runtime::new();
    mount_selecting(&rt, &store, "a", |s| s.a);
    let triggered = counting_reports(&store);

    store.set(Pair { a: 2, b: 2 });
    store.set(Pair { a: 2, b: 2 });

    // both compare against a == 1 from the mount render
    assert_eq!(*triggered.borrow(), vec![1, 1]);
}

#[test]
fn test_refresh_on_notify_advances_baseline() {
    let store = Store::with_config(
        Pair { a: 1, b: 2 },
        StoreConfig::default()
            .named("pairs")
            .refresh(SliceRefresh::OnNotify),
    );
    let rt = Runtime::new();
    mount_selecting(&rt, &store, "a", |s| s.a);
    let triggered = counting_reports(&store);

    store.set(Pair { a: 2, b: 2 });
    store.set(Pair { a: 2, b: 2 });

    assert_eq!(*triggered.borrow(), vec![1, 0]);
    assert_eq!(store.name(), "pairs");
    assert_eq!(store.config().refresh, SliceRefresh::OnNotify);
    assert!(store.config().catch_up);
}

#[test]
fn test_use_store_state_tuple() {
    let store = create_store(0u32);
    let rt = Runtime::new();
    let setter = Rc::new(RefCell::new(None::<Setter<u32>>));
    let seen = Rc::new(RefCell::new(Vec::new()));

    let unit = rt.mount("tuple", {
        let store = store.clone();
        let setter = setter.clone();
        let seen = seen.clone();
        move || {
            let (value, set) = store.use_store_state();
            seen.borrow_mut().push(value);
            *setter.borrow_mut() = Some(set);
        }
    });

    let set = setter.borrow().clone().unwrap();
    set.update(|n| n + 1);
    rt.flush().unwrap();
    assert_eq!(rt.render_count(unit), Some(2));
    assert_eq!(*seen.borrow(), vec![0, 1]);
}

#[test]
fn test_hooks_outside_render() {
    let store = pair_store();
    assert_eq!(store.use_selector(|s: &Pair| s.b), 2);
    assert_eq!(store.use_store(), Pair { a: 1, b: 2 });
    assert_eq!(store.listener_count(), 0);

    let result = store.try_use_selector_with(
        &Selector::new(|s: &Pair| s.a),
        &EqualityCheck::partial_eq(),
    );
    assert_eq!(result, Err(StoreError::OutsideRender));
}

#[test]
fn test_subscribe_and_unsubscribe() {
    let store = pair_store();
    let calls = Rc::new(Cell::new(0));
    let sub = store.subscribe(Selector::new(|s: &Pair| s.b), EqualityCheck::partial_eq(), {
        let calls = calls.clone();
        move || calls.set(calls.get() + 1)
    });
    let key = sub.key().unwrap();
    assert!(store.is_registered(key));

    store.set(Pair { a: 1, b: 3 });
    store.set(Pair { a: 1, b: 3 });
    store.set(Pair { a: 9, b: 3 });
    assert_eq!(calls.get(), 1);

    sub.unsubscribe().unwrap();
    assert!(!store.is_registered(key));
    store.set(Pair { a: 1, b: 4 });
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_subscription_drop_unsubscribes() {
    let store = pair_store();
    {
        let _sub = store.subscribe(Selector::whole(), EqualityCheck::partial_eq(), || {});
        assert_eq!(store.listener_count(), 1);
    }
    assert_eq!(store.listener_count(), 0);
    assert_eq!(
        store.unregister(ListenerKey::default()),
        Err(StoreError::ListenerNotRegistered(ListenerKey::default()))
    );
}
