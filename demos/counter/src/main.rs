use hookstore::{SliceRefresh, Store, StoreConfig};
use hookstore_core::{Runtime, mount_effect, on_unmount};
use hookstore_devtools::Inspector;

#[derive(Clone, Debug, PartialEq)]
struct Counters {
    clicks: u32,
    resets: u32,
}

fn label(store: Store<Counters>, name: &'static str, pick: fn(&Counters) -> u32) -> impl FnMut() {
    move || {
        let value = store.use_selector(pick);
        mount_effect(move || {
            log::info!("{name}: mounted");
            on_unmount(move || log::info!("{name}: unmounted"))
        });
        println!("{name} = {value}");
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let store = Store::with_config(
        Counters {
            clicks: 0,
            resets: 0,
        },
        StoreConfig::default()
            .named("counters")
            .refresh(SliceRefresh::OnRender),
    );
    let mut inspector = Inspector::new();
    inspector.watch(&store);

    let rt = Runtime::new();
    let clicks = rt.mount("clicks", label(store.clone(), "clicks", |c| c.clicks));
    rt.mount("resets", label(store.clone(), "resets", |c| c.resets));

    for _ in 0..3 {
        store.update(|c| Counters {
            clicks: c.clicks + 1,
            ..c.clone()
        });
        inspector.record_flush(rt.flush()?);
    }

    store.modify(|c| {
        c.clicks = 0;
        c.resets += 1;
    });
    inspector.record_flush(rt.flush()?);

    rt.unmount(clicks)?;
    store.modify(|c| c.clicks = 99);
    inspector.record_flush(rt.flush()?);

    inspector.log_summary();
    println!("{}", inspector.summary());
    Ok(())
}
