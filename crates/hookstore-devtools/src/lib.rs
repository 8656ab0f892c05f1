use std::cell::{Cell, RefCell};
use std::rc::Rc;

use web_time::Duration;

use hookstore::{DispatchReport, Store};

#[derive(Clone, Debug, Default)]
pub struct Metrics {
    pub dispatches: u64,
    pub listeners_checked: u64,
    pub renders_requested: u64,
    pub renders_flushed: u64,
    pub last_dispatch: Option<Duration>,
    /// Smoothed dispatch time in microseconds.
    pub dispatch_us_smooth: f32,
}

impl Metrics {
    fn record(&mut self, report: &DispatchReport) {
        self.dispatches += 1;
        self.listeners_checked += report.listeners as u64;
        self.renders_requested += report.triggered as u64;
        self.last_dispatch = Some(report.elapsed);

        let us = report.elapsed.as_secs_f32() * 1_000_000.0;
        // simple EMA
        let a = 0.2;
        self.dispatch_us_smooth = if self.dispatches == 1 {
            us
        } else {
            (1.0 - a) * self.dispatch_us_smooth + a * us
        };
    }

    /// Share of listener checks that ended in a render request.
    pub fn hit_rate(&self) -> f32 {
        if self.listeners_checked == 0 {
            0.0
        } else {
            self.renders_requested as f32 / self.listeners_checked as f32
        }
    }
}

/// Collects dispatch reports from watched stores and flush results from the
/// runtime. Recording happens only while `enabled`.
pub struct Inspector {
    enabled: Rc<Cell<bool>>,
    metrics: Rc<RefCell<Metrics>>,
    stores: Vec<String>,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self {
            enabled: Rc::new(Cell::new(true)),
            metrics: Rc::new(RefCell::new(Metrics::default())),
            stores: Vec::new(),
        }
    }

    pub fn toggle(&mut self) {
        self.enabled.set(!self.enabled.get());
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn watch<S: 'static>(&mut self, store: &Store<S>) {
        let metrics = self.metrics.clone();
        let enabled = self.enabled.clone();
        store.on_dispatch(move |report| {
            if enabled.get() {
                metrics.borrow_mut().record(report);
            }
        });
        log::debug!("inspector: watching store '{}'", store.name());
        self.stores.push(store.name().to_string());
    }

    pub fn record_flush(&mut self, renders: usize) {
        if self.enabled.get() {
            self.metrics.borrow_mut().renders_flushed += renders as u64;
        }
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.borrow().clone()
    }

    pub fn reset(&mut self) {
        *self.metrics.borrow_mut() = Metrics::default();
    }

    pub fn summary(&self) -> String {
        let m = self.metrics.borrow();
        let mut lines = vec![
            format!("stores: {}", self.stores.join(",")),
            format!("dispatches: {}", m.dispatches),
            format!("checked: {}", m.listeners_checked),
            format!("requested: {}", m.renders_requested),
            format!("flushed: {}", m.renders_flushed),
        ];
        if m.dispatches > 0 {
            lines.push(format!("dispatch: {:.1} us", m.dispatch_us_smooth));
        }
        lines.join("  |  ")
    }

    pub fn log_summary(&self) {
        if self.enabled.get() {
            log::info!("{}", self.summary());
        }
    }
}
