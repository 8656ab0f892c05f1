use std::borrow::Cow;

/// When a render-driven listener's comparison baseline advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SliceRefresh {
    /// Only during the owning unit's render. Several mutations between
    /// renders all compare against the slice of the last render.
    #[default]
    OnRender,
    /// Also whenever a notification fires for the listener.
    OnNotify,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Shown in logs and dispatch reports.
    pub name: Cow<'static, str>,
    pub refresh: SliceRefresh,
    /// Re-check the selection right after registration (and after an
    /// equality-check swap) to catch mutations racing with mount.
    pub catch_up: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("store"),
            refresh: SliceRefresh::OnRender,
            catch_up: true,
        }
    }
}

impl StoreConfig {
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn refresh(mut self, refresh: SliceRefresh) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn catch_up(mut self, enabled: bool) -> Self {
        self.catch_up = enabled;
        self
    }
}
