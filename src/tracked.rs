//! The per-window visibility state machine.
//!
//! A [`TrackedWindow`] is rebuilt for every invocation from a name; its id
//! and visibility are always read back from the [`StateStore`], never cached.
//!
//! ```text
//!  Untracked ──setup_tracking──▶ NotVisible ──show_and_update──▶ Visible
//!      ▲                            ▲                               │
//!      └────────── destroy          └──────── hide_and_update ──────┘
//! ```
//!
//! A missing or undecodable visibility is repaired by
//! [`show_or_hide`](TrackedWindow::show_or_hide): it stores `Visible` and
//! reports [`TrackError::CorruptState`] for that one invocation.

use crate::command::{Visibility, WindowKind};
use crate::state::StoreError;
use crate::traits::{StateStore, WindowManager};
use log::{debug, info, warn};

/// Errors from a single-window operation.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("state store error: {0}")]
    Store(#[from] StoreError),
    /// The window manager returned an error.
    #[error("window manager error: {0}")]
    WindowManager(String),
    #[error("window '{0}' is not tracked")]
    NotTracked(String),
    /// The stored visibility was missing or corrupt and has been reset to
    /// visible.  The next invocation proceeds normally.
    #[error("window '{0}' had no valid stored state; it is now assumed visible")]
    CorruptState(String),
}

/// A named window bound to a store and a window manager.
pub struct TrackedWindow<'a, S: StateStore, W: WindowManager> {
    name: String,
    kind: WindowKind,
    switch_to: bool,
    store: &'a S,
    wm: &'a W,
}

impl<'a, S: StateStore, W: WindowManager> TrackedWindow<'a, S, W> {
    pub fn new(
        name: impl Into<String>,
        kind: WindowKind,
        switch_to: bool,
        store: &'a S,
        wm: &'a W,
    ) -> Self {
        let name = name.into();
        debug!("tracked window {} (kind={}, switch_to={})", name, kind, switch_to);
        Self {
            name,
            kind,
            switch_to,
            store,
            wm,
        }
    }

    /// External id, if the window is tracked.
    pub fn id(&self) -> Result<Option<String>, TrackError> {
        Ok(self.store.get_id(&self.name)?)
    }

    fn require_id(&self) -> Result<String, TrackError> {
        self.id()?
            .ok_or_else(|| TrackError::NotTracked(self.name.clone()))
    }

    /// Visibility as stored, `None` when untracked or never recorded.
    pub fn raw_state(&self) -> Result<Option<Visibility>, TrackError> {
        match self.id()? {
            Some(id) => Ok(self.store.get_state(&id)?),
            None => Ok(None),
        }
    }

    /// Visibility as presented to callers: anything undetermined counts as
    /// visible.
    pub fn state(&self) -> Result<Visibility, TrackError> {
        Ok(match self.raw_state()? {
            Some(Visibility::NotVisible) => Visibility::NotVisible,
            _ => Visibility::Visible,
        })
    }

    pub fn is_tracked(&self) -> Result<bool, TrackError> {
        Ok(self.store.is_tracked(&self.name)?)
    }

    /// Make sure the name is tracked, resolving its external id if needed.
    ///
    /// An application whose window has disappeared is forgotten first and
    /// then tracked again.  If the application never shows a window, nothing
    /// is stored.
    pub fn setup_tracking(&self) -> Result<(), TrackError> {
        if self.kind == WindowKind::Application {
            if let Some(id) = self.id()? {
                if !self.wm.still_alive(&id) {
                    info!("{}: window {} is gone, tracking again", self.name, id);
                    self.destroy()?;
                }
            }
        }
        if self.is_tracked()? {
            debug!("{} is already tracked", self.name);
            return Ok(());
        }

        let id = match self.kind {
            WindowKind::Application => self
                .wm
                .find_or_start_application(&self.name)
                .map_err(|e| TrackError::WindowManager(e.to_string()))?,
            _ => self
                .wm
                .focused_id()
                .ok_or_else(|| TrackError::WindowManager("no focused window to track".into()))?,
        };

        info!("tracking {} as {}", self.name, id);
        self.store.save_current(&self.name, self.kind, &id)?;
        Ok(())
    }

    /// Stop tracking the window.  Its visibility and recency entry go with
    /// it.
    pub fn destroy(&self) -> Result<(), TrackError> {
        info!("forgetting {}", self.name);
        self.store.destroy_id(&self.name)?;
        self.store.remove_from_latest(&self.name)?;
        Ok(())
    }

    pub fn set_state(&self, visibility: Visibility) -> Result<(), TrackError> {
        Ok(self.store.set_state(&self.name, visibility)?)
    }

    pub fn focus(&self) -> Result<(), TrackError> {
        let id = self.require_id()?;
        debug!("focusing {} ({})", self.name, id);
        self.wm
            .focus(&id)
            .map_err(|e| TrackError::WindowManager(e.to_string()))
    }

    pub fn is_focused(&self) -> Result<bool, TrackError> {
        Ok(self.wm.is_focused(&self.require_id()?))
    }

    /// Show the window, mark it most recent and store it as visible.
    pub fn show_and_update(&self) -> Result<(), TrackError> {
        let id = self.require_id()?;
        info!("showing {} ({})", self.name, id);
        self.wm
            .show(&id)
            .map_err(|e| TrackError::WindowManager(e.to_string()))?;
        self.store.record_latest_shown(&self.name)?;
        self.set_state(Visibility::Visible)
    }

    /// Hide the window and store it as not visible.
    ///
    /// The last remaining recency entry is kept so the latest window can be
    /// toggled back.
    pub fn hide_and_update(&self) -> Result<(), TrackError> {
        let id = self.require_id()?;
        info!("hiding {} ({})", self.name, id);
        if self.store.latest_count()? > 1 {
            self.store.remove_from_latest(&self.name)?;
        }
        self.wm
            .hide(&id)
            .map_err(|e| TrackError::WindowManager(e.to_string()))?;
        self.set_state(Visibility::NotVisible)
    }

    /// Toggle the window according to its stored visibility.
    ///
    /// * missing/errored: store `Visible`, fail with
    ///   [`TrackError::CorruptState`].
    /// * visible: hide, or only focus it when `switch_to` is set and it does
    ///   not have focus.
    /// * not visible: remember the focused window, then show.
    pub fn show_or_hide(&self) -> Result<(), TrackError> {
        let id = self.require_id()?;
        let previous = self.store.load_prev_id()?;
        debug!("{}: previously focused {:?}", self.name, previous);

        match self.store.get_state(&id)? {
            None | Some(Visibility::Errored) => {
                warn!("{}: stored state missing or corrupt, resetting to visible", self.name);
                self.set_state(Visibility::Visible)?;
                Err(TrackError::CorruptState(self.name.clone()))
            }
            Some(Visibility::Visible) => {
                if self.switch_to && !self.is_focused()? {
                    return self.focus();
                }
                // Focus is not handed back to `previous` here.
                self.hide_and_update()
            }
            Some(Visibility::NotVisible) => {
                if let Some(focused) = self.wm.focused_id() {
                    self.store.store_prev_id(&focused)?;
                }
                self.show_and_update()
            }
        }
    }

    pub fn toggle_and_update(&self) -> Result<(), TrackError> {
        self.show_or_hide()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SqliteStore;
    use crate::test_support::{Call, RecorderWm};

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn tracked<'a>(
        name: &str,
        kind: WindowKind,
        store: &'a SqliteStore,
        wm: &'a RecorderWm,
    ) -> TrackedWindow<'a, SqliteStore, RecorderWm> {
        TrackedWindow::new(name, kind, false, store, wm)
    }

    #[test]
    fn untracked_window_has_no_id_or_state() {
        let (s, wm) = (store(), RecorderWm::default());
        let t = tracked("term", WindowKind::Focused, &s, &wm);
        assert!(!t.is_tracked().unwrap());
        assert_eq!(t.id().unwrap(), None);
        assert_eq!(t.raw_state().unwrap(), None);
        assert_eq!(t.state().unwrap(), Visibility::Visible);
    }

    #[test]
    fn setup_tracks_focused_window() {
        let s = store();
        let wm = RecorderWm::focused_on("0x01");
        let t = tracked("term", WindowKind::Focused, &s, &wm);
        t.setup_tracking().unwrap();
        assert_eq!(t.id().unwrap().as_deref(), Some("0x01"));
        assert_eq!(t.raw_state().unwrap(), Some(Visibility::NotVisible));
    }

    #[test]
    fn setup_without_focus_fails_and_stores_nothing() {
        let (s, wm) = (store(), RecorderWm::default());
        let t = tracked("term", WindowKind::Focused, &s, &wm);
        assert!(matches!(t.setup_tracking(), Err(TrackError::WindowManager(_))));
        assert!(!t.is_tracked().unwrap());
    }

    #[test]
    fn setup_keeps_existing_focused_tracking() {
        let s = store();
        s.save_current("term", WindowKind::Focused, "0x01").unwrap();
        let wm = RecorderWm::focused_on("0x02");
        let t = tracked("term", WindowKind::Focused, &s, &wm);
        t.setup_tracking().unwrap();
        assert_eq!(t.id().unwrap().as_deref(), Some("0x01"));
    }

    #[test]
    fn setup_starts_application() {
        let s = store();
        let wm = RecorderWm::default().with_application("term", "5");
        let t = tracked("term", WindowKind::Application, &s, &wm);
        t.setup_tracking().unwrap();
        assert_eq!(t.id().unwrap().as_deref(), Some("5"));
        assert_eq!(wm.calls(), vec![Call::FindOrStart("term".into())]);
    }

    #[test]
    fn setup_keeps_live_application() {
        let s = store();
        s.save_current("term", WindowKind::Application, "5").unwrap();
        let wm = RecorderWm::default().with_alive("5").with_application("term", "9");
        let t = tracked("term", WindowKind::Application, &s, &wm);
        t.setup_tracking().unwrap();
        assert_eq!(t.id().unwrap().as_deref(), Some("5"));
        assert!(wm.calls().is_empty());
    }

    #[test]
    fn setup_replaces_dead_application() {
        let s = store();
        s.save_current("term", WindowKind::Application, "5").unwrap();
        s.set_state("term", Visibility::Visible).unwrap();
        s.record_latest_shown("term").unwrap();
        let wm = RecorderWm::default().with_application("term", "9");

        let t = tracked("term", WindowKind::Application, &s, &wm);
        t.setup_tracking().unwrap();
        assert_eq!(t.id().unwrap().as_deref(), Some("9"));
        assert_eq!(s.get_state("5").unwrap(), None);
        assert_eq!(t.raw_state().unwrap(), Some(Visibility::NotVisible));
        assert!(s.is_latest_empty().unwrap());
    }

    #[test]
    fn application_that_never_appears_leaves_no_record() {
        let (s, wm) = (store(), RecorderWm::default());
        let t = tracked("ghost", WindowKind::Application, &s, &wm);
        assert!(matches!(t.setup_tracking(), Err(TrackError::WindowManager(_))));
        assert!(!t.is_tracked().unwrap());
    }

    #[test]
    fn destroy_removes_all_trace() {
        let s = store();
        let wm = RecorderWm::focused_on("0x01");
        let t = tracked("term", WindowKind::Focused, &s, &wm);
        t.setup_tracking().unwrap();
        t.show_or_hide().unwrap();

        t.destroy().unwrap();
        assert!(!t.is_tracked().unwrap());
        assert_eq!(s.get_state("0x01").unwrap(), None);
        assert!(s.is_latest_empty().unwrap());
    }

    #[test]
    fn show_records_recency_and_previous_focus() {
        let s = store();
        s.save_current("term", WindowKind::Application, "5").unwrap();
        let wm = RecorderWm::focused_on("0x99");
        let t = tracked("term", WindowKind::Application, &s, &wm);

        t.show_or_hide().unwrap();
        assert_eq!(t.raw_state().unwrap(), Some(Visibility::Visible));
        assert_eq!(s.latest_shown().unwrap().as_deref(), Some("term"));
        assert_eq!(s.load_prev_id().unwrap().as_deref(), Some("0x99"));
        assert_eq!(wm.calls(), vec![Call::Show("5".into())]);
    }

    #[test]
    fn toggle_round_trip() {
        let s = store();
        s.save_current("term", WindowKind::Application, "5").unwrap();
        s.set_state("term", Visibility::Visible).unwrap();
        let wm = RecorderWm::default();
        let t = tracked("term", WindowKind::Application, &s, &wm);

        t.show_or_hide().unwrap();
        assert_eq!(t.raw_state().unwrap(), Some(Visibility::NotVisible));
        t.show_or_hide().unwrap();
        assert_eq!(t.raw_state().unwrap(), Some(Visibility::Visible));
        assert_eq!(s.latest_shown().unwrap().as_deref(), Some("term"));
        assert_eq!(wm.calls(), vec![Call::Hide("5".into()), Call::Show("5".into())]);
    }

    #[test]
    fn hide_is_idempotent() {
        let s = store();
        s.save_current("term", WindowKind::Focused, "5").unwrap();
        let wm = RecorderWm::default();
        let t = tracked("term", WindowKind::Focused, &s, &wm);

        t.hide_and_update().unwrap();
        t.hide_and_update().unwrap();
        assert_eq!(t.raw_state().unwrap(), Some(Visibility::NotVisible));
    }

    #[test]
    fn hide_keeps_last_recency_entry() {
        let s = store();
        s.save_current("a", WindowKind::Focused, "1").unwrap();
        s.save_current("b", WindowKind::Focused, "2").unwrap();
        s.record_latest_shown("a").unwrap();
        s.record_latest_shown("b").unwrap();
        let wm = RecorderWm::default();

        tracked("b", WindowKind::Focused, &s, &wm).hide_and_update().unwrap();
        assert_eq!(s.latest_count().unwrap(), 1);
        assert_eq!(s.latest_shown().unwrap().as_deref(), Some("a"));

        tracked("a", WindowKind::Focused, &s, &wm).hide_and_update().unwrap();
        assert_eq!(s.latest_shown().unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn missing_state_heals_with_one_error() {
        let s = store();
        s.store_id("term", "5").unwrap();
        let wm = RecorderWm::default();
        let t = tracked("term", WindowKind::Focused, &s, &wm);

        assert!(matches!(t.show_or_hide(), Err(TrackError::CorruptState(_))));
        assert_eq!(t.raw_state().unwrap(), Some(Visibility::Visible));
        assert!(wm.calls().is_empty());

        t.show_or_hide().unwrap();
        assert_eq!(t.raw_state().unwrap(), Some(Visibility::NotVisible));
    }

    #[test]
    fn errored_state_heals_with_one_error() {
        let s = store();
        s.store_id("term", "5").unwrap();
        s.set_state("term", Visibility::Errored).unwrap();
        let wm = RecorderWm::default();
        let t = tracked("term", WindowKind::Focused, &s, &wm);

        assert_eq!(t.state().unwrap(), Visibility::Visible);
        assert!(matches!(t.show_or_hide(), Err(TrackError::CorruptState(_))));
        assert_eq!(t.raw_state().unwrap(), Some(Visibility::Visible));
    }

    #[test]
    fn switch_to_focuses_unfocused_visible_window() {
        let s = store();
        s.save_current("term", WindowKind::Focused, "5").unwrap();
        s.set_state("term", Visibility::Visible).unwrap();
        let wm = RecorderWm::focused_on("7");
        let t = TrackedWindow::new("term", WindowKind::Focused, true, &s, &wm);

        t.show_or_hide().unwrap();
        assert_eq!(wm.calls(), vec![Call::Focus("5".into())]);
        assert_eq!(t.raw_state().unwrap(), Some(Visibility::Visible));
    }

    #[test]
    fn switch_to_hides_focused_window() {
        let s = store();
        s.save_current("term", WindowKind::Focused, "5").unwrap();
        s.set_state("term", Visibility::Visible).unwrap();
        let wm = RecorderWm::focused_on("5");
        let t = TrackedWindow::new("term", WindowKind::Focused, true, &s, &wm);

        t.show_or_hide().unwrap();
        assert_eq!(wm.calls(), vec![Call::Hide("5".into())]);
        assert_eq!(t.raw_state().unwrap(), Some(Visibility::NotVisible));
    }

    #[test]
    fn failed_show_leaves_state_untouched() {
        let s = store();
        s.save_current("term", WindowKind::Focused, "5").unwrap();
        let wm = RecorderWm::default().failing();
        let t = tracked("term", WindowKind::Focused, &s, &wm);

        assert!(matches!(t.show_or_hide(), Err(TrackError::WindowManager(_))));
        assert_eq!(t.raw_state().unwrap(), Some(Visibility::NotVisible));
        assert!(s.is_latest_empty().unwrap());
    }

    #[test]
    fn operations_on_untracked_window_fail() {
        let (s, wm) = (store(), RecorderWm::default());
        let t = tracked("ghost", WindowKind::Focused, &s, &wm);
        assert!(matches!(t.show_or_hide(), Err(TrackError::NotTracked(_))));
        assert!(matches!(t.hide_and_update(), Err(TrackError::NotTracked(_))));
        assert!(wm.calls().is_empty());
    }
}
