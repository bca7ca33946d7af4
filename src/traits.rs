//! Core traits that decouple tiletoggle from any specific window manager or
//! storage backend.
//!
//! Every concrete backend (bspwm, i3, the SQLite store, a test harness, …)
//! implements one of these traits.  [`TrackedWindow`](crate::tracked::TrackedWindow)
//! and the [`Dispatcher`](crate::dispatcher::Dispatcher) only depend on these
//! abstractions.

use crate::command::{Visibility, WindowKind, RESERVED_NAME};
use crate::state::StoreError;
use std::collections::BTreeMap;

/// Abstraction over a window manager that can show, hide and focus windows
/// addressed by an opaque external id.
///
/// An implementation might shell out to `bspc` or `i3-msg`, or it might be a
/// recording stub used in tests.
pub trait WindowManager {
    /// The error type produced by this window manager.
    type Error: std::error::Error + Send + 'static;

    /// Make the window visible and give it input focus.
    fn show(&self, id: &str) -> Result<(), Self::Error>;

    /// Make the window invisible without destroying it.
    fn hide(&self, id: &str) -> Result<(), Self::Error>;

    /// Whether the window manager still has a node with this id.
    fn still_alive(&self, id: &str) -> bool;

    /// Give the window input focus without changing its visibility.
    fn focus(&self, id: &str) -> Result<(), Self::Error>;

    /// Whether the window currently has input focus.
    fn is_focused(&self, id: &str) -> bool {
        self.focused_id().as_deref() == Some(id)
    }

    /// Id of the window with input focus, or `None` if nothing is focused.
    fn focused_id(&self) -> Option<String>;

    /// Find an existing window for the application `name`, or launch it and
    /// wait a bounded amount of time for its window to appear.
    fn find_or_start_application(&self, name: &str) -> Result<String, Self::Error>;

    /// Apply a window-manager specific command option after a toggle.
    ///
    /// `visibility` is the window's visibility after the toggle.  Options the
    /// backend does not know are ignored.
    fn apply_option(
        &self,
        key: &str,
        value: &str,
        visibility: Visibility,
        id: &str,
    ) -> Result<(), Self::Error>;
}

/// A tracked name together with its external id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TrackedEntry {
    pub name: String,
    pub id: String,
}

/// Persistent state shared by every invocation.
///
/// Three collections make up the store: `tracked` (name → external id, which
/// also holds the reserved previous-focus slot), `state` (external id →
/// [`Visibility`]) and `recency` (names ordered by when they were last
/// shown).
///
/// Each method is a point-in-time read or write.  Nothing here groups several
/// calls into a transaction, so two invocations racing on the same name can
/// interleave.
pub trait StateStore {
    /// External id tracked under `name`.
    fn get_id(&self, name: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite the id tracked under `name`.
    fn store_id(&self, name: &str, id: &str) -> Result<(), StoreError>;

    /// Forget `name` together with the visibility stored for its id.
    fn destroy_id(&self, name: &str) -> Result<(), StoreError>;

    /// Store the visibility of the window tracked under `name`.
    ///
    /// Visibility is keyed by external id, so names sharing an id share it.
    fn set_state(&self, name: &str, visibility: Visibility) -> Result<(), StoreError>;

    /// Stored visibility for an external id.
    ///
    /// `None` means no record exists; a record that does not decode reads
    /// back as [`Visibility::Errored`].
    fn get_state(&self, id: &str) -> Result<Option<Visibility>, StoreError>;

    fn is_tracked(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.get_id(name)?.is_some())
    }

    /// Start tracking `name` as the window `id`.
    ///
    /// A fresh record starts out [`Visibility::NotVisible`].
    fn save_current(&self, name: &str, kind: WindowKind, id: &str) -> Result<(), StoreError>;

    /// Record `name` as the most recently shown window.
    fn record_latest_shown(&self, name: &str) -> Result<(), StoreError>;

    /// The most recently shown window, if any.
    fn latest_shown(&self) -> Result<Option<String>, StoreError>;

    fn latest_count(&self) -> Result<usize, StoreError>;

    fn is_latest_empty(&self) -> Result<bool, StoreError> {
        Ok(self.latest_count()? == 0)
    }

    fn remove_from_latest(&self, name: &str) -> Result<(), StoreError>;

    /// Store the id that had focus before the last show.
    fn store_prev_id(&self, id: &str) -> Result<(), StoreError> {
        self.store_id(RESERVED_NAME, id)
    }

    fn load_prev_id(&self) -> Result<Option<String>, StoreError> {
        self.get_id(RESERVED_NAME)
    }

    /// Raw `tracked` collection, including the reserved previous-focus slot.
    fn all_tracked(&self) -> Result<BTreeMap<String, String>, StoreError>;

    /// Tracked windows, without the reserved previous-focus slot.
    fn tracked_windows(&self) -> Result<Vec<TrackedEntry>, StoreError> {
        Ok(self
            .all_tracked()?
            .into_iter()
            .filter(|(name, _)| name != RESERVED_NAME)
            .map(|(name, id)| TrackedEntry { name, id })
            .collect())
    }

    /// Tracked windows whose stored visibility is [`Visibility::NotVisible`].
    fn all_hidden(&self) -> Result<Vec<TrackedEntry>, StoreError>;

    /// Drop every tracked window, every stored visibility and the recency
    /// record in one step.
    fn reset_all(&self) -> Result<(), StoreError>;
}
