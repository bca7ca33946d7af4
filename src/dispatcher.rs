//! The orchestrator that maps one [`Command`] onto window operations.
//!
//! [`Dispatcher`] owns the [`StateStore`] and the [`WindowManager`] for the
//! lifetime of the process.  Single-window modes build a [`TrackedWindow`]
//! and toggle it; aggregate modes iterate over a snapshot of the store.  No
//! ordering across names is guaranteed for the aggregate modes.

use crate::command::{Command, CommandError, Mode, Options, Visibility, WindowKind, RESERVED_NAME};
use crate::state::StoreError;
use crate::tracked::{TrackError, TrackedWindow};
use crate::traits::{StateStore, WindowManager};
use log::{debug, info, warn};

/// Possible errors from dispatching a command.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error("state store error: {0}")]
    Store(#[from] StoreError),
    /// A command option failed after the toggle itself went through.
    #[error("option {key} failed: {message}")]
    Option { key: String, message: String },
}

/// Runs commands against a store and a window manager.
///
/// Generic over both so that it is independent of bspwm, i3 and SQLite.
///
/// ```ignore
/// let dispatcher = Dispatcher::new(SqliteStore::open(&path)?, Adapter::new(&config));
/// dispatcher.handle(&Command::parse("a", Some("kitty"), None)?)?;
/// ```
pub struct Dispatcher<S: StateStore, W: WindowManager> {
    store: S,
    wm: W,
}

impl<S: StateStore, W: WindowManager> Dispatcher<S, W> {
    pub fn new(store: S, wm: W) -> Self {
        Self { store, wm }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn wm(&self) -> &W {
        &self.wm
    }

    /// Process a single [`Command`].
    pub fn handle(&self, cmd: &Command) -> Result<(), DispatchError> {
        info!("{} {}", cmd.mode, cmd.name.as_deref().unwrap_or(""));
        if let Some(kind) = cmd.mode.window_kind() {
            let name = required_name(cmd)?;
            if kind == WindowKind::Clean {
                self.window(name, kind, false).destroy()?;
                return Ok(());
            }
            return self.toggle(name, kind, &cmd.options);
        }
        match cmd.mode {
            Mode::Hide => self.hide_tracked_focused(),
            Mode::HideLatest => self.hide_or_show_latest(),
            Mode::HideAll => self.hide_all_tracked(),
            Mode::ShowAll => self.show_all_hidden(),
            Mode::Reset => Ok(self.store.reset_all()?),
            // Single-window modes return above.
            Mode::Focus | Mode::Application | Mode::Clean => Ok(()),
        }
    }

    fn window(&self, name: &str, kind: WindowKind, switch_to: bool) -> TrackedWindow<'_, S, W> {
        TrackedWindow::new(name, kind, switch_to, &self.store, &self.wm)
    }

    /// Track `name` if needed, toggle it, then apply the command options.
    fn toggle(&self, name: &str, kind: WindowKind, options: &Options) -> Result<(), DispatchError> {
        let tracked = self.window(name, kind, options.switch_to());
        tracked.setup_tracking()?;
        tracked.show_or_hide()?;

        let id = tracked
            .id()?
            .ok_or_else(|| TrackError::NotTracked(name.to_string()))?;
        self.handle_options(tracked.state()?, &id, options)
    }

    /// Forward the command options to the window manager.
    ///
    /// Runs after the visibility change, which stays in place even if an
    /// option fails.
    pub fn handle_options(
        &self,
        visibility: Visibility,
        id: &str,
        options: &Options,
    ) -> Result<(), DispatchError> {
        for (key, value) in options.adapter_options() {
            debug!("option {}={} for {} ({})", key, value, id, visibility);
            self.wm
                .apply_option(key, value, visibility, id)
                .map_err(|e| DispatchError::Option {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// Hide the tracked window that has input focus, if there is one.
    pub fn hide_tracked_focused(&self) -> Result<(), DispatchError> {
        // Ids are matched by the window manager, which may print the same
        // window in another notation than the one stored.
        let entry = self
            .store
            .tracked_windows()?
            .into_iter()
            .find(|entry| self.wm.is_focused(&entry.id));
        match entry {
            Some(entry) => {
                self.window(&entry.name, WindowKind::Focused, false)
                    .hide_and_update()?;
            }
            None => debug!("no tracked window has focus"),
        }
        Ok(())
    }

    /// Toggle the most recently shown window.
    pub fn hide_or_show_latest(&self) -> Result<(), DispatchError> {
        let Some(latest) = self.store.latest_shown()? else {
            debug!("no window shown yet");
            return Ok(());
        };
        if !self.store.is_tracked(&latest)? {
            warn!("latest window {} is no longer tracked, dropping it", latest);
            self.store.remove_from_latest(&latest)?;
            return Ok(());
        }
        self.window(&latest, WindowKind::Focused, false)
            .toggle_and_update()?;
        Ok(())
    }

    /// Hide every tracked window.  Stops at the first failure.
    pub fn hide_all_tracked(&self) -> Result<(), DispatchError> {
        for entry in self.store.tracked_windows()? {
            self.window(&entry.name, WindowKind::Focused, false)
                .hide_and_update()?;
        }
        Ok(())
    }

    /// Show every hidden tracked window.  Stops at the first failure.
    pub fn show_all_hidden(&self) -> Result<(), DispatchError> {
        for entry in self.store.all_hidden()? {
            self.window(&entry.name, WindowKind::Focused, false)
                .show_and_update()?;
        }
        Ok(())
    }
}

fn required_name(cmd: &Command) -> Result<&str, CommandError> {
    match cmd.name.as_deref() {
        None => Err(CommandError::MissingName(cmd.mode)),
        Some(RESERVED_NAME) => Err(CommandError::ReservedName),
        Some(name) => Ok(name),
    }
}
