//! Concrete [`WindowManager`] backends.
//!
//! Each supported window manager gets its own module; the rest of the crate
//! only sees the [`WindowManager`] trait.  [`Adapter`] picks the backend named
//! in the [`Config`] at startup.
//!
//! Nothing outside this module should reference bspwm or i3 directly.

pub mod bspwm;
pub mod i3;
pub mod shell;

use crate::command::Visibility;
use crate::config::Config;
use crate::traits::WindowManager;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Errors that can occur when talking to a window manager.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct WmError(pub(crate) String);

/// Supported window managers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WmKind {
    #[default]
    Bspwm,
    I3,
}

impl fmt::Display for WmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WmKind::Bspwm => write!(f, "bspwm"),
            WmKind::I3 => write!(f, "i3"),
        }
    }
}

/// How long to wait for a freshly launched application's window.
///
/// The window is probed `attempts` times with `interval` between probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl LaunchPolicy {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Call `probe` until it yields a value or the attempts run out.
    ///
    /// There is no sleep after the final attempt.
    pub fn poll<T>(&self, mut probe: impl FnMut(u32) -> Option<T>) -> Option<T> {
        for attempt in 1..=self.attempts {
            if let Some(found) = probe(attempt) {
                return Some(found);
            }
            if attempt < self.attempts {
                std::thread::sleep(self.interval);
            }
        }
        None
    }
}

/// Split a `mods` option value (`sticky+other`) into its modifiers.
pub(crate) fn modifiers(value: &str) -> impl Iterator<Item = &str> {
    value.split('+').map(str::trim).filter(|m| !m.is_empty())
}

/// The window manager selected by configuration.
pub enum Adapter {
    Bspwm(bspwm::Bspwm),
    I3(i3::I3),
}

impl Adapter {
    /// Build the backend named in `config`.
    pub fn new(config: &Config) -> Self {
        let kind = config.window_manager;
        let launch = config.launch.policy_for(kind);
        match kind {
            WmKind::Bspwm => Adapter::Bspwm(bspwm::Bspwm::new(launch, &config.padding_monitor)),
            WmKind::I3 => Adapter::I3(i3::I3::new(launch)),
        }
    }

    pub fn kind(&self) -> WmKind {
        match self {
            Adapter::Bspwm(_) => WmKind::Bspwm,
            Adapter::I3(_) => WmKind::I3,
        }
    }
}

impl WindowManager for Adapter {
    type Error = WmError;

    fn show(&self, id: &str) -> Result<(), WmError> {
        match self {
            Adapter::Bspwm(wm) => wm.show(id),
            Adapter::I3(wm) => wm.show(id),
        }
    }

    fn hide(&self, id: &str) -> Result<(), WmError> {
        match self {
            Adapter::Bspwm(wm) => wm.hide(id),
            Adapter::I3(wm) => wm.hide(id),
        }
    }

    fn still_alive(&self, id: &str) -> bool {
        match self {
            Adapter::Bspwm(wm) => wm.still_alive(id),
            Adapter::I3(wm) => wm.still_alive(id),
        }
    }

    fn focus(&self, id: &str) -> Result<(), WmError> {
        match self {
            Adapter::Bspwm(wm) => wm.focus(id),
            Adapter::I3(wm) => wm.focus(id),
        }
    }

    fn is_focused(&self, id: &str) -> bool {
        match self {
            Adapter::Bspwm(wm) => wm.is_focused(id),
            Adapter::I3(wm) => wm.is_focused(id),
        }
    }

    fn focused_id(&self) -> Option<String> {
        match self {
            Adapter::Bspwm(wm) => wm.focused_id(),
            Adapter::I3(wm) => wm.focused_id(),
        }
    }

    fn find_or_start_application(&self, name: &str) -> Result<String, WmError> {
        match self {
            Adapter::Bspwm(wm) => wm.find_or_start_application(name),
            Adapter::I3(wm) => wm.find_or_start_application(name),
        }
    }

    fn apply_option(
        &self,
        key: &str,
        value: &str,
        visibility: Visibility,
        id: &str,
    ) -> Result<(), WmError> {
        match self {
            Adapter::Bspwm(wm) => wm.apply_option(key, value, visibility, id),
            Adapter::I3(wm) => wm.apply_option(key, value, visibility, id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant(attempts: u32) -> LaunchPolicy {
        LaunchPolicy::new(attempts, Duration::ZERO)
    }

    #[test]
    fn poll_returns_first_hit() {
        let calls = Cell::new(0);
        let found = instant(5).poll(|attempt| {
            calls.set(calls.get() + 1);
            (attempt == 3).then_some("0x01")
        });
        assert_eq!(found, Some("0x01"));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn poll_gives_up_after_attempts() {
        let calls = Cell::new(0);
        let found: Option<()> = instant(4).poll(|_| {
            calls.set(calls.get() + 1);
            None
        });
        assert_eq!(found, None);
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn poll_with_zero_attempts_never_probes() {
        let found: Option<()> = instant(0).poll(|_| panic!("probed"));
        assert_eq!(found, None);
    }

    #[test]
    fn modifiers_split_on_plus() {
        assert_eq!(modifiers("sticky+ above+").collect::<Vec<_>>(), vec!["sticky", "above"]);
        assert_eq!(modifiers("").count(), 0);
    }

    #[test]
    fn adapter_follows_config() {
        let mut config = Config::default();
        assert_eq!(Adapter::new(&config).kind(), WmKind::Bspwm);
        config.window_manager = WmKind::I3;
        assert_eq!(Adapter::new(&config).kind(), WmKind::I3);
    }

    #[test]
    fn wm_kind_names() {
        assert_eq!(serde_json::from_str::<WmKind>(r#""i3""#).unwrap(), WmKind::I3);
        assert_eq!(serde_json::from_str::<WmKind>(r#""bspwm""#).unwrap(), WmKind::Bspwm);
        assert!(serde_json::from_str::<WmKind>(r#""sway""#).is_err());
        assert_eq!(WmKind::I3.to_string(), "i3");
    }
}
