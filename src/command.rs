//! Commands and types used throughout tiletoggle.
//!
//! This module defines the vocabulary that all components share:
//! [`Command`] describes one invocation of the tool, [`Mode`] the action it
//! asks for, and [`WindowKind`] / [`Visibility`] / [`Options`] provide the
//! supporting data types.
//!
//! Each process handles exactly one command, so everything here is parsed
//! from the command line and validated before the state store or the window
//! manager is touched.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Name of the store slot holding the previously focused window.
///
/// It shares the namespace of tracked names, so it can never be tracked
/// itself.
pub const RESERVED_NAME: &str = "prev";

/// Option key that makes a toggle focus an unfocused visible window instead
/// of hiding it.
pub const SWITCH_TO_OPTION: &str = "switch_to";

/// Every action a single invocation can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Track the currently focused window under a name and toggle it.
    Focus,
    /// Track (launching if necessary) an application window and toggle it.
    Application,
    /// Forget a tracked window.
    Clean,
    /// Hide the tracked window that currently has input focus.
    Hide,
    /// Toggle the most recently shown window.
    HideLatest,
    /// Hide every tracked window.
    HideAll,
    /// Show every hidden tracked window.
    ShowAll,
    /// Drop all tracking state.
    Reset,
}

impl Mode {
    /// Whether the mode operates on a named window.
    pub fn requires_name(self) -> bool {
        !matches!(self, Mode::HideAll | Mode::ShowAll | Mode::Reset)
    }

    /// The kind of [`TrackedWindow`](crate::tracked::TrackedWindow) built for
    /// a single-window mode, or `None` for aggregate modes.
    pub fn window_kind(self) -> Option<WindowKind> {
        match self {
            Mode::Focus => Some(WindowKind::Focused),
            Mode::Application => Some(WindowKind::Application),
            Mode::Clean => Some(WindowKind::Clean),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Focus => write!(f, "focus"),
            Mode::Application => write!(f, "application"),
            Mode::Clean => write!(f, "clean"),
            Mode::Hide => write!(f, "hide"),
            Mode::HideLatest => write!(f, "hide-latest"),
            Mode::HideAll => write!(f, "hide-all"),
            Mode::ShowAll => write!(f, "show-all"),
            Mode::Reset => write!(f, "reset"),
        }
    }
}

/// Parse a mode token, accepting both the long name and its short alias.
impl FromStr for Mode {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "f" | "focus" => Ok(Mode::Focus),
            "a" | "application" => Ok(Mode::Application),
            "c" | "clean" => Ok(Mode::Clean),
            "h" | "hide" => Ok(Mode::Hide),
            "hl" | "hide-latest" => Ok(Mode::HideLatest),
            "ha" | "hide-all" => Ok(Mode::HideAll),
            "s" | "show-all" => Ok(Mode::ShowAll),
            "r" | "reset" => Ok(Mode::Reset),
            other => Err(CommandError::UnknownMode(other.to_string())),
        }
    }
}

/// How a tracked window obtains its external id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    /// Whatever window has input focus when tracking starts.
    Focused,
    /// The window of a named application, launched if it is not running.
    Application,
    /// Not a visibility operation: the window is being forgotten.
    Clean,
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowKind::Focused => write!(f, "focused"),
            WindowKind::Application => write!(f, "application"),
            WindowKind::Clean => write!(f, "clean"),
        }
    }
}

/// Stored visibility of a tracked window.
///
/// The numeric codes are the persisted representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Undetermined or corrupt.
    Errored,
    Visible,
    NotVisible,
}

impl Visibility {
    /// Persisted code of this visibility.
    pub fn code(self) -> i64 {
        match self {
            Visibility::Errored => 0,
            Visibility::Visible => 1,
            Visibility::NotVisible => 2,
        }
    }

    /// Decode a persisted code. Anything unknown decodes as `Errored`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Visibility::Visible,
            2 => Visibility::NotVisible,
            _ => Visibility::Errored,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Errored => write!(f, "errored"),
            Visibility::Visible => write!(f, "visible"),
            Visibility::NotVisible => write!(f, "not-visible"),
        }
    }
}

/// `key=value` options attached to a command.
///
/// Kept sorted so option side effects run in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(BTreeMap<String, String>);

impl Options {
    /// Parse a comma-separated option list.
    ///
    /// `key=value` entries map the key to the value; a bare `key` maps to
    /// `"true"`.  Empty entries are skipped.
    pub fn parse(s: &str) -> Self {
        let inner = s
            .split(',')
            .map(str::trim)
            .filter(|opt| !opt.is_empty())
            .map(|opt| match opt.split_once('=') {
                Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
                None => (opt.to_string(), "true".to_string()),
            })
            .collect();
        Self(inner)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether a toggle should focus a visible-but-unfocused window.
    pub fn switch_to(&self) -> bool {
        self.get(SWITCH_TO_OPTION) == Some("true")
    }

    /// Options that are forwarded to the window manager, i.e. everything the
    /// dispatcher does not consume itself.
    pub fn adapter_options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(k, _)| k.as_str() != SWITCH_TO_OPTION)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One validated invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub mode: Mode,
    /// Window or application name.  Always `Some` when
    /// [`Mode::requires_name`] holds.
    pub name: Option<String>,
    pub options: Options,
}

impl Command {
    /// Build a command from raw command-line values.
    ///
    /// Fails on an unknown mode, on a missing name for a mode that needs
    /// one, and on the reserved name.
    pub fn parse(mode: &str, name: Option<&str>, options: Option<&str>) -> Result<Self, CommandError> {
        let mode: Mode = mode.parse()?;
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        if mode.requires_name() && name.is_none() {
            return Err(CommandError::MissingName(mode));
        }
        if name == Some(RESERVED_NAME) {
            return Err(CommandError::ReservedName);
        }

        Ok(Self {
            mode,
            name: name.map(str::to_string),
            options: options.map(Options::parse).unwrap_or_default(),
        })
    }
}

/// User errors in a command line.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown mode: {0}")]
    UnknownMode(String),
    #[error("name is required for mode: {0}")]
    MissingName(Mode),
    #[error("\"prev\" is reserved and cannot be used as a window name")]
    ReservedName,
}
