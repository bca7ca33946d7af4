//! **tiletoggle**: scratchpad-style window toggling for tiling window
//! managers.
//!
//! Each invocation handles one [`command::Command`] and exits.  Named windows
//! are bound to window-manager ids and their visibility is remembered across
//! invocations, so the same command shows a hidden window and hides a shown
//! one.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::WindowManager`] abstracts show/hide/focus so the toggle logic
//!   is not coupled to any specific window manager.
//! * [`traits::StateStore`] abstracts the persistent name → id → visibility
//!   mapping and the recently-shown ordering.
//!
//! [`tracked::TrackedWindow`] implements the per-window state machine on top
//! of both, and [`dispatcher::Dispatcher`] maps a command mode onto it.
//! Concrete implementations live in [`wm`] (bspwm and i3) and [`state`]
//! (SQLite).

pub mod command;
pub mod config;
pub mod dispatcher;
pub mod state;
pub mod tracked;
pub mod traits;
pub mod wm;

#[cfg(test)]
mod test_support;
