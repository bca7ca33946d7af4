//! Test doubles shared by the unit tests.

use crate::command::Visibility;
use crate::traits::WindowManager;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// A window-manager call with a visible effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Show(String),
    Hide(String),
    Focus(String),
    FindOrStart(String),
    Option {
        key: String,
        value: String,
        visibility: Visibility,
        id: String,
    },
}

/// Record-keeping mock window manager.
///
/// Queries (`focused_id`, `still_alive`) are answered from the configured
/// fields and are not recorded.  `show` and `focus` move the focus to the
/// window, like bspwm and i3 do.
#[derive(Debug, Default)]
pub struct RecorderWm {
    calls: RefCell<Vec<Call>>,
    focused: RefCell<Option<String>>,
    alive: HashSet<String>,
    aliases: HashMap<String, String>,
    applications: HashMap<String, String>,
    fail: bool,
    fail_options: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("recorder error")]
pub struct RecorderErr;

impl RecorderWm {
    pub fn focused_on(id: &str) -> Self {
        Self {
            focused: RefCell::new(Some(id.into())),
            ..Self::default()
        }
    }

    pub fn with_alive(mut self, id: &str) -> Self {
        self.alive.insert(id.into());
        self
    }

    /// Treat `id` as focused whenever `focused` is, like bspwm printing one
    /// node as hex and decimal.
    pub fn with_alias(mut self, id: &str, focused: &str) -> Self {
        self.aliases.insert(id.into(), focused.into());
        self
    }

    /// Make `find_or_start_application(name)` resolve to `id`.
    pub fn with_application(mut self, name: &str, id: &str) -> Self {
        self.applications.insert(name.into(), id.into());
        self
    }

    /// Fail every show, hide and focus.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Fail every option.
    pub fn failing_options(mut self) -> Self {
        self.fail_options = true;
        self
    }

    pub fn set_focused(&self, id: Option<&str>) {
        *self.focused.borrow_mut() = id.map(String::from);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) -> Result<(), RecorderErr> {
        self.calls.borrow_mut().push(call);
        if self.fail {
            Err(RecorderErr)
        } else {
            Ok(())
        }
    }
}

impl WindowManager for RecorderWm {
    type Error = RecorderErr;

    fn show(&self, id: &str) -> Result<(), RecorderErr> {
        self.record(Call::Show(id.into()))?;
        self.set_focused(Some(id));
        Ok(())
    }

    fn hide(&self, id: &str) -> Result<(), RecorderErr> {
        self.record(Call::Hide(id.into()))?;
        if self.focused.borrow().as_deref() == Some(id) {
            self.set_focused(None);
        }
        Ok(())
    }

    fn still_alive(&self, id: &str) -> bool {
        self.alive.contains(id)
    }

    fn focus(&self, id: &str) -> Result<(), RecorderErr> {
        self.record(Call::Focus(id.into()))?;
        self.set_focused(Some(id));
        Ok(())
    }

    fn is_focused(&self, id: &str) -> bool {
        let focused = self.focused.borrow();
        let Some(focused) = focused.as_deref() else {
            return false;
        };
        focused == id || self.aliases.get(id).map(String::as_str) == Some(focused)
    }

    fn focused_id(&self) -> Option<String> {
        self.focused.borrow().clone()
    }

    fn find_or_start_application(&self, name: &str) -> Result<String, RecorderErr> {
        self.calls.borrow_mut().push(Call::FindOrStart(name.into()));
        self.applications.get(name).cloned().ok_or(RecorderErr)
    }

    fn apply_option(
        &self,
        key: &str,
        value: &str,
        visibility: Visibility,
        id: &str,
    ) -> Result<(), RecorderErr> {
        self.calls.borrow_mut().push(Call::Option {
            key: key.into(),
            value: value.into(),
            visibility,
            id: id.into(),
        });
        if self.fail_options {
            Err(RecorderErr)
        } else {
            Ok(())
        }
    }
}
