//! [`WindowManager`] implementation for bspwm.
//!
//! Windows are addressed by bspwm node id.  Hiding uses the node's `hidden`
//! flag, so a hidden window keeps its place in the tree and comes back on
//! whatever desktop is focused (it is made sticky while shown).

use super::shell::{output, run, spawn_detached, xdotool_search};
use super::{modifiers, LaunchPolicy, WmError};
use crate::command::Visibility;
use crate::traits::WindowManager;
use log::{debug, warn};

/// Probes for a launched application's window before giving up.
pub const DEFAULT_LAUNCH_ATTEMPTS: u32 = 5;

pub struct Bspwm {
    launch: LaunchPolicy,
    padding_monitor: String,
}

impl Bspwm {
    /// `padding_monitor` is the `bspc config -m` selector used by the
    /// `top_padding` option.
    pub fn new(launch: LaunchPolicy, padding_monitor: &str) -> Self {
        Self {
            launch,
            padding_monitor: padding_monitor.to_string(),
        }
    }

    fn first_window(name: &str) -> Option<String> {
        xdotool_search(name).into_iter().next()
    }
}

/// Parse a node id printed as hex (`0x00A00003`, what `bspc query` prints)
/// or decimal (what `xdotool` prints).
fn parse_node_id(id: &str) -> Option<u64> {
    let id = id.trim();
    match id.strip_prefix("0x").or_else(|| id.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => id.parse().ok(),
    }
}

/// Whether `id` is one of the node ids in `bspc query -N` output.
fn node_list_contains(list: &str, id: &str) -> bool {
    let Some(wanted) = parse_node_id(id) else {
        return false;
    };
    list.lines()
        .filter_map(parse_node_id)
        .any(|node| node == wanted)
}

/// Padding to apply: none while the window is shown, `value` otherwise.
fn top_padding(visibility: Visibility, value: &str) -> &str {
    if visibility == Visibility::Visible {
        "0"
    } else {
        value
    }
}

impl WindowManager for Bspwm {
    type Error = WmError;

    fn show(&self, id: &str) -> Result<(), WmError> {
        run("bspc", &["node", id, "--flag", "hidden=off", "--flag", "sticky=on"])?;
        run("bspc", &["node", "-f", id])
    }

    fn hide(&self, id: &str) -> Result<(), WmError> {
        run("bspc", &["node", id, "--flag", "hidden=on", "--flag", "sticky=off"])
    }

    fn still_alive(&self, id: &str) -> bool {
        match output("bspc", &["query", "-N"]) {
            Ok(nodes) => node_list_contains(&nodes, id),
            Err(e) => {
                debug!("bspc query -N: {}", e);
                false
            }
        }
    }

    fn focus(&self, id: &str) -> Result<(), WmError> {
        run("bspc", &["node", "-f", id])
    }

    /// Tracked ids may come from `xdotool` (decimal) while bspc reports hex.
    fn is_focused(&self, id: &str) -> bool {
        let focused = self.focused_id().and_then(|f| parse_node_id(&f));
        focused.is_some() && focused == parse_node_id(id)
    }

    fn focused_id(&self) -> Option<String> {
        match output("bspc", &["query", "-N", "-n"]) {
            Ok(out) => Some(out.trim().to_string()).filter(|id| !id.is_empty()),
            Err(e) => {
                debug!("no focused node: {}", e);
                None
            }
        }
    }

    fn find_or_start_application(&self, name: &str) -> Result<String, WmError> {
        if let Some(id) = Self::first_window(name) {
            debug!("found running {} as {}", name, id);
            return Ok(id);
        }

        spawn_detached(name)?;
        self.launch
            .poll(|attempt| {
                debug!("waiting for {} (attempt {}/{})", name, attempt, self.launch.attempts);
                Self::first_window(name)
            })
            .ok_or_else(|| WmError(format!("no window for {} appeared after starting it", name)))
    }

    fn apply_option(
        &self,
        key: &str,
        value: &str,
        visibility: Visibility,
        id: &str,
    ) -> Result<(), WmError> {
        match key {
            "top_padding" => run(
                "bspc",
                &[
                    "config",
                    "-m",
                    &self.padding_monitor,
                    "top_padding",
                    top_padding(visibility, value),
                ],
            ),
            "mods" => {
                for modifier in modifiers(value) {
                    match modifier {
                        "sticky" => run("bspc", &["node", id, "--flag", "sticky=on"])?,
                        other => warn!("bspwm: unknown modifier {}", other),
                    }
                }
                Ok(())
            }
            _ => {
                debug!("bspwm ignores option {}", key);
                Ok(())
            }
        }
    }
}
