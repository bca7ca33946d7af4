//! [`WindowManager`] implementation for i3.
//!
//! Windows are addressed by i3 container id (`con_id`), and hidden windows
//! live on the scratchpad.  Container ids are resolved from `i3-msg -t
//! get_tree`.

use super::shell::{output, run, spawn_detached, xdotool_search};
use super::{modifiers, LaunchPolicy, WmError};
use crate::command::Visibility;
use crate::traits::WindowManager;
use log::{debug, warn};
use serde::Deserialize;

/// Probes for a launched application's window before giving up.
pub const DEFAULT_LAUNCH_ATTEMPTS: u32 = 10;

/// The subset of an i3 tree node that tiletoggle reads.
#[derive(Debug, Deserialize)]
struct I3Node {
    id: i64,
    #[serde(default)]
    window: Option<i64>,
    #[serde(default)]
    focused: bool,
    #[serde(default)]
    nodes: Vec<I3Node>,
    #[serde(default)]
    floating_nodes: Vec<I3Node>,
}

impl I3Node {
    fn children(&self) -> impl Iterator<Item = &I3Node> {
        self.nodes.iter().chain(self.floating_nodes.iter())
    }

    /// Depth-first search for the first node matching `pred`.
    fn find(&self, pred: &impl Fn(&I3Node) -> bool) -> Option<&I3Node> {
        if pred(self) {
            return Some(self);
        }
        self.children().find_map(|child| child.find(pred))
    }

    fn contains_con(&self, con_id: i64) -> bool {
        self.find(&|node| node.id == con_id).is_some()
    }

    fn focused(&self) -> Option<i64> {
        self.find(&|node| node.focused).map(|node| node.id)
    }

    /// Container holding the X window `window`.
    fn con_for_window(&self, window: i64) -> Option<i64> {
        self.find(&|node| node.window == Some(window))
            .map(|node| node.id)
    }
}

fn parse_tree(json: &str) -> Result<I3Node, WmError> {
    serde_json::from_str(json).map_err(|e| WmError(format!("bad i3 tree: {}", e)))
}

fn con_selector(id: &str) -> String {
    format!("[con_id={}]", id)
}

#[derive(Debug)]
pub struct I3 {
    launch: LaunchPolicy,
}

impl I3 {
    pub fn new(launch: LaunchPolicy) -> Self {
        Self { launch }
    }

    fn tree(&self) -> Result<I3Node, WmError> {
        parse_tree(&output("i3-msg", &["-t", "get_tree"])?)
    }

    /// Container of the first window titled `name` that i3 manages.
    fn find_container(&self, name: &str) -> Option<String> {
        let windows = xdotool_search(name);
        if windows.is_empty() {
            return None;
        }
        let tree = match self.tree() {
            Ok(tree) => tree,
            Err(e) => {
                debug!("{}", e);
                return None;
            }
        };
        windows
            .iter()
            .filter_map(|w| w.parse::<i64>().ok())
            .find_map(|w| tree.con_for_window(w))
            .map(|con| con.to_string())
    }
}

impl WindowManager for I3 {
    type Error = WmError;

    fn show(&self, id: &str) -> Result<(), WmError> {
        run("i3-msg", &[&con_selector(id), "scratchpad", "show"])
    }

    fn hide(&self, id: &str) -> Result<(), WmError> {
        run("i3-msg", &[&con_selector(id), "move", "scratchpad"])
    }

    fn still_alive(&self, id: &str) -> bool {
        let Ok(con_id) = id.trim().parse::<i64>() else {
            return false;
        };
        match self.tree() {
            Ok(tree) => tree.contains_con(con_id),
            Err(e) => {
                debug!("{}", e);
                false
            }
        }
    }

    fn focus(&self, id: &str) -> Result<(), WmError> {
        run("i3-msg", &[&con_selector(id), "focus"])
    }

    fn focused_id(&self) -> Option<String> {
        match self.tree() {
            Ok(tree) => tree.focused().map(|id| id.to_string()),
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }

    fn find_or_start_application(&self, name: &str) -> Result<String, WmError> {
        if let Some(id) = self.find_container(name) {
            debug!("found running {} as container {}", name, id);
            return Ok(id);
        }

        spawn_detached(name)?;
        self.launch
            .poll(|attempt| {
                debug!("waiting for {} (attempt {}/{})", name, attempt, self.launch.attempts);
                self.find_container(name)
            })
            .ok_or_else(|| WmError(format!("no window for {} appeared after starting it", name)))
    }

    fn apply_option(
        &self,
        key: &str,
        value: &str,
        _visibility: Visibility,
        id: &str,
    ) -> Result<(), WmError> {
        match key {
            "mods" => {
                for modifier in modifiers(value) {
                    match modifier {
                        "sticky" => run("i3-msg", &[&con_selector(id), "sticky", "enable"])?,
                        other => warn!("i3: unknown modifier {}", other),
                    }
                }
                Ok(())
            }
            "top_padding" => {
                warn!("i3 does not support top_padding; ignoring");
                Ok(())
            }
            _ => {
                debug!("i3 ignores option {}", key);
                Ok(())
            }
        }
    }
}
