//! Navigation gates.

use serde::{Deserialize, Serialize};

/// Three independently owned navigation locks.
///
/// Externally sourced `NEXT` / `PREVIOUS` / `EXIT` pass only when every flag
/// is clear. Events a child activity raises on its own behalf bypass them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NavGates {
    /// Owned by the active child activity (`ENABLE_NAV` / `DISABLE_NAV`).
    pub nav_disabled: bool,
    /// Owned by the orchestrator during warnings, sends and teardown.
    pub nav_self_disabled: bool,
    /// Owned by the generation region while it is producing.
    pub nav_gen_disabled: bool,
}

impl NavGates {
    pub fn new(nav_disabled: bool) -> Self {
        Self {
            nav_disabled,
            ..Self::default()
        }
    }

    /// True when any gate is closed.
    pub fn blocked(&self) -> bool {
        self.nav_disabled || self.nav_self_disabled || self.nav_gen_disabled
    }

    pub fn permits(&self, from_child: bool) -> bool {
        from_child || !self.blocked()
    }
}
