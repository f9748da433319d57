//! Pre-activity warnings (countdown notice, media notice).

use crate::context::timer::SegmentTimer;
use crate::types::ActivityRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const MEDIA_TAGS: [&str; 3] = ["video", "audio", "image"];

/// Which warnings a lesson shows before an activity is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningMode {
    Never,
    #[default]
    Timer,
    Media,
    Always,
}

impl WarningMode {
    fn covers_timer(self) -> bool {
        matches!(self, WarningMode::Timer | WarningMode::Always)
    }

    fn covers_media(self) -> bool {
        matches!(self, WarningMode::Media | WarningMode::Always)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningKind {
    Timer,
    Media,
}

/// Warnings the learner already acknowledged this session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WarningShown {
    /// The countdown notice is shown once per session.
    pub timer: bool,
    /// Media notices are acknowledged per activity id.
    pub media: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WarningState {
    pub mode: WarningMode,
    pub shown: WarningShown,
}

impl WarningState {
    pub fn new(mode: WarningMode) -> Self {
        Self {
            mode,
            shown: WarningShown::default(),
        }
    }

    /// Mark every currently pending warning as acknowledged.
    pub fn acknowledge(&mut self, activity: Option<&ActivityRef>, timer: &SegmentTimer) {
        for kind in resolve_should_warn(self.mode, activity, timer, &self.shown) {
            match kind {
                WarningKind::Timer => self.shown.timer = true,
                WarningKind::Media => {
                    if let Some(activity) = activity {
                        self.shown.media.insert(activity.key().to_string());
                    }
                }
            }
        }
    }
}

/// Warnings still owed to the learner before `activity` may be displayed.
pub fn resolve_should_warn(
    mode: WarningMode,
    activity: Option<&ActivityRef>,
    timer: &SegmentTimer,
    shown: &WarningShown,
) -> Vec<WarningKind> {
    let Some(activity) = activity else {
        return Vec::new();
    };
    let mut pending = Vec::new();
    if mode.covers_timer() && timer.has_timer() && !shown.timer {
        pending.push(WarningKind::Timer);
    }
    if mode.covers_media()
        && MEDIA_TAGS.iter().any(|t| activity.has_tag(t))
        && !shown.media.contains(&activity.key().to_string())
    {
        pending.push(WarningKind::Media);
    }
    pending
}
