//! FYD antagonizer: forced re-asking of earlier questions.
//!
//! While the learner is on a correct streak (or has finished the lesson) the
//! orchestrator may interrupt `NEXT` and offer a package of questions picked
//! from the answer history. Accepting replaces the pre-generated next item
//! with that package.

use crate::context::Context;
use crate::types::{ActivityRef, Phase};
use serde::{Deserialize, Serialize};

pub const DAY_MS: u64 = 86_400_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrongAnswerFilter {
    pub enabled: bool,
    /// Minimum age in days of the wrong answer.
    pub days: u64,
}

impl Default for WrongAnswerFilter {
    fn default() -> Self {
        Self {
            enabled: true,
            days: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RightAnswerFilter {
    pub enabled: bool,
    /// Minimum age in days of the right answer.
    pub days: u64,
    /// Right answers only count when given with one of these confidences.
    pub required_confidence: Vec<String>,
}

impl Default for RightAnswerFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            days: 90,
            required_confidence: vec!["guess".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FydConfig {
    pub activate_after_completion: bool,
    pub min_question_answered: usize,
    pub min_days_since_activation: u64,
    pub correct_answer_streak: usize,
    pub package_size: usize,
    pub wrong_answer_filter: WrongAnswerFilter,
    pub right_answer_filter: RightAnswerFilter,
}

impl Default for FydConfig {
    fn default() -> Self {
        Self {
            activate_after_completion: true,
            min_question_answered: 30,
            min_days_since_activation: 0,
            correct_answer_streak: 3,
            package_size: 5,
            wrong_answer_filter: WrongAnswerFilter::default(),
            right_answer_filter: RightAnswerFilter::default(),
        }
    }
}

fn answered_since_last_ask(context: &Context) -> usize {
    context
        .answers
        .sent_count()
        .saturating_sub(context.fyd_last_asked.unwrap_or(0))
}

fn days_since_last_ask(context: &Context, now: u64) -> Option<u64> {
    context
        .fyd_last_asked_time
        .map(|t| now.saturating_sub(t) / DAY_MS)
}

fn after_interval(config: &FydConfig, context: &Context, now: u64) -> bool {
    context.mode == Some(Phase::Activities)
        && answered_since_last_ask(context) >= config.min_question_answered
        && context.answers.correct_streak(config.correct_answer_streak)
        && days_since_last_ask(context, now)
            .map(|d| d >= config.min_days_since_activation)
            .unwrap_or(true)
}

fn after_completion(config: &FydConfig, context: &Context) -> bool {
    config.activate_after_completion
        && context.mode == Some(Phase::Finished)
        && answered_since_last_ask(context) > 0
}

/// Whether `NEXT` should be intercepted by the antagonizer.
pub fn should_fyd_antagonize(context: &Context, now: u64) -> bool {
    let config = &context.fyd_config;
    if context.args.is_fyd || config.package_size == 0 {
        return false;
    }
    (after_interval(config, context, now) || after_completion(config, context))
        && !pick_fyd_activities(context, now).is_empty()
}

/// Questions to re-ask, most recently answered first.
pub fn pick_fyd_activities(context: &Context, now: u64) -> Vec<ActivityRef> {
    let config = &context.fyd_config;
    let queued_after: Vec<&ActivityRef> = match context.activity_index {
        Some(i) => context.selected.iter().skip(i + 1).collect(),
        None => context.selected.iter().collect(),
    };

    let mut picks: Vec<ActivityRef> = Vec::new();
    for answer in context.answers.latest_per_activity() {
        if picks.len() >= config.package_size {
            break;
        }
        let age_days = answer
            .answered_at_millis
            .map(|t| now.saturating_sub(t) / DAY_MS)
            .unwrap_or(0);
        let wanted = if answer.is_correct() {
            let filter = &config.right_answer_filter;
            filter.enabled
                && age_days >= filter.days
                && answer
                    .confidence
                    .as_ref()
                    .map(|c| filter.required_confidence.contains(c))
                    .unwrap_or(false)
        } else {
            let filter = &config.wrong_answer_filter;
            filter.enabled && age_days >= filter.days
        };
        if !wanted {
            continue;
        }
        let Some(record) = context.resolve_link(&answer.activity.id) else {
            continue;
        };
        if record.key() != answer.activity
            || queued_after.iter().any(|a| a.key() == answer.activity)
            || picks.iter().any(|a| a.key() == answer.activity)
        {
            continue;
        }
        let mut pick = record.with_mode(Phase::Supplemental);
        pick.redo_count = Some(context.answers.max_redo(&answer.activity).unwrap_or(0) + 1);
        picks.push(pick);
    }
    picks
}
