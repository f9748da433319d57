//! Answer log: the learner's answers as seen by this session.
//!
//! Grading and storage live elsewhere; the orchestrator only needs enough of
//! each answer to decide whether the current activity is complete and to feed
//! the FYD heuristics.

use crate::types::{ActivityKey, ActivityRef};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const DEFAULT_SUCCESS_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub activity: ActivityKey,
    #[serde(default)]
    pub redo_count: Option<u32>,
    #[serde(default)]
    pub correct: Option<bool>,
    #[serde(default)]
    pub score: Option<f64>,
    /// The answer was submitted, not merely viewed or drafted.
    #[serde(default)]
    pub sent: bool,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub answered_at_millis: Option<u64>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Answer {
    pub fn for_activity(activity: &ActivityRef) -> Self {
        Self {
            activity: activity.key(),
            redo_count: activity.redo_count,
            correct: None,
            score: None,
            sent: false,
            confidence: None,
            answered_at_millis: None,
            payload: serde_json::Value::Null,
        }
    }

    pub fn sent(mut self, correct: bool, at_millis: u64) -> Self {
        self.sent = true;
        self.correct = Some(correct);
        self.answered_at_millis = Some(at_millis);
        self
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct_with(DEFAULT_SUCCESS_THRESHOLD)
    }

    pub fn is_correct_with(&self, threshold: f64) -> bool {
        self.correct
            .unwrap_or_else(|| self.score.map(|s| s >= threshold).unwrap_or(false))
    }

    pub fn matches(&self, activity: &ActivityRef) -> bool {
        self.activity == activity.key() && self.redo_count == activity.redo_count
    }
}

/// Chronological answer log. Later entries supersede earlier ones.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnswerLog {
    entries: Vec<Answer>,
}

impl AnswerLog {
    pub fn new(entries: Vec<Answer>) -> Self {
        Self { entries }
    }

    pub fn record(&mut self, answer: Answer) {
        self.entries.push(answer);
    }

    pub fn entries(&self) -> &[Answer] {
        &self.entries
    }

    pub fn latest_for(&self, activity: &ActivityRef) -> Option<&Answer> {
        self.entries.iter().rev().find(|a| a.matches(activity))
    }

    pub fn is_answered(&self, activity: &ActivityRef) -> bool {
        self.latest_for(activity).map(|a| a.sent).unwrap_or(false)
    }

    /// Number of submitted answers.
    pub fn sent_count(&self) -> usize {
        self.entries.iter().filter(|a| a.sent).count()
    }

    /// The last `n` submitted answers were all correct.
    pub fn correct_streak(&self, n: usize) -> bool {
        if n == 0 {
            return true;
        }
        let recent: Vec<&Answer> = self.entries.iter().rev().filter(|a| a.sent).take(n).collect();
        recent.len() == n && recent.iter().all(|a| a.is_correct())
    }

    /// Latest submitted answer per activity, most recent first.
    pub fn latest_per_activity(&self) -> Vec<&Answer> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .rev()
            .filter(|a| a.sent)
            .filter(|a| seen.insert(a.activity.clone()))
            .collect()
    }

    /// Highest retake index recorded for an activity.
    pub fn max_redo(&self, key: &ActivityKey) -> Option<u32> {
        self.entries
            .iter()
            .filter(|a| a.activity == *key)
            .filter_map(|a| a.redo_count)
            .max()
    }

    /// Fraction of submitted answers that are correct.
    pub fn grade(&self) -> f64 {
        let sent = self.sent_count();
        if sent == 0 {
            return 0.0;
        }
        let correct = self.entries.iter().filter(|a| a.sent && a.is_correct()).count();
        correct as f64 / sent as f64
    }
}
