//! Derived views over a context snapshot.
//!
//! These take the context explicitly on every call and are never cached, so a
//! caller always sees the `selected` / `available` / `activity_id` it passes.

use super::answers::Answer;
use super::Context;
use crate::types::ActivityRef;

/// Latest answer recorded for the activity, if any.
pub fn answer_for<'a>(context: &'a Context, activity: &ActivityRef) -> Option<&'a Answer> {
    context.answers.latest_for(activity)
}

/// 1-based number of the activity among the queued questions.
pub fn question_number(context: &Context, activity: &ActivityRef) -> Option<usize> {
    context
        .selected
        .iter()
        .filter(|a| a.is_question())
        .position(|a| a.same_entry(activity))
        .map(|i| i + 1)
}

/// 1-based position of the activity in the queued sequence.
pub fn activity_number(context: &Context, activity: &ActivityRef) -> Option<usize> {
    context
        .selected
        .iter()
        .position(|a| a.same_entry(activity))
        .map(|i| i + 1)
}

/// Queued entries that already have a submitted answer, and the queue length.
pub fn progress(context: &Context) -> (usize, usize) {
    let answered = context
        .selected
        .iter()
        .filter(|a| context.answers.is_answered(a))
        .count();
    (answered, context.selected.len())
}
