//! Next-Item Provider Abstraction
//!
//! The orchestrator asks an external provider for at most one candidate per
//! generation attempt. The provider may live across a process boundary, so the
//! trait is async; the state machine only ever sees the reply as an event.

use crate::error::SequencerError;
use crate::types::{ActivityFilter, ActivityRef};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Order in which a pool is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionOrder {
    Sequential,
    #[default]
    Random,
    Reverse,
}

impl FromStr for QuestionOrder {
    type Err = SequencerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" | "ordered" => Ok(QuestionOrder::Sequential),
            "random" | "shuffle" => Ok(QuestionOrder::Random),
            "reverse" => Ok(QuestionOrder::Reverse),
            other => Err(SequencerError::Config(format!(
                "Unknown question order: {}",
                other
            ))),
        }
    }
}

/// Selection constraints sent with every provider call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextItemRequest {
    /// Correlates the reply with the outstanding request.
    pub request_id: u64,
    pub limit: Option<usize>,
    pub question_order: String,
    pub selected: Vec<ActivityRef>,
    pub available: Vec<ActivityRef>,
    /// Collection activities not yet queued.
    pub remaining: Vec<ActivityRef>,
    pub current: Option<ActivityRef>,
    pub activity_filter: Option<ActivityFilter>,
}

impl NextItemRequest {
    pub fn limit_reached(&self) -> bool {
        self.limit
            .map(|limit| self.selected.len() >= limit)
            .unwrap_or(false)
    }

    fn eligible(&self, activity: &ActivityRef) -> bool {
        !activity.disable
            && !self.selected.iter().any(|s| s.same_entry(activity))
            && self
                .activity_filter
                .as_ref()
                .map(|f| f.matches(activity))
                .unwrap_or(true)
    }

    /// Candidates in pool order: `available` first, then the collection.
    pub fn candidates(&self) -> Vec<&ActivityRef> {
        let primary: Vec<&ActivityRef> = self.available.iter().filter(|a| self.eligible(a)).collect();
        if !primary.is_empty() {
            return primary;
        }
        self.remaining.iter().filter(|a| self.eligible(a)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextItemResponse {
    pub request_id: u64,
    pub item: Option<ActivityRef>,
}

/// Next-item provider trait
#[async_trait]
pub trait NextItemProvider: Send + Sync {
    /// Return at most one candidate for the request, or none.
    async fn next_item(&self, request: &NextItemRequest) -> Result<Option<ActivityRef>, SequencerError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}

/// Picks from the request's own pools.
pub struct PoolProvider {
    rng: Mutex<StdRng>,
}

impl PoolProvider {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    pub fn pick(&self, request: &NextItemRequest) -> Option<ActivityRef> {
        if request.limit_reached() {
            return None;
        }
        let candidates = request.candidates();
        if candidates.is_empty() {
            return None;
        }
        let order = QuestionOrder::from_str(&request.question_order).unwrap_or_default();
        let chosen = match order {
            QuestionOrder::Sequential => candidates[0],
            QuestionOrder::Reverse => candidates[candidates.len() - 1],
            QuestionOrder::Random => {
                let index = self.rng.lock().gen_range(0..candidates.len());
                candidates[index]
            }
        };
        Some(chosen.clone())
    }
}

impl Default for PoolProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl NextItemProvider for PoolProvider {
    async fn next_item(&self, request: &NextItemRequest) -> Result<Option<ActivityRef>, SequencerError> {
        Ok(self.pick(request))
    }

    fn provider_name(&self) -> &str {
        "pool"
    }
}
