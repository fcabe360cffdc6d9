//! Main-content scoring (a readability-lite heuristic).
//!
//! Paragraph-like blocks with enough text vote for their parent (full score)
//! and grandparent (half score). The element with the highest total is taken
//! as the content root.

use std::collections::HashMap;

use ego_tree::NodeId;
use tracing::debug;

use crate::dom::Dom;
use crate::patterns::CANDIDATE_SELECTOR;

/// Blocks with less trimmed text than this do not vote.
const MIN_CANDIDATE_TEXT: usize = 20;

/// Cap on the length bonus (one point per 100 chars).
const MAX_LENGTH_BONUS: usize = 3;

/// Accumulated candidate scores, keyed by node identity.
///
/// Insertion order is kept so that ties resolve to the first node that
/// received a vote, independent of hash ordering.
#[derive(Debug, Default)]
pub struct CandidateScores {
    scores: HashMap<NodeId, f64>,
    order: Vec<NodeId>,
}

impl CandidateScores {
    fn add(&mut self, id: NodeId, amount: f64) {
        if !self.scores.contains_key(&id) {
            self.order.push(id);
        }
        *self.scores.entry(id).or_insert(0.0) += amount;
    }

    /// Score of a node, 0 if it never received a vote.
    pub fn get(&self, id: NodeId) -> f64 {
        self.scores.get(&id).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The node with the highest positive score; first vote wins ties.
    pub fn top(&self) -> Option<(NodeId, f64)> {
        let mut best: Option<(NodeId, f64)> = None;
        for &id in &self.order {
            let score = self.get(id);
            let better = match best {
                Some((_, max)) => score > max,
                None => score > 0.0,
            };
            if better {
                best = Some((id, score));
            }
        }
        best
    }
}

/// Base score of a block with the given trimmed text.
///
/// `1 + pieces-between-commas + min(len / 100, 3)`.
pub fn block_score(text: &str) -> f64 {
    let len = text.chars().count();
    let comma_pieces = text.split(',').count();
    let length_bonus = (len / 100).min(MAX_LENGTH_BONUS);
    (1 + comma_pieces + length_bonus) as f64
}

/// Score every candidate block in one pass over the document.
pub fn score_candidates(dom: &Dom) -> CandidateScores {
    let mut candidates = CandidateScores::default();

    for id in dom.select(&CANDIDATE_SELECTOR) {
        let text = dom.text(id);
        let text = text.trim();
        if text.chars().count() < MIN_CANDIDATE_TEXT {
            continue;
        }

        let score = block_score(text);

        if let Some(parent) = dom.parent(id) {
            candidates.add(parent, score);
            if let Some(grandparent) = dom.parent(parent) {
                candidates.add(grandparent, score / 2.0);
            }
        }
    }

    debug!(candidates = candidates.len(), "scored content candidates");
    candidates
}
