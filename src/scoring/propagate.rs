//! Ancestor propagation
//!
//! After a node is inserted, every ancestor's cached `points` is recomputed
//! from scratch over its bounded subtree, walking parent references up to
//! the root. A missing node ends the walk silently. A store failure ends it
//! with the error recorded on the report; propagation is idempotent, so the
//! next insertion in the same lineage repairs whatever was left stale.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::counter::BranchCounts;
use super::scorer::BalanceScorer;
use crate::tree::{Node, NodeId, TreeSnapshot, TreeStore};
use crate::types::Result;

/// One recomputation at one evaluation root
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pass {
    pub node_id: NodeId,
    pub points: i64,
    pub counts: BranchCounts,
}

/// Outcome of a walk up the ancestor chain
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PropagationReport {
    /// Node whose insertion or change triggered the walk
    pub origin: NodeId,
    /// Passes in walk order, nearest ancestor first
    pub passes: Vec<Pass>,
    /// Error that stopped the walk early, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<String>,
}

impl PropagationReport {
    fn new(origin: NodeId) -> Self {
        Self {
            origin,
            passes: Vec::new(),
            interrupted: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.interrupted.is_none()
    }

    pub fn points_of(&self, id: &NodeId) -> Option<i64> {
        self.passes
            .iter()
            .find(|pass| pass.node_id == *id)
            .map(|pass| pass.points)
    }
}

/// Walks from a node up to its root, rescoring every ancestor
#[derive(Clone)]
pub struct AncestorPropagator {
    store: Arc<dyn TreeStore>,
    scorer: BalanceScorer,
}

impl AncestorPropagator {
    pub fn new(store: Arc<dyn TreeStore>, scorer: BalanceScorer) -> Self {
        Self { store, scorer }
    }

    /// Recompute the ancestors of `node_id`, or the node itself if it is a root
    ///
    /// Never fails: errors stop the walk and are reported on the result.
    pub async fn recompute_ancestors(&self, node_id: &NodeId) -> PropagationReport {
        let mut report = PropagationReport::new(*node_id);

        let start = match self.store.find_by_id(node_id).await {
            Ok(Some(node)) => node.parent.unwrap_or(node.id),
            Ok(None) => {
                debug!(node_id = %node_id, "Propagation origin not found, nothing to do");
                return report;
            }
            Err(e) => {
                warn!(node_id = %node_id, error = %e, "Propagation origin lookup failed");
                report.interrupted = Some(e.to_string());
                return report;
            }
        };

        let mut current = Some(start);
        while let Some(id) = current {
            let node = match self.store.find_by_id(&id).await {
                Ok(Some(node)) => node,
                Ok(None) => {
                    debug!(node_id = %id, "Ancestor missing, stopping propagation");
                    break;
                }
                Err(e) => {
                    warn!(node_id = %id, error = %e, "Ancestor lookup failed, stopping propagation");
                    report.interrupted = Some(e.to_string());
                    break;
                }
            };

            match self.rescore(&node).await {
                Ok(pass) => report.passes.push(pass),
                Err(e) => {
                    warn!(node_id = %id, error = %e, "Rescoring failed, stopping propagation");
                    report.interrupted = Some(e.to_string());
                    break;
                }
            }

            current = node.parent;
        }

        info!(
            origin = %node_id,
            passes = report.passes.len(),
            complete = report.is_complete(),
            "Ancestor propagation finished"
        );
        report
    }

    /// Recompute a single node's points. Returns `None` if it does not exist.
    pub async fn recompute_node(&self, node_id: &NodeId) -> Result<Option<Pass>> {
        match self.store.find_by_id(node_id).await? {
            Some(node) => Ok(Some(self.rescore(&node).await?)),
            None => Ok(None),
        }
    }

    async fn rescore(&self, node: &Node) -> Result<Pass> {
        let snapshot = TreeSnapshot::load_under(
            self.store.as_ref(),
            node.summary(),
            self.scorer.generation_horizon(),
        )
        .await?;
        let evaluation = self.scorer.evaluate(&snapshot, TreeSnapshot::ROOT);
        let points = evaluation.score.total();

        self.store.set_points(&node.id, points).await?;

        debug!(
            node_id = %node.id,
            mode = %node.mode,
            left = evaluation.counts.left,
            right = evaluation.counts.right,
            points,
            "Rescored node"
        );

        Ok(Pass {
            node_id: node.id,
            points,
            counts: evaluation.counts,
        })
    }
}
