//! Services layer
//!
//! Business operations that coordinate the store, the scoring core and the
//! ledger. The request-handling layer talks only to `NetworkService`.
//!
//! ## Services
//!
//! - **Registration**: placement of new accounts, fee collection, propagation
//! - **Transfer**: balance-checked point transfers between accounts
//! - **Account**: notifications, profile updates, summaries

pub mod account;
pub mod registration;
pub mod transfer;

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::NetworkPolicy;
use crate::ledger::{effective_balance, Balance};
use crate::report::{generation_headcount, GenerationReport, GenerationReporter, LevelCount};
use crate::scoring::{AncestorPropagator, BalanceScorer, PropagationReport};
use crate::tree::{Node, NodeId, TreeStore};
use crate::types::{Result, TreeError};

pub use account::{AccountSummary, NotificationFeed, ProfileChanges};
pub use registration::{RegistrationOutcome, RegistrationRequest};
pub use transfer::{TransferReceipt, TransferRequest};

/// Outcome of a full rescoring pass over every node
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    pub rescored: usize,
    pub failed: usize,
}

/// Entry point for every core operation
#[derive(Clone)]
pub struct NetworkService {
    store: Arc<dyn TreeStore>,
    policy: NetworkPolicy,
    propagator: AncestorPropagator,
    reporter: GenerationReporter,
}

impl NetworkService {
    pub fn new(store: Arc<dyn TreeStore>, policy: NetworkPolicy) -> Self {
        let scorer = BalanceScorer::new(policy.pair_reward, policy.generation_horizon);
        let propagator = AncestorPropagator::new(Arc::clone(&store), scorer);
        let reporter =
            GenerationReporter::new(policy.generation_horizon, policy.premium_report_weight);
        Self {
            store,
            policy,
            propagator,
            reporter,
        }
    }

    pub fn store(&self) -> &Arc<dyn TreeStore> {
        &self.store
    }

    pub fn policy(&self) -> &NetworkPolicy {
        &self.policy
    }

    /// Rescore the ancestors of a node just inserted or modified
    pub async fn recompute_ancestors(&self, node_id: &NodeId) -> PropagationReport {
        self.propagator.recompute_ancestors(node_id).await
    }

    /// Per-generation census under `root`
    pub async fn generation_report(&self, root: &NodeId) -> Result<GenerationReport> {
        self.reporter.compute(self.store.as_ref(), root).await
    }

    /// Raw per-generation headcount, defaulting to the policy depth
    pub async fn generation_headcount(
        &self,
        root: &NodeId,
        depth: Option<usize>,
    ) -> Result<Vec<LevelCount>> {
        let depth = depth.unwrap_or(self.policy.headcount_depth);
        generation_headcount(self.store.as_ref(), root, depth).await
    }

    pub async fn effective_balance(&self, node_id: &NodeId) -> Result<Balance> {
        let node = self.require(node_id).await?;
        Ok(effective_balance(&node, &self.policy))
    }

    /// Rescore every node in the store
    ///
    /// Repairs scores left stale by propagation that stopped partway.
    pub async fn reconcile_all(&self) -> Result<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();
        for id in self.store.list_ids().await? {
            match self.propagator.recompute_node(&id).await {
                Ok(Some(_)) => summary.rescored += 1,
                Ok(None) => {}
                Err(e) => {
                    warn!(node_id = %id, error = %e, "Reconcile failed for node");
                    summary.failed += 1;
                }
            }
        }
        info!(
            rescored = summary.rescored,
            failed = summary.failed,
            "Reconciled all scores"
        );
        Ok(summary)
    }

    async fn require(&self, node_id: &NodeId) -> Result<Node> {
        self.store
            .find_by_id(node_id)
            .await?
            .ok_or_else(|| TreeError::NotFound(format!("node {}", node_id)))
    }
}
