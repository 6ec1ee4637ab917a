//! Account registration
//!
//! A registration is sponsored by an existing user account, which pays the
//! registration fee out of its transferable points to the admin. The new
//! node is placed under an optional parent at a position from its own mode's
//! enumeration. Every precondition is checked before the node is created.
//!
//! Once the node exists the registration counts as committed: ancestor
//! propagation and fee collection failures are logged and reported on the
//! outcome, never surfaced as an error.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::NetworkService;
use crate::auth::hash_password;
use crate::scoring::PropagationReport;
use crate::tree::{LedgerUpdate, Mode, NewNode, Node, NodeId, Notification, Position, Profile, Role};
use crate::types::{Result, TreeError};

/// Registration input from the request layer
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub profile: Profile,
    pub password: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    /// Required when `parent_id` is set
    #[serde(default)]
    pub position: Option<String>,
}

/// Result of a registration
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    pub node: Node,
    pub propagation: PropagationReport,
    /// Whether the sponsor's fee reached the admin
    pub fee_collected: bool,
}

impl NetworkService {
    /// Create the first account of an empty network. It becomes the admin.
    pub async fn bootstrap_admin(&self, request: RegistrationRequest) -> Result<RegistrationOutcome> {
        if self.store.count().await? > 0 {
            return Err(TreeError::Forbidden(
                "network already has accounts; registrations need a sponsor".into(),
            ));
        }
        if request.parent_id.is_some() {
            return Err(TreeError::BadRequest("the first account cannot have a parent".into()));
        }

        let node = self.create_node(&request, None, None).await?;
        let propagation = self.recompute_ancestors(&node.id).await;

        info!(node_id = %node.id, handle = %node.profile.handle, "Bootstrapped admin account");
        Ok(RegistrationOutcome {
            node,
            propagation,
            fee_collected: false,
        })
    }

    /// Register a new account sponsored by `sponsor_id`
    pub async fn register(
        &self,
        sponsor_id: &NodeId,
        request: RegistrationRequest,
    ) -> Result<RegistrationOutcome> {
        let fee = self.policy.registration_fee;

        let sponsor = self.require(sponsor_id).await?;
        if sponsor.role != Role::User {
            return Err(TreeError::Forbidden(
                "only user accounts can sponsor registrations".into(),
            ));
        }
        if sponsor.points_to_send < fee {
            return Err(TreeError::Forbidden(format!(
                "sponsor needs at least {} transferable points to register an account",
                fee
            )));
        }

        let position = match request.parent_id {
            Some(parent_id) => {
                if self.store.find_by_id(&parent_id).await?.is_none() {
                    return Err(TreeError::NotFound(format!("parent {}", parent_id)));
                }
                let raw = request.position.as_deref().unwrap_or_default();
                Some(Position::parse_for(request.mode, raw)?)
            }
            None => None,
        };

        let node = self
            .create_node(&request, position, Some(sponsor.profile.handle.clone()))
            .await?;

        let propagation = self.recompute_ancestors(&node.id).await;
        if !propagation.is_complete() {
            warn!(node_id = %node.id, "Registration committed with stale ancestor scores");
        }

        let fee_collected = match self.collect_fee(sponsor_id, &node).await {
            Ok(collected) => collected,
            Err(e) => {
                error!(
                    sponsor = %sponsor_id,
                    node_id = %node.id,
                    error = %e,
                    "Registration fee collection failed"
                );
                false
            }
        };

        info!(
            node_id = %node.id,
            handle = %node.profile.handle,
            sponsor = %sponsor.profile.handle,
            mode = %node.mode,
            "Registered account"
        );

        Ok(RegistrationOutcome {
            node,
            propagation,
            fee_collected,
        })
    }

    async fn create_node(
        &self,
        request: &RegistrationRequest,
        position: Option<Position>,
        created_by: Option<String>,
    ) -> Result<Node> {
        let profile = &request.profile;
        if profile.handle.trim().is_empty() || profile.email.trim().is_empty() {
            return Err(TreeError::BadRequest("handle and email are required".into()));
        }

        if let Some(existing) = self
            .store
            .find_duplicate(&profile.email, &profile.handle, &profile.national_id, None)
            .await?
        {
            return Err(TreeError::Duplicate(format!(
                "email, handle or national id already used by {}",
                existing.profile.handle
            )));
        }

        let password_hash = hash_password(&request.password)?;

        self.store
            .create(NewNode {
                parent: request.parent_id,
                position,
                mode: request.mode,
                profile: request.profile.clone(),
                password_hash,
                created_by,
                points: self.policy.initial_points,
                points_to_send: self.policy.initial_points_to_send,
            })
            .await
    }

    /// Move the registration fee from the sponsor to the admin
    async fn collect_fee(&self, sponsor_id: &NodeId, registered: &Node) -> Result<bool> {
        let fee = self.policy.registration_fee;
        if fee == 0 {
            return Ok(true);
        }
        let Some(admin) = self.store.find_admin().await? else {
            warn!("No admin account, registration fee not collected");
            return Ok(false);
        };

        let handle = &registered.profile.handle;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let sponsor = self.require(sponsor_id).await?;
            if sponsor.points_to_send < fee {
                return Err(TreeError::Forbidden(format!(
                    "sponsor balance fell below the registration fee of {}",
                    fee
                )));
            }

            let debit = LedgerUpdate::checked(sponsor.version)
                .with_points_to_send(-fee)
                .with_notification(Notification::debit(
                    format!("Registration fee of {} for {}", fee, handle),
                    0,
                ));
            match self.store.apply_ledger(sponsor_id, debit).await {
                Ok(()) => break,
                Err(e) if e.is_retryable() && attempt < self.policy.transfer_retries => continue,
                Err(e) => return Err(e),
            }
        }

        let credit = LedgerUpdate::unchecked()
            .with_points_to_send(fee)
            .with_notification(Notification::credit(
                format!("Registration fee of {} for {}", fee, handle),
                0,
            ));
        self.store.apply_ledger(&admin.id, credit).await?;
        Ok(true)
    }
}
