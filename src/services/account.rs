//! Account queries and profile maintenance

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::NetworkService;
use crate::auth::hash_password;
use crate::ledger::{effective_balance, Balance};
use crate::report::LevelCount;
use crate::tree::{Node, NodeId, Notification, ProfileUpdate};
use crate::types::{Result, TreeError};

/// Notification log of one account
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

/// Partial profile update; `None` keeps the current value
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub handle: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// Overview shown to an account holder
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub node: Node,
    pub balance: Balance,
    pub headcount: Vec<LevelCount>,
    /// Login recorded before this one
    pub previous_login: Option<DateTime<Utc>>,
}

impl NetworkService {
    pub async fn notifications(&self, node_id: &NodeId) -> Result<NotificationFeed> {
        let node = self.require(node_id).await?;
        let unread = node.unread_notifications();
        Ok(NotificationFeed {
            notifications: node.notifications,
            unread,
        })
    }

    pub async fn mark_notifications_read(&self, node_id: &NodeId) -> Result<usize> {
        self.store.mark_notifications_read(node_id).await
    }

    /// Apply profile changes. Tree placement, mode and ledger are untouched.
    pub async fn update_profile(&self, node_id: &NodeId, changes: ProfileChanges) -> Result<Node> {
        let node = self.require(node_id).await?;

        let mut profile = node.profile.clone();
        let keep = |current: &mut String, new: Option<String>| {
            if let Some(value) = new.filter(|v| !v.trim().is_empty()) {
                *current = value;
            }
        };
        keep(&mut profile.first_name, changes.first_name);
        keep(&mut profile.last_name, changes.last_name);
        keep(&mut profile.handle, changes.handle);
        keep(&mut profile.email, changes.email);
        keep(&mut profile.phone, changes.phone);

        if let Some(existing) = self
            .store
            .find_duplicate(
                &profile.email,
                &profile.handle,
                &profile.national_id,
                Some(&node.id),
            )
            .await?
        {
            return Err(TreeError::Duplicate(format!(
                "email or handle already used by {}",
                existing.profile.handle
            )));
        }

        let password_hash = match changes.password.filter(|p| !p.is_empty()) {
            Some(password) => Some(hash_password(&password)?),
            None => None,
        };

        self.store
            .update_profile(
                node_id,
                ProfileUpdate {
                    expected_version: node.version,
                    profile,
                    password_hash,
                },
            )
            .await?;

        info!(node_id = %node_id, "Updated profile");
        self.require(node_id).await
    }

    /// Summary of an account, recording this access as its latest login
    pub async fn account_summary(&self, node_id: &NodeId) -> Result<AccountSummary> {
        let node = self.require(node_id).await?;
        let previous_login = node.last_login;
        self.store.touch_last_login(node_id).await?;

        let headcount = self.generation_headcount(node_id, None).await?;
        let balance = effective_balance(&node, &self.policy);

        Ok(AccountSummary {
            node,
            balance,
            headcount,
            previous_login,
        })
    }
}
