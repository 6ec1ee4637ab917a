//! Point transfers
//!
//! A transfer debits the sender's ledger and credits the recipient's, and
//! may also hand the recipient transferable points. It is rejected without
//! any write when the sender's effective balance cannot cover the amount.
//! The sender's debit is version-checked; on a conflict the sender is
//! reloaded and the balance check runs again.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::NetworkService;
use crate::auth::verify_password;
use crate::ledger::effective_balance;
use crate::tree::{LedgerUpdate, NodeId, Notification};
use crate::types::{Result, TreeError};

/// Transfer input from the request layer
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub sender_handle: String,
    pub recipient_id: NodeId,
    /// Points moved from sender to recipient
    pub amount: i64,
    /// Transferable points granted to the recipient
    #[serde(default)]
    pub points_to_send: i64,
    /// Sender's password, confirming the transfer
    pub password: String,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub sender: NodeId,
    pub recipient: NodeId,
    pub amount: i64,
    pub points_to_send: i64,
    /// Sender's effective balance after the debit
    pub sender_balance: i64,
    pub attempts: u32,
}

impl NetworkService {
    /// Transfer points between two accounts
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt> {
        if request.amount <= 0 {
            return Err(TreeError::BadRequest("amount must be positive".into()));
        }
        if request.points_to_send < 0 {
            return Err(TreeError::BadRequest(
                "transferable points must not be negative".into(),
            ));
        }

        let sender = self
            .store
            .find_by_handle(&request.sender_handle)
            .await?
            .ok_or_else(|| TreeError::NotFound(format!("sender {}", request.sender_handle)))?;
        let recipient = self.require(&request.recipient_id).await?;
        if sender.id == recipient.id {
            return Err(TreeError::BadRequest("cannot transfer to yourself".into()));
        }

        if !verify_password(&request.password, &sender.password_hash)? {
            return Err(TreeError::Unauthorized("incorrect password".into()));
        }

        let mut sender = sender;
        let mut attempts = 0;
        let sender_balance = loop {
            attempts += 1;

            let balance = effective_balance(&sender, &self.policy);
            if balance.effective < request.amount {
                return Err(TreeError::InsufficientBalance {
                    available: balance.effective,
                    requested: request.amount,
                });
            }

            let debit = LedgerUpdate::checked(sender.version).with_notification(
                Notification::debit(
                    format!("You sent {} points to {}", request.amount, recipient.profile.handle),
                    request.amount,
                ),
            );
            let applied = self.store.apply_ledger(&sender.id, debit).await;
            match applied {
                Ok(()) => break balance.effective - request.amount,
                Err(e) if e.is_retryable() && attempts < self.policy.transfer_retries => {
                    debug!(sender = %sender.id, attempts, "Sender changed during transfer, retrying");
                    let sender_id = sender.id;
                    sender = self.require(&sender_id).await?;
                }
                Err(e) => return Err(e),
            }
        };

        let credit = LedgerUpdate::unchecked()
            .with_points_to_send(request.points_to_send)
            .with_notification(Notification::credit(
                format!("{} sent you {} points", sender.profile.handle, request.amount),
                request.amount,
            ));
        self.store.apply_ledger(&recipient.id, credit).await?;

        info!(
            sender = %sender.id,
            recipient = %recipient.id,
            amount = request.amount,
            points_to_send = request.points_to_send,
            "Transferred points"
        );

        Ok(TransferReceipt {
            sender: sender.id,
            recipient: recipient.id,
            amount: request.amount,
            points_to_send: request.points_to_send,
            sender_balance,
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::config::NetworkPolicy;
    use crate::tree::{MemoryTreeStore, Mode, NewNode, Node, Profile, TreeStore};
    use std::sync::Arc;

    async fn account(store: &MemoryTreeStore, handle: &str, points: i64) -> Node {
        store
            .create(NewNode {
                parent: None,
                position: None,
                mode: Mode::Normal,
                profile: Profile {
                    handle: handle.into(),
                    email: format!("{}@example.com", handle),
                    national_id: handle.into(),
                    ..Default::default()
                },
                password_hash: hash_password("pw").unwrap(),
                created_by: None,
                points,
                points_to_send: 0,
            })
            .await
            .unwrap()
    }

    fn request(sender: &str, recipient: NodeId, amount: i64) -> TransferRequest {
        TransferRequest {
            sender_handle: sender.into(),
            recipient_id: recipient,
            amount,
            points_to_send: 5,
            password: "pw".into(),
        }
    }

    #[tokio::test]
    async fn test_transfer_appends_both_sides() {
        let store = Arc::new(MemoryTreeStore::new());
        let service = NetworkService::new(store.clone(), NetworkPolicy::default());
        let _admin = account(&store, "admin", 0).await;
        let alice = account(&store, "alice", 180).await;
        let bob = account(&store, "bob", 0).await;

        let receipt = service.transfer(request("alice", bob.id, 100)).await.unwrap();
        assert_eq!(receipt.sender_balance, 80);
        assert_eq!(receipt.attempts, 1);

        let alice = store.find_by_id(&alice.id).await.unwrap().unwrap();
        let bob = store.find_by_id(&bob.id).await.unwrap().unwrap();
        assert_eq!(alice.points, 180);
        assert_eq!(alice.notifications.len(), 1);
        assert_eq!(alice.notifications[0].signed_amount(), -100);
        assert_eq!(bob.notifications[0].signed_amount(), 100);
        assert_eq!(bob.points_to_send, 5);
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let store = Arc::new(MemoryTreeStore::new());
        let service = NetworkService::new(store.clone(), NetworkPolicy::default());
        account(&store, "admin", 0).await;
        account(&store, "alice", 500).await;
        let bob = account(&store, "bob", 0).await;

        let mut req = request("alice", bob.id, 10);
        req.password = "nope".into();
        let err = service.transfer(req).await.unwrap_err();
        assert!(matches!(err, TreeError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected() {
        let store = Arc::new(MemoryTreeStore::new());
        let service = NetworkService::new(store, NetworkPolicy::default());
        let err = service
            .transfer(request("alice", NodeId::new(), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, TreeError::BadRequest(_)));
    }
}
