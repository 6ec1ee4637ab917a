//! Ledger and transfer integration tests over the in-memory store

use std::sync::Arc;

use sponsor_tree::auth::hash_password;
use sponsor_tree::config::NetworkPolicy;
use sponsor_tree::services::{NetworkService, TransferRequest};
use sponsor_tree::tree::{MemoryTreeStore, Mode, NewNode, Node, Profile, TreeStore};
use sponsor_tree::TreeError;
use tokio_test::{assert_err, assert_ok};

async fn account(store: &MemoryTreeStore, handle: &str, mode: Mode, points: i64) -> Node {
    store
        .create(NewNode {
            parent: None,
            position: None,
            mode,
            profile: Profile {
                handle: handle.into(),
                email: format!("{}@example.com", handle),
                national_id: format!("NID-{}", handle),
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

fn transfer(sender: &str, recipient: &Node, amount: i64) -> TransferRequest {
    TransferRequest {
        sender_handle: sender.into(),
        recipient_id: recipient.id,
        amount,
        points_to_send: 0,
        password: "pw".into(),
    }
}

#[tokio::test]
async fn test_rejected_transfer_leaves_state_unchanged() {
    let store = Arc::new(MemoryTreeStore::new());
    let service = NetworkService::new(store.clone(), NetworkPolicy::default());
    account(&store, "admin", Mode::Normal, 0).await;
    let alice = account(&store, "alice", Mode::Normal, 50).await;
    let bob = account(&store, "bob", Mode::Normal, 0).await;

    let err = assert_err!(service.transfer(transfer("alice", &bob, 51)).await);
    assert!(matches!(
        err,
        TreeError::InsufficientBalance {
            available: 50,
            requested: 51
        }
    ));

    let alice_after = store.find_by_id(&alice.id).await.unwrap().unwrap();
    let bob_after = store.find_by_id(&bob.id).await.unwrap().unwrap();
    assert_eq!(alice_after, alice);
    assert_eq!(bob_after, bob);
}

#[tokio::test]
async fn test_debits_reduce_user_balance() {
    let store = Arc::new(MemoryTreeStore::new());
    let service = NetworkService::new(store.clone(), NetworkPolicy::default());
    account(&store, "admin", Mode::Normal, 0).await;
    let alice = account(&store, "alice", Mode::Normal, 100).await;
    let bob = account(&store, "bob", Mode::Normal, 0).await;

    let receipt = assert_ok!(service.transfer(transfer("alice", &bob, 60)).await);
    assert_eq!(receipt.sender_balance, 40);
    assert_eq!(service.effective_balance(&alice.id).await.unwrap().effective, 40);

    // Credits do not count towards a user's balance
    assert_eq!(service.effective_balance(&bob.id).await.unwrap().effective, 0);

    let err = assert_err!(service.transfer(transfer("alice", &bob, 41)).await);
    assert!(matches!(err, TreeError::InsufficientBalance { .. }));
    assert_ok!(service.transfer(transfer("alice", &bob, 40)).await);
    assert_eq!(service.effective_balance(&alice.id).await.unwrap().effective, 0);
}

#[tokio::test]
async fn test_admin_balance_counts_credits() {
    let store = Arc::new(MemoryTreeStore::new());
    let service = NetworkService::new(store.clone(), NetworkPolicy::default());
    let admin = account(&store, "admin", Mode::Normal, 0).await;
    account(&store, "alice", Mode::Normal, 100).await;

    service.transfer(transfer("alice", &admin, 70)).await.unwrap();

    let balance = service.effective_balance(&admin.id).await.unwrap();
    assert_eq!(balance.ledger, 70);
    assert_eq!(balance.effective, 70);

    let bob = account(&store, "bob", Mode::Normal, 0).await;
    service.transfer(transfer("admin", &bob, 30)).await.unwrap();
    assert_eq!(service.effective_balance(&admin.id).await.unwrap().effective, 40);
}

#[tokio::test]
async fn test_premium_baseline_applies() {
    let store = Arc::new(MemoryTreeStore::new());
    let service = NetworkService::new(store.clone(), NetworkPolicy::default());
    account(&store, "admin", Mode::Normal, 0).await;
    let premium = account(&store, "prem", Mode::Premium, 1_200).await;
    let bob = account(&store, "bob", Mode::Normal, 0).await;

    let balance = service.effective_balance(&premium.id).await.unwrap();
    assert_eq!(balance.base_offset, -1_000);
    assert_eq!(balance.effective, 200);

    let err = service.transfer(transfer("prem", &bob, 201)).await.unwrap_err();
    assert!(err.is_client_error());
}
