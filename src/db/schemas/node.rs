//! Node document schema
//!
//! One document per account. Structure fields are written once at insert;
//! ledger and profile writes bump `version`.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::tree::{Mode, NewNode, Node, NodeSummary, Notification, Position, Profile, Role, Sign};
use crate::types::TreeError;

/// Collection name for nodes
pub const NODE_COLLECTION: &str = "nodes";

/// Notification entry as stored
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NotificationDoc {
    pub message: String,
    pub timestamp: DateTime,
    #[serde(default)]
    pub is_read: bool,
    pub amount: i64,
    /// `1` for credits, `-1` for debits
    pub sign: i32,
}

impl From<&Notification> for NotificationDoc {
    fn from(n: &Notification) -> Self {
        Self {
            message: n.message.clone(),
            timestamp: DateTime::from_chrono(n.timestamp),
            is_read: n.is_read,
            amount: n.amount,
            sign: n.sign.value() as i32,
        }
    }
}

impl From<NotificationDoc> for Notification {
    fn from(d: NotificationDoc) -> Self {
        Self {
            message: d.message,
            timestamp: d.timestamp.to_chrono(),
            is_read: d.is_read,
            amount: d.amount,
            sign: Sign::from_value(d.sign),
        }
    }
}

/// Node document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NodeDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub parent: Option<ObjectId>,
    pub position: Option<Position>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub role: Role,

    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub points_to_send: i64,
    #[serde(default)]
    pub notifications: Vec<NotificationDoc>,

    pub profile: Profile,

    /// Argon2 password hash
    pub password_hash: String,

    /// Handle of the sponsoring account
    pub created_by: Option<String>,
    pub last_login: Option<DateTime>,

    #[serde(default)]
    pub version: i64,
}

impl NodeDoc {
    pub fn new(node: NewNode, role: Role) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            parent: node.parent.map(|p| p.object_id()),
            position: node.position,
            mode: node.mode,
            role,
            points: node.points,
            points_to_send: node.points_to_send,
            notifications: Vec::new(),
            profile: node.profile,
            password_hash: node.password_hash,
            created_by: node.created_by,
            last_login: None,
            version: 0,
        }
    }
}

impl TryFrom<NodeDoc> for Node {
    type Error = TreeError;

    fn try_from(doc: NodeDoc) -> Result<Self, Self::Error> {
        let id = doc
            ._id
            .ok_or_else(|| TreeError::Database("node document without _id".into()))?;

        Ok(Node {
            id: id.into(),
            parent: doc.parent.map(Into::into),
            position: doc.position,
            mode: doc.mode,
            role: doc.role,
            points: doc.points,
            points_to_send: doc.points_to_send,
            notifications: doc.notifications.into_iter().map(Into::into).collect(),
            profile: doc.profile,
            password_hash: doc.password_hash,
            created_by: doc.created_by,
            last_login: doc.last_login.map(|t| t.to_chrono()),
            version: doc.version.max(0) as u64,
        })
    }
}

impl IntoIndexes for NodeDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        let unique = |name: &str| {
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name(name.to_string())
                    .build(),
            )
        };

        vec![
            (doc! { "profile.email": 1 }, unique("email_unique")),
            (doc! { "profile.handle": 1 }, unique("handle_unique")),
            (doc! { "profile.nationalId": 1 }, unique("national_id_unique")),
            // Children lookups
            (
                doc! { "parent": 1, "_id": 1 },
                Some(IndexOptions::builder().name("parent_index".to_string()).build()),
            ),
            // At most one admin
            (
                doc! { "role": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! { "role": "admin" })
                        .name("single_admin".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for NodeDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

/// Structural projection of a node document
#[derive(Deserialize, Clone, Debug)]
pub struct NodeSummaryDoc {
    pub _id: ObjectId,
    pub parent: Option<ObjectId>,
    pub position: Option<Position>,
    #[serde(default)]
    pub mode: Mode,
}

impl NodeSummaryDoc {
    pub fn projection() -> Document {
        doc! { "_id": 1, "parent": 1, "position": 1, "mode": 1 }
    }
}

impl From<NodeSummaryDoc> for NodeSummary {
    fn from(d: NodeSummaryDoc) -> Self {
        Self {
            id: d._id.into(),
            parent: d.parent.map(Into::into),
            position: d.position,
            mode: d.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeId;

    #[test]
    fn test_document_field_names() {
        let parent = NodeId::new();
        let mut doc = NodeDoc::new(
            NewNode {
                parent: Some(parent),
                position: Some(Position::LeftRight),
                mode: Mode::Premium,
                profile: Profile {
                    national_id: "NID-1".into(),
                    handle: "alice".into(),
                    email: "alice@example.com".into(),
                    ..Default::default()
                },
                password_hash: "hash".into(),
                created_by: Some("sponsor".into()),
                points: 0,
                points_to_send: 0,
            },
            Role::User,
        );
        doc.notifications
            .push(NotificationDoc::from(&Notification::debit("sent", 40)));

        let bson = bson::to_document(&doc).unwrap();
        assert_eq!(bson.get_str("position").unwrap(), "leftRight");
        assert_eq!(bson.get_str("mode").unwrap(), "premium");
        assert_eq!(bson.get_str("role").unwrap(), "user");
        assert_eq!(bson.get_object_id("parent").unwrap(), parent.object_id());
        assert_eq!(
            bson.get_document("profile").unwrap().get_str("nationalId").unwrap(),
            "NID-1"
        );
        let notes = bson.get_array("notifications").unwrap();
        let first = notes[0].as_document().unwrap();
        assert_eq!(first.get_i32("sign").unwrap(), -1);
        assert!(!bson.contains_key("_id"));
    }

    #[test]
    fn test_node_conversion_requires_id() {
        let doc = NodeDoc::default();
        assert!(Node::try_from(doc).is_err());

        let id = ObjectId::new();
        let doc = NodeDoc {
            _id: Some(id),
            version: 4,
            notifications: vec![NotificationDoc::from(&Notification::credit("in", 10))],
            ..Default::default()
        };
        let node = Node::try_from(doc).unwrap();
        assert_eq!(node.id.object_id(), id);
        assert_eq!(node.version, 4);
        assert_eq!(node.notifications[0].signed_amount(), 10);
        assert!(node.is_root());
    }
}
