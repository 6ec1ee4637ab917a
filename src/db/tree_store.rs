//! MongoDB-backed tree store
//!
//! Versioned writes put the expected `version` in the update filter and
//! `$inc` it in the same statement. A filter that matches nothing is then
//! resolved into `NotFound` or `Conflict` with a follow-up lookup.

use async_trait::async_trait;
use bson::{doc, Bson, DateTime, Document};
use tracing::debug;

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{NodeDoc, NodeSummaryDoc, NotificationDoc, NODE_COLLECTION};
use crate::tree::{
    LedgerUpdate, NewNode, Node, NodeId, NodeSummary, ProfileUpdate, Role, TreeStore,
};
use crate::types::{Result, TreeError};

/// Tree store over the `nodes` collection
#[derive(Clone)]
pub struct MongoTreeStore {
    nodes: MongoCollection<NodeDoc>,
}

impl MongoTreeStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let nodes = client.collection::<NodeDoc>(NODE_COLLECTION).await?;
        Ok(Self { nodes })
    }

    fn by_id(id: &NodeId) -> Document {
        doc! { "_id": id.object_id() }
    }

    fn versioned(id: &NodeId, expected: Option<u64>) -> Result<Document> {
        let mut filter = Self::by_id(id);
        if let Some(version) = expected {
            let version = i64::try_from(version)
                .map_err(|_| TreeError::BadRequest(format!("version {} out of range", version)))?;
            filter.insert("version", version);
        }
        Ok(filter)
    }

    async fn find_node(&self, filter: Document) -> Result<Option<Node>> {
        self.nodes.find_one(filter).await?.map(Node::try_from).transpose()
    }

    /// Explain why a filtered update matched nothing
    async fn unmatched(&self, id: &NodeId, expected: Option<u64>) -> TreeError {
        match self.find_node(Self::by_id(id)).await {
            Ok(Some(node)) => TreeError::Conflict(format!(
                "node {} is at version {}, expected {}",
                id,
                node.version,
                expected.unwrap_or_default()
            )),
            Ok(None) => TreeError::NotFound(format!("node {}", id)),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl TreeStore for MongoTreeStore {
    async fn create(&self, new: NewNode) -> Result<Node> {
        let role = if self.nodes.count(doc! {}).await? == 0 {
            Role::Admin
        } else {
            Role::User
        };

        let doc = NodeDoc::new(new, role);
        let id = self.nodes.insert_one(doc.clone()).await?;

        debug!(node_id = %id, role = ?role, "Created node document");
        Node::try_from(NodeDoc {
            _id: Some(id),
            ..doc
        })
    }

    async fn find_by_id(&self, id: &NodeId) -> Result<Option<Node>> {
        self.find_node(Self::by_id(id)).await
    }

    async fn find_by_handle(&self, handle: &str) -> Result<Option<Node>> {
        self.find_node(doc! { "profile.handle": handle }).await
    }

    async fn find_admin(&self) -> Result<Option<Node>> {
        self.find_node(doc! { "role": "admin" }).await
    }

    async fn find_duplicate(
        &self,
        email: &str,
        handle: &str,
        national_id: &str,
        exclude: Option<&NodeId>,
    ) -> Result<Option<Node>> {
        let mut filter = doc! {
            "$or": [
                { "profile.email": email },
                { "profile.handle": handle },
                { "profile.nationalId": national_id },
            ]
        };
        if let Some(id) = exclude {
            filter.insert("_id", doc! { "$ne": id.object_id() });
        }
        self.find_node(filter).await
    }

    async fn find_children(&self, parent: &NodeId) -> Result<Vec<NodeSummary>> {
        self.find_children_of(std::slice::from_ref(parent)).await
    }

    async fn find_children_of(&self, parents: &[NodeId]) -> Result<Vec<NodeSummary>> {
        if parents.is_empty() {
            return Ok(Vec::new());
        }
        let parents: Vec<Bson> = parents.iter().map(|p| Bson::ObjectId(p.object_id())).collect();

        let children: Vec<NodeSummaryDoc> = self
            .nodes
            .find_projected(
                doc! { "parent": { "$in": parents } },
                NodeSummaryDoc::projection(),
                doc! { "_id": 1 },
            )
            .await?;

        Ok(children.into_iter().map(Into::into).collect())
    }

    async fn set_points(&self, id: &NodeId, points: i64) -> Result<bool> {
        let result = self
            .nodes
            .update_one(Self::by_id(id), doc! { "$set": { "points": points } })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn apply_ledger(&self, id: &NodeId, update: LedgerUpdate) -> Result<()> {
        let filter = Self::versioned(id, update.expected_version)?;

        let mut modifications = doc! {
            "$inc": {
                "version": 1_i64,
                "points_to_send": update.points_to_send_delta,
            }
        };
        if let Some(notification) = &update.notification {
            let entry = bson::to_bson(&NotificationDoc::from(notification))
                .map_err(|e| TreeError::Internal(format!("Failed to encode notification: {}", e)))?;
            modifications.insert("$push", doc! { "notifications": entry });
        }

        let result = self.nodes.update_one(filter, modifications).await?;
        if result.matched_count == 0 {
            return Err(self.unmatched(id, update.expected_version).await);
        }
        Ok(())
    }

    async fn update_profile(&self, id: &NodeId, update: ProfileUpdate) -> Result<()> {
        let filter = Self::versioned(id, Some(update.expected_version))?;

        let profile = bson::to_bson(&update.profile)
            .map_err(|e| TreeError::Internal(format!("Failed to encode profile: {}", e)))?;
        let mut set = doc! { "profile": profile };
        if let Some(hash) = update.password_hash {
            set.insert("password_hash", hash);
        }

        let result = self
            .nodes
            .update_one(filter, doc! { "$set": set, "$inc": { "version": 1_i64 } })
            .await?;
        if result.matched_count == 0 {
            return Err(self.unmatched(id, Some(update.expected_version)).await);
        }
        Ok(())
    }

    async fn mark_notifications_read(&self, id: &NodeId) -> Result<usize> {
        let node = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| TreeError::NotFound(format!("node {}", id)))?;

        let changed = node.unread_notifications();
        if changed == 0 {
            return Ok(0);
        }

        let entries = node
            .notifications
            .iter()
            .map(|n| {
                let mut entry = NotificationDoc::from(n);
                entry.is_read = true;
                bson::to_bson(&entry)
            })
            .collect::<std::result::Result<Vec<Bson>, _>>()
            .map_err(|e| TreeError::Internal(format!("Failed to encode notification: {}", e)))?;

        let filter = Self::versioned(id, Some(node.version))?;
        let result = self
            .nodes
            .update_one(
                filter,
                doc! { "$set": { "notifications": entries }, "$inc": { "version": 1_i64 } },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(self.unmatched(id, Some(node.version)).await);
        }
        Ok(changed)
    }

    async fn touch_last_login(&self, id: &NodeId) -> Result<()> {
        let result = self
            .nodes
            .update_one(Self::by_id(id), doc! { "$set": { "last_login": DateTime::now() } })
            .await?;
        if result.matched_count == 0 {
            return Err(TreeError::NotFound(format!("node {}", id)));
        }
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<NodeId>> {
        let docs: Vec<NodeSummaryDoc> = self
            .nodes
            .find_projected(doc! {}, NodeSummaryDoc::projection(), doc! { "_id": 1 })
            .await?;
        Ok(docs.into_iter().map(|d| d._id.into()).collect())
    }

    async fn count(&self) -> Result<u64> {
        self.nodes.count(doc! {}).await
    }
}
