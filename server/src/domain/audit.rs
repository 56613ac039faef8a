// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0

//! Append-only audit trail records for state-changing operations.
//!
//! ## Invariants
//!
//! - A record is constructed only after the primary store has acknowledged
//!   the write, so a record's presence implies the mutation happened.
//! - `timestamp` is taken once at construction. Records for one target are
//!   appended sequentially by the coordinator that owns the mutation, which
//!   keeps per-target timestamps nondecreasing.
//! - Deletes carry no payload; inserts and updates always do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::identity::Identity;
use crate::domain::pet::PetId;

/// Kind of state-changing operation being audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Insert => "insert",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit trail entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// When the record was constructed (UTC)
    pub timestamp: DateTime<Utc>,

    /// Which kind of mutation happened
    pub operation: OperationKind,

    /// Logical collection the mutation targeted
    pub collection: String,

    /// Primary identifier of the affected entity
    pub target: PetId,

    /// Mutation payload as submitted; absent for deletes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,

    /// Verified identity of the caller, if the request carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<Identity>,
}

impl AuditRecord {
    /// Record for an acknowledged insert
    pub fn insert(
        collection: &str,
        target: PetId,
        payload: serde_json::Value,
        actor: Option<Identity>,
    ) -> Self {
        Self::build(OperationKind::Insert, collection, target, Some(payload), actor)
    }

    /// Record for an acknowledged update
    pub fn update(
        collection: &str,
        target: PetId,
        payload: serde_json::Value,
        actor: Option<Identity>,
    ) -> Self {
        Self::build(OperationKind::Update, collection, target, Some(payload), actor)
    }

    /// Record for an acknowledged delete
    pub fn delete(collection: &str, target: PetId, actor: Option<Identity>) -> Self {
        Self::build(OperationKind::Delete, collection, target, None, actor)
    }

    fn build(
        operation: OperationKind,
        collection: &str,
        target: PetId,
        payload: Option<serde_json::Value>,
        actor: Option<Identity>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            collection: collection.to_string(),
            target,
            payload,
            actor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_value(OperationKind::Insert).unwrap(), "insert");
        assert_eq!(serde_json::to_value(OperationKind::Update).unwrap(), "update");
        assert_eq!(serde_json::to_value(OperationKind::Delete).unwrap(), "delete");
    }

    #[test]
    fn test_delete_record_has_no_payload() {
        let record = AuditRecord::delete("pets", PetId::new(), None);
        assert_eq!(record.operation, OperationKind::Delete);
        assert!(record.payload.is_none());

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("payload").is_none());
        assert!(json.get("actor").is_none());
    }

    #[test]
    fn test_insert_record_keeps_payload_and_actor() {
        let actor = Identity::new("alice", 3600);
        let payload = serde_json::json!({"species": "cat", "name": "Momo"});
        let record = AuditRecord::insert("pets", PetId::new(), payload.clone(), Some(actor.clone()));

        assert_eq!(record.payload, Some(payload));
        assert_eq!(record.actor, Some(actor));
        assert_eq!(record.collection, "pets");
    }
}
