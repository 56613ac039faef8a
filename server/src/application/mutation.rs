// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0

//! Mutation Coordinator Application Service
//!
//! Sequences every pet mutation as primary write first, audit append second.
//! The audit append only runs once the primary store has acknowledged the
//! write, and its failures are absorbed here so the client response never
//! depends on the audit trail.
//!
//! Application layer pattern:
//! - Coordinates domain (`Pet`, `AuditRecord`) and infrastructure
//!   (repositories) without owning business rules
//! - No transactions span the two stores; a crash between the primary write
//!   and the audit append leaves the mutation unaudited
//!
//! ## Invariants
//!
//! - Audit records are appended strictly after the acknowledged primary write
//! - A failed or not-found primary write appends nothing
//! - An audit failure is logged and swallowed; the response is unchanged

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};

use crate::domain::audit::AuditRecord;
use crate::domain::identity::Identity;
use crate::domain::pet::{NewPet, Pet, PetId, PetUpdate};
use crate::domain::repository::{AuditTrailRecorder, PetRepository, StoreError};

/// Collection name recorded on every pet audit entry
pub const PETS_COLLECTION: &str = "pets";

// ============================================================================
// Errors
// ============================================================================

/// Mutation failures surfaced to the presentation layer
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("{0} Pet not found")]
    NotFound(PetId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// Service
// ============================================================================

/// Application service that runs pet mutations and their audit appends
///
/// Holds the primary pet store and the audit sink behind their domain
/// contracts; the composition root decides whether they share a database.
pub struct MutationCoordinator {
    pets: Arc<dyn PetRepository>,
    audit: Arc<dyn AuditTrailRecorder>,
}

impl MutationCoordinator {
    /// Create new coordinator over a pet store and an audit sink
    pub fn new(pets: Arc<dyn PetRepository>, audit: Arc<dyn AuditTrailRecorder>) -> Self {
        Self { pets, audit }
    }

    /// Insert a new pet, then append an `insert` audit record
    pub async fn insert_pet(
        &self,
        actor: Option<&Identity>,
        new_pet: NewPet,
    ) -> Result<Pet, MutationError> {
        let pet = Pet::from_new(new_pet);
        self.pets.insert(&pet).await?;
        debug!(pet_id = %pet.id, "Pet inserted");

        let record = AuditRecord::insert(
            PETS_COLLECTION,
            pet.id,
            payload_json(&pet),
            actor.cloned(),
        );
        self.append_audit(record).await;

        Ok(pet)
    }

    /// Apply a partial update, then append an `update` audit record
    ///
    /// The audited payload is the patch the caller sent, not the resulting
    /// pet state.
    pub async fn update_pet(
        &self,
        actor: Option<&Identity>,
        id: PetId,
        update: PetUpdate,
    ) -> Result<(), MutationError> {
        let matched = self.pets.update(id, &update).await?;
        if matched == 0 {
            return Err(MutationError::NotFound(id));
        }
        debug!(pet_id = %id, "Pet updated");

        let record = AuditRecord::update(
            PETS_COLLECTION,
            id,
            payload_json(&update),
            actor.cloned(),
        );
        self.append_audit(record).await;

        Ok(())
    }

    /// Delete a pet, then append a payload-less `delete` audit record
    pub async fn delete_pet(
        &self,
        actor: Option<&Identity>,
        id: PetId,
    ) -> Result<(), MutationError> {
        let matched = self.pets.delete(id).await?;
        if matched == 0 {
            return Err(MutationError::NotFound(id));
        }
        debug!(pet_id = %id, "Pet deleted");

        let record = AuditRecord::delete(PETS_COLLECTION, id, actor.cloned());
        self.append_audit(record).await;

        Ok(())
    }

    /// Append an audit record, absorbing any failure
    ///
    /// The primary write is already acknowledged when this runs, so the
    /// error is logged and dropped instead of failing the request.
    async fn append_audit(&self, record: AuditRecord) {
        if let Err(e) = self.audit.append(&record).await {
            error!(
                operation = record.operation.as_str(),
                collection = %record.collection,
                target = %record.target,
                error = %e,
                "Failed to append audit record; primary write already acknowledged"
            );
        }
    }
}

/// Serialize an audit payload, degrading to JSON null on failure
///
/// Runs after the primary write is acknowledged, so a serialization failure
/// must not fail the mutation.
fn payload_json<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        error!(error = %e, "Failed to serialize audit payload; recording null");
        serde_json::Value::Null
    })
}

// ============================================================================
// Tests
// ============================================================================
