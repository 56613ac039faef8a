// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! This module provides infrastructure implementations of the repository
//! abstractions defined in the domain layer, following the Repository
//! pattern from DDD.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve domain aggregates
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! ## PostgreSQL
//!
//! Production implementations backed by PostgreSQL:
//! - **PostgresPetRepository** - Pet persistence in the `pets` table
//! - **PostgresAuditTrail** - Append-only writes to the `audit_trail` table
//!
//! ## In-Memory
//!
//! Lightweight implementations for testing and development:
//! - **InMemoryPetRepository** - Thread-safe HashMap-backed storage
//! - **InMemoryAuditTrail** - Vec-backed append log with a test accessor
//!
//! Cloning an in-memory repository clones the handle, not the data, so a
//! test can keep one clone for assertions while the service owns another.

pub mod postgres_audit;
pub mod postgres_pet;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::domain::audit::AuditRecord;
use crate::domain::pet::{Pet, PetId, PetUpdate};
use crate::domain::repository::{AuditTrailRecorder, AuditWriteError, PetRepository, StoreError};

pub use postgres_audit::PostgresAuditTrail;
pub use postgres_pet::PostgresPetRepository;

#[derive(Clone)]
pub struct InMemoryPetRepository {
    pets: Arc<RwLock<HashMap<PetId, Pet>>>,
}

impl InMemoryPetRepository {
    pub fn new() -> Self {
        Self {
            pets: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl PetRepository for InMemoryPetRepository {
    async fn insert(&self, pet: &Pet) -> Result<(), StoreError> {
        let mut pets = self.pets.write().unwrap();
        pets.insert(pet.id, pet.clone());
        Ok(())
    }

    async fn update(&self, id: PetId, update: &PetUpdate) -> Result<u64, StoreError> {
        let mut pets = self.pets.write().unwrap();
        match pets.get_mut(&id) {
            Some(pet) => {
                update.apply(pet);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: PetId) -> Result<u64, StoreError> {
        let mut pets = self.pets.write().unwrap();
        Ok(if pets.remove(&id).is_some() { 1 } else { 0 })
    }

    async fn find_by_id(&self, id: PetId) -> Result<Option<Pet>, StoreError> {
        let pets = self.pets.read().unwrap();
        Ok(pets.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Pet>, StoreError> {
        let pets = self.pets.read().unwrap();
        Ok(pets.values().cloned().collect())
    }
}

#[derive(Clone)]
pub struct InMemoryAuditTrail {
    records: Arc<RwLock<Vec<AuditRecord>>>,
}

impl InMemoryAuditTrail {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Snapshot of every appended record, in append order
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.read().unwrap().clone()
    }
}

#[async_trait]
impl AuditTrailRecorder for InMemoryAuditTrail {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditWriteError> {
        let mut records = self.records.write().unwrap();
        records.push(record.clone());
        Ok(())
    }
}
