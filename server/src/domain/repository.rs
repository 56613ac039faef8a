// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for the pet registry, following the DDD Repository
//! pattern: interfaces defined in the domain layer, implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `PetRepository` | `Pet` | `InMemoryPetRepository`, `PostgresPetRepository` |
//! | `AuditTrailRecorder` | `AuditRecord` | `InMemoryAuditTrail`, `PostgresAuditTrail` |
//!
//! ## Storage Backend Abstraction
//!
//! Concrete implementations are selected at startup based on configuration
//! (`petshop-config.yaml`). In-memory implementations are used for
//! development and testing; PostgreSQL implementations for production.
//!
//! The audit trail may live in a different database than the pet store, so
//! the two contracts carry separate error types and are wired independently
//! by the composition root.

use async_trait::async_trait;

use crate::domain::audit::AuditRecord;
use crate::domain::pet::{Pet, PetId, PetUpdate};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
}

/// Repository interface for Pet aggregates
#[async_trait]
pub trait PetRepository: Send + Sync {
    /// Insert a new pet
    async fn insert(&self, pet: &Pet) -> Result<(), StoreError>;

    /// Apply a partial update; returns the number of matched rows (0 or 1)
    async fn update(&self, id: PetId, update: &PetUpdate) -> Result<u64, StoreError>;

    /// Delete a pet; returns the number of matched rows (0 or 1)
    async fn delete(&self, id: PetId) -> Result<u64, StoreError>;

    /// Find pet by ID
    async fn find_by_id(&self, id: PetId) -> Result<Option<Pet>, StoreError>;

    /// List all pets
    async fn list_all(&self) -> Result<Vec<Pet>, StoreError>;
}

/// Append-only sink for the mutation audit trail.
///
/// Records are only ever appended, never read back, updated, or deleted by
/// the service. Failures from this trait are absorbed by the mutation
/// coordinator and never surface to API clients.
#[async_trait]
pub trait AuditTrailRecorder: Send + Sync {
    /// Append a single audit record
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditWriteError>;
}

/// Pet store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Audit trail write errors.
///
/// Kept separate from [`StoreError`] so the coordinator cannot confuse an
/// absorbed audit failure with a primary-store failure that must abort the
/// request.
#[derive(Debug, thiserror::Error)]
pub enum AuditWriteError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for AuditWriteError {
    fn from(err: sqlx::Error) -> Self {
        AuditWriteError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AuditWriteError {
    fn from(err: serde_json::Error) -> Self {
        AuditWriteError::Serialization(err.to_string())
    }
}
