// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Audit Trail
//!
//! Append-only `AuditTrailRecorder` implementation writing to the
//! `audit_trail` table. The service never reads this table back; rows are
//! consumed out-of-band by compliance tooling.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use tracing::{debug, error};

use crate::domain::audit::AuditRecord;
use crate::domain::repository::{AuditTrailRecorder, AuditWriteError};

pub struct PostgresAuditTrail {
    pool: PgPool,
}

impl PostgresAuditTrail {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditTrailRecorder for PostgresAuditTrail {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditWriteError> {
        let actor = record
            .actor
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO audit_trail (recorded_at, operation, collection, target, payload, actor)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.timestamp)
        .bind(record.operation.as_str())
        .bind(&record.collection)
        .bind(record.target.0)
        .bind(record.payload.clone())
        .bind(actor)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to append audit record: {}", e);
            AuditWriteError::Database(e.to_string())
        })?;

        debug!(
            "Appended {} audit record for {} {}",
            record.operation, record.collection, record.target
        );
        Ok(())
    }
}
