// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Pet Repository
//!
//! Production `PetRepository` implementation backed by the `pets` table via
//! `sqlx`. Partial updates are expressed as a single `COALESCE` statement so
//! the matched-row count distinguishes a missing pet from a no-op patch.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::pet::{Pet, PetId, PetUpdate};
use crate::domain::repository::{PetRepository, StoreError};

pub struct PostgresPetRepository {
    pool: PgPool,
}

impl PostgresPetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Helper to deserialize a database row into a Pet
    fn row_to_pet(row: &sqlx::postgres::PgRow) -> Result<Pet, StoreError> {
        let id = PetId(
            row.try_get::<Uuid, _>("id")
                .map_err(|e| StoreError::Database(format!("Missing id: {}", e)))?,
        );
        let species: String = row
            .try_get("species")
            .map_err(|e| StoreError::Database(format!("Missing species: {}", e)))?;
        let name: String = row
            .try_get("name")
            .map_err(|e| StoreError::Database(format!("Missing name: {}", e)))?;
        let age: i32 = row
            .try_get("age")
            .map_err(|e| StoreError::Database(format!("Missing age: {}", e)))?;
        let gender: String = row
            .try_get("gender")
            .map_err(|e| StoreError::Database(format!("Missing gender: {}", e)))?;

        Ok(Pet {
            id,
            species,
            name,
            age,
            gender,
        })
    }
}

#[async_trait]
impl PetRepository for PostgresPetRepository {
    async fn insert(&self, pet: &Pet) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO pets (id, species, name, age, gender)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(pet.id.0)
        .bind(&pet.species)
        .bind(&pet.name)
        .bind(pet.age)
        .bind(&pet.gender)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert pet: {}", e);
            StoreError::Database(e.to_string())
        })?;

        debug!("Inserted pet {}", pet.id);
        Ok(())
    }

    async fn update(&self, id: PetId, update: &PetUpdate) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE pets
            SET species = COALESCE($2, species),
                name = COALESCE($3, name),
                age = COALESCE($4, age),
                gender = COALESCE($5, gender)
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(update.species.as_deref())
        .bind(update.name.as_deref())
        .bind(update.age)
        .bind(update.gender.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to update pet {}: {}", id, e);
            StoreError::Database(e.to_string())
        })?;

        debug!("Updated pet {} ({} matched)", id, result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: PetId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM pets WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete pet {}: {}", id, e);
                StoreError::Database(e.to_string())
            })?;

        debug!("Deleted pet {} ({} matched)", id, result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: PetId) -> Result<Option<Pet>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, species, name, age, gender
            FROM pets
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_pet(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<Pet>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, species, name, age, gender
            FROM pets
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut pets = Vec::new();
        for row in rows.iter() {
            pets.push(Self::row_to_pet(row)?);
        }
        Ok(pets)
    }
}
