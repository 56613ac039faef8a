// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0

//! Pet aggregate and its request shapes.
//!
//! Pets are deliberately plain records. The interesting behavior of this
//! service (auth context resolution, audit trail) hangs off the mutations
//! applied to them, not off the entity itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique pet identifier, generated server-side at insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PetId(pub Uuid);

impl PetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pet entity as stored and served
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    #[serde(rename = "petId")]
    pub id: PetId,
    pub species: String,
    pub name: String,
    pub age: i32,
    pub gender: String,
}

impl Pet {
    /// Build a pet from an insert request, assigning a fresh id
    pub fn from_new(new: NewPet) -> Self {
        Self {
            id: PetId::new(),
            species: new.species,
            name: new.name,
            age: new.age,
            gender: new.gender,
        }
    }
}

/// Insert request body; every field required, unknown fields rejected
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPet {
    pub species: String,
    pub name: String,
    pub age: i32,
    pub gender: String,
}

/// Partial update request body; absent fields keep their stored value.
///
/// Serializes with absent fields omitted, so the audit payload for an
/// update reflects exactly what the caller submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PetUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl PetUpdate {
    /// Apply the present fields onto an existing pet
    pub fn apply(&self, pet: &mut Pet) {
        if let Some(species) = &self.species {
            pet.species = species.clone();
        }
        if let Some(name) = &self.name {
            pet.name = name.clone();
        }
        if let Some(age) = self.age {
            pet.age = age;
        }
        if let Some(gender) = &self.gender {
            pet.gender = gender.clone();
        }
    }
}
