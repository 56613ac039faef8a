// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0

pub mod mutation;

// Re-export the coordinator for convenience
pub use mutation::{MutationCoordinator, MutationError, PETS_COLLECTION};
