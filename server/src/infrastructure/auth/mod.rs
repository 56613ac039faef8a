// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0

pub mod resolver;
pub mod token;

pub use resolver::{AuthResolver, ResolvedAuth};
pub use token::{AuthTokenVerifier, CredentialError};
