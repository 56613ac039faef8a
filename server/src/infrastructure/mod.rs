// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0

pub mod auth;
pub mod config;
pub mod db;
pub mod repositories;

pub use config::ServiceConfig;
