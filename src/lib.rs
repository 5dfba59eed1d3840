// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authz Gateway - Identity and Token Issuance Service
//!
//! Accepts several proofs of identity and, on success, mints a scoped,
//! time-limited bearer token for downstream services.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Verifiers, scope policy, token issuance
//! - `directory` - LDAP group lookups and their cache
//! - `gateway` - Per-request pipeline over the auth components

pub mod api;
pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod state;
