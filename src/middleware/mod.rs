// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (scheduler authentication, response headers).

pub mod scheduler_auth;
pub mod security;

pub use scheduler_auth::require_scheduler_token;
