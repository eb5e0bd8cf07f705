// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, request logging, recovery).

pub mod auth;
pub mod logging;
pub mod recovery;

pub use auth::{require_auth, AuthUser};
pub use logging::log_requests;
pub use recovery::{handle_middleware_error, handle_panic};
