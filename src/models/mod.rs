// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod auth;
pub mod user;

pub use auth::{
    AuthorizationUrlResponse, RefreshRequest, SignInRequest, SignUpRequest, StatusResponse,
    TokensResponse,
};
pub use user::{NewUser, User, UserResponse};
