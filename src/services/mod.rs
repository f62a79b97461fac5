// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod password;
pub mod profile;
pub mod revocation;
pub mod search;
pub mod session;
pub mod tokens;

pub use profile::ProfileUpdate;
pub use revocation::{MemoryRevocationRegistry, RedisRevocationRegistry, RevocationRegistry};
pub use search::{SearchCriteria, SearchPage};
pub use session::{NewUser, SessionManager};
pub use tokens::{TokenCodec, TokenPair};
