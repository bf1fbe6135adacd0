//! Identity record for the authenticated journal owner.
//!
//! The identity itself is owned by the auth layer; the store only keeps a
//! copy, refreshed by upsert on every login.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}
