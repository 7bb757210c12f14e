// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stored platform connection (encrypted credentials).

use serde::{Deserialize, Serialize};

use crate::models::metrics::Platform;

/// A user's connection to one platform.
///
/// Stored in `platform_connections/{user_id}_{platform}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConnection {
    pub user_id: u64,
    pub platform: Platform,
    /// KMS-encrypted JSON credentials (base64), bound to `user_id`
    pub credentials_encrypted: String,
    pub connected_at: String,
    /// Funnel the last import was attributed to
    #[serde(default)]
    pub last_funnel_id: Option<String>,
}

impl PlatformConnection {
    pub fn document_id(&self) -> String {
        connection_document_id(self.user_id, self.platform)
    }
}

pub fn connection_document_id(user_id: u64, platform: Platform) -> String {
    format!("{}_{}", user_id, platform.as_str())
}
