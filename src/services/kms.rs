// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud KMS service for encrypting connector credentials at rest.
//!
//! Credentials are encrypted directly with KMS, bound to the owning user via
//! additional authenticated data so a ciphertext copied onto another user's
//! connection will not decrypt.

use crate::error::AppError;
use crate::services::connectors::PlatformCredentials;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// KMS encryption service.
#[derive(Clone)]
pub struct KmsService {
    /// Format: projects/{project}/locations/{location}/keyRings/{ring}/cryptoKeys/{key}
    key_path: String,

    client: Option<std::sync::Arc<google_cloud_kms::client::Client>>,
}

impl KmsService {
    const KEY_RING_NAME: &str = "funnel-optimizer";

    /// Key used for platform credentials.
    pub const CREDENTIALS_KEY: &str = "connector-credentials";

    /// Connect to GCP KMS.
    pub async fn new(project_id: &str, location: &str, key_name: &str) -> Result<Self, AppError> {
        let key_path = format!(
            "projects/{}/locations/{}/keyRings/{}/cryptoKeys/{}",
            project_id,
            location,
            Self::KEY_RING_NAME,
            key_name
        );

        let config = google_cloud_kms::client::ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to create KMS auth config: {}", e))
            })?;

        let client = google_cloud_kms::client::Client::new(config)
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to create KMS client: {}", e))
            })?;

        Ok(Self {
            key_path,
            client: Some(std::sync::Arc::new(client)),
        })
    }

    /// Offline KMS for tests; base64 only, no encryption.
    #[cfg(debug_assertions)]
    pub fn new_mock() -> Self {
        Self {
            key_path: "projects/mock/locations/mock/keyRings/mock/cryptoKeys/mock".to_string(),
            client: None,
        }
    }

    /// Encrypt `plaintext` bound to `aad`, returning base64 ciphertext.
    pub async fn encrypt(&self, plaintext: &str, aad: &str) -> Result<String, AppError> {
        use google_cloud_googleapis::cloud::kms::v1::EncryptRequest;

        #[cfg(debug_assertions)]
        {
            if self.client.is_none() {
                return Ok(BASE64.encode(plaintext));
            }
        }

        // Release builds never fall back to plaintext storage
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("KMS client not connected")))?;

        let req = EncryptRequest {
            name: self.key_path.clone(),
            plaintext: plaintext.as_bytes().to_vec(),
            additional_authenticated_data: aad.as_bytes().to_vec(),
            ..Default::default()
        };

        let response = client
            .encrypt(req, None)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("KMS encrypt failed: {}", e)))?;

        Ok(BASE64.encode(response.ciphertext))
    }

    /// Decrypt base64 ciphertext produced by [`KmsService::encrypt`] with the same `aad`.
    pub async fn decrypt(&self, ciphertext_b64: &str, aad: &str) -> Result<String, AppError> {
        use google_cloud_googleapis::cloud::kms::v1::DecryptRequest;

        let ciphertext = BASE64
            .decode(ciphertext_b64)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Base64 decode failed: {}", e)))?;

        #[cfg(debug_assertions)]
        {
            if self.client.is_none() {
                return String::from_utf8(ciphertext).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("UTF-8 decode failed (mock): {}", e))
                });
            }
        }

        let client = self
            .client
            .as_ref()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("KMS client not connected")))?;

        let req = DecryptRequest {
            name: self.key_path.clone(),
            ciphertext,
            additional_authenticated_data: aad.as_bytes().to_vec(),
            ..Default::default()
        };

        let response = client
            .decrypt(req, None)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("KMS decrypt failed: {}", e)))?;

        String::from_utf8(response.plaintext)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("UTF-8 decode failed: {}", e)))
    }
}

fn credentials_aad(user_id: u64) -> String {
    format!("user:{}", user_id)
}

/// Encrypt platform credentials for storage.
pub async fn encrypt_credentials(
    kms: &KmsService,
    user_id: u64,
    credentials: &PlatformCredentials,
) -> Result<String, AppError> {
    let plaintext = serde_json::to_string(credentials)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Serialize credentials: {}", e)))?;
    kms.encrypt(&plaintext, &credentials_aad(user_id)).await
}

/// Decrypt stored platform credentials.
pub async fn decrypt_credentials(
    kms: &KmsService,
    user_id: u64,
    encrypted: &str,
) -> Result<PlatformCredentials, AppError> {
    let plaintext = kms.decrypt(encrypted, &credentials_aad(user_id)).await?;
    serde_json::from_str(&plaintext)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored credentials corrupt: {}", e)))
}
