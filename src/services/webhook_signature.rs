// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signature checks for inbound platform webhooks.
//!
//! Both checks run over the raw request body, before any JSON parsing.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the Shopify signature.
pub const SHOPIFY_HMAC_HEADER: &str = "x-shopify-hmac-sha256";

/// Header carrying the HubSpot v1 signature.
pub const HUBSPOT_SIGNATURE_HEADER: &str = "x-hubspot-signature";

/// Shopify signature: base64(HMAC-SHA256(secret, body)).
pub fn shopify_signature(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(BASE64.encode(mac.finalize().into_bytes()))
}

/// Check a Shopify `X-Shopify-Hmac-Sha256` header value.
pub fn verify_shopify(secret: &str, body: &[u8], provided: Option<&str>) -> bool {
    let (Some(provided), Some(expected)) = (provided, shopify_signature(secret, body)) else {
        return false;
    };
    bool::from(provided.trim().as_bytes().ct_eq(expected.as_bytes()))
}

/// HubSpot v1 signature: hex(SHA-256(client_secret || body)).
pub fn hubspot_signature(client_secret: &str, body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(client_secret.as_bytes());
    hasher.update(body);
    hex::encode(hasher.finalize())
}

/// Check a HubSpot `X-HubSpot-Signature` header value.
pub fn verify_hubspot(client_secret: &str, body: &[u8], provided: Option<&str>) -> bool {
    let Some(provided) = provided else {
        return false;
    };
    let expected = hubspot_signature(client_secret, body);
    bool::from(
        provided
            .trim()
            .to_ascii_lowercase()
            .as_bytes()
            .ct_eq(expected.as_bytes()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shopify_accepts_matching_signature() {
        let body = br#"{"id":1,"email":"a@example.com"}"#;
        let sig = shopify_signature("secret", body).unwrap();

        assert!(verify_shopify("secret", body, Some(&sig)));
    }

    #[test]
    fn shopify_rejects_tampering() {
        let body = br#"{"total_price":"10.00"}"#;
        let sig = shopify_signature("secret", body).unwrap();

        assert!(!verify_shopify("secret", br#"{"total_price":"99.00"}"#, Some(&sig)));
        assert!(!verify_shopify("other", body, Some(&sig)));
        assert!(!verify_shopify("secret", body, None));
        assert!(!verify_shopify("secret", body, Some("")));
    }

    #[test]
    fn hubspot_known_vector() {
        // sha256("secret" + "[]")
        let expected = hex::encode(Sha256::digest(b"secret[]"));
        assert_eq!(hubspot_signature("secret", b"[]"), expected);
        assert!(verify_hubspot("secret", b"[]", Some(&expected.to_uppercase())));
    }

    #[test]
    fn hubspot_rejects_wrong_secret() {
        let sig = hubspot_signature("secret", b"[]");
        assert!(!verify_hubspot("other", b"[]", Some(&sig)));
        assert!(!verify_hubspot("secret", b"[]", None));
    }
}
